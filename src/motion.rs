//! In-memory motion document.

use glam::{Quat, Vec3};

use crate::HashMap;
use crate::model::Rgb;

/// Records grouped by a name field.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Keyframes grouped by name.
///
/// Groups keep the order in which their names were first inserted, and
/// keyframes keep insertion order within a group. The total count is always
/// computed from the groups themselves.
#[derive(Debug, Clone)]
pub struct KeyframeGroups<T> {
    groups: Vec<KeyframeGroup<T>>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeGroup<T> {
    name: String,
    keyframes: Vec<T>,
}

impl<T> KeyframeGroup<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyframes(&self) -> &[T] {
        &self.keyframes
    }
}

impl<T> Default for KeyframeGroups<T> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::default(),
        }
    }
}

impl<T: PartialEq> PartialEq for KeyframeGroups<T> {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl<T: Keyed> KeyframeGroups<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyframe to the group named by its key, creating the group
    /// if needed.
    pub fn insert(&mut self, keyframe: T) {
        let slot = match self.index.get(keyframe.key()).copied() {
            Some(slot) => slot,
            None => {
                let slot = self.groups.len();
                let name = keyframe.key().to_owned();
                self.index.insert(name.clone(), slot);
                self.groups.push(KeyframeGroup {
                    name,
                    keyframes: Vec::new(),
                });
                slot
            }
        };
        self.groups[slot].keyframes.push(keyframe);
    }
}

impl<T> KeyframeGroups<T> {
    /// Total number of keyframes across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.keyframes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.keyframes.is_empty())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, name: &str) -> Option<&[T]> {
        self.index.get(name).map(|&slot| &self.groups[slot].keyframes[..])
    }

    pub fn groups(&self) -> std::slice::Iter<'_, KeyframeGroup<T>> {
        self.groups.iter()
    }

    /// All keyframes, group by group.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            groups: self.groups.iter(),
            current: Default::default(),
            remaining: self.len(),
        }
    }
}

impl<T: Keyed> Extend<T> for KeyframeGroups<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for keyframe in iter {
            self.insert(keyframe);
        }
    }
}

impl<T: Keyed> FromIterator<T> for KeyframeGroups<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut groups = Self::new();
        groups.extend(iter);
        groups
    }
}

impl<'a, T> IntoIterator for &'a KeyframeGroups<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    groups: std::slice::Iter<'a, KeyframeGroup<T>>,
    current: std::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(keyframe) = self.current.next() {
                self.remaining -= 1;
                return Some(keyframe);
            }
            self.current = self.groups.next()?.keyframes.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VmdHeader {
    pub signature: String,
    pub model_name: String,
}

impl Default for VmdHeader {
    fn default() -> Self {
        Self {
            signature: crate::VMD_SIGNATURE.to_owned(),
            model_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmdMotion {
    pub header: VmdHeader,
    pub bone_keyframes: KeyframeGroups<BoneKeyframe>,
    pub morph_keyframes: KeyframeGroups<MorphKeyframe>,
    pub camera_keyframes: Vec<CameraKeyframe>,
    pub light_keyframes: Vec<LightKeyframe>,
    pub self_shadow_keyframes: Vec<SelfShadowKeyframe>,
}

impl VmdMotion {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            header: VmdHeader {
                model_name: model_name.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneKeyframe {
    pub bone_name: String,
    pub frame_no: u32,
    pub location: Vec3,
    pub rotation: Quat,
    /// Bezier control points, a `[4][4][4]` grid.
    pub interpolation: [u8; 64],
}

impl BoneKeyframe {
    pub fn new(bone_name: impl Into<String>, frame_no: u32) -> Self {
        Self {
            bone_name: bone_name.into(),
            frame_no,
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            interpolation: [0; 64],
        }
    }

    /// Panics if any index is 4 or more.
    pub fn interpolation(&self, i: usize, j: usize, k: usize) -> u8 {
        self.interpolation[grid_index_4x4x4(i, j, k)]
    }

    pub fn set_interpolation(&mut self, i: usize, j: usize, k: usize, value: u8) {
        self.interpolation[grid_index_4x4x4(i, j, k)] = value;
    }
}

fn grid_index_4x4x4(i: usize, j: usize, k: usize) -> usize {
    assert!(i < 4 && j < 4 && k < 4, "interpolation index out of range");
    i * 16 + j * 4 + k
}

impl Keyed for BoneKeyframe {
    fn key(&self) -> &str {
        &self.bone_name
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphKeyframe {
    pub morph_name: String,
    pub frame_no: u32,
    pub weight: f32,
}

impl MorphKeyframe {
    pub fn new(morph_name: impl Into<String>, frame_no: u32, weight: f32) -> Self {
        Self {
            morph_name: morph_name.into(),
            frame_no,
            weight,
        }
    }
}

impl Keyed for MorphKeyframe {
    fn key(&self) -> &str {
        &self.morph_name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraKeyframe {
    pub frame_no: u32,
    /// Distance from the camera to its target.
    pub distance: f32,
    pub location: Vec3,
    /// Euler angles; the X axis is stored negated.
    pub rotation: Vec3,
    /// A `[6][4]` grid.
    pub interpolation: [u8; 24],
    pub view_angle: u32,
    /// 0 = perspective on, 1 = off.
    pub perspective: u8,
}

impl CameraKeyframe {
    /// Panics if `i >= 6` or `j >= 4`.
    pub fn interpolation(&self, i: usize, j: usize) -> u8 {
        self.interpolation[grid_index_6x4(i, j)]
    }

    pub fn set_interpolation(&mut self, i: usize, j: usize, value: u8) {
        self.interpolation[grid_index_6x4(i, j)] = value;
    }
}

fn grid_index_6x4(i: usize, j: usize) -> usize {
    assert!(i < 6 && j < 4, "interpolation index out of range");
    i * 4 + j
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightKeyframe {
    pub frame_no: u32,
    pub color: Rgb,
    pub location: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelfShadowKeyframe {
    pub frame_no: u32,
    /// 0 = off, 1 = mode 1, 2 = mode 2.
    pub mode: u8,
    pub distance: f32,
}
