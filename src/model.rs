//! In-memory model document.
//!
//! Cross-references between sections (bone parents, IK chains, rigid body
//! bindings, joint bodies) are plain indices into the owning list, exactly
//! as stored in the file. [`NO_BONE`](crate::NO_BONE) marks an absent bone.

use glam::{Vec2, Vec3};

use crate::NO_BONE;

/// Number of toon texture slots; this section has no count field.
pub const TOON_TEXTURE_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Coordinate space of [`Rigidbody::position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RigidbodySpace {
    /// Offsets from the bound bone, as stored in the file.
    #[default]
    BoneRelative,
    /// Model-space coordinates, after calibration.
    Absolute,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PmdModel {
    pub header: PmdHeader,
    pub vertices: Vec<Vertex>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[u16; 3]>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub iks: Vec<IkChain>,
    pub morphs: Vec<Morph>,
    /// Morph indices in the order they are listed in the editor.
    pub morph_display: Vec<u16>,
    pub bone_windows: Vec<String>,
    pub bone_display: Vec<BoneDisplay>,
    pub localization: Option<Localization>,
    pub toon_textures: Vec<String>,
    pub rigidbodies: Vec<Rigidbody>,
    pub joints: Vec<Joint>,
    rigidbody_space: RigidbodySpace,
}

impl PmdModel {
    pub fn rigidbody_space(&self) -> RigidbodySpace {
        self.rigidbody_space
    }

    pub(crate) fn mark_rigidbodies_absolute(&mut self) {
        self.rigidbody_space = RigidbodySpace::Absolute;
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// The base morph holds the rest positions of every vertex that any
    /// other morph moves. It is always first when present.
    pub fn base_morph(&self) -> Option<&Morph> {
        self.morphs.first().filter(|m| m.kind == MorphKind::Base)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PmdHeader {
    pub version: f32,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub bones: [u16; 2],
    /// Influence of `bones[0]`, in percent.
    pub bone_weight: u8,
    pub edge_flag: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub diffuse: Rgb,
    pub alpha: f32,
    pub specularity: f32,
    pub specular: Rgb,
    pub ambient: Rgb,
    /// Index into the toon texture list, `0xFF` for the default toon.
    pub toon_index: u8,
    pub edge_flag: u8,
    /// Number of face indices (not triangles) using this material.
    pub face_vertex_count: u32,
    pub texture: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: u16,
    pub tail: u16,
    pub kind: u8,
    pub ik_parent: u16,
    pub position: Vec3,
}

impl Bone {
    pub fn parent(&self) -> Option<usize> {
        (self.parent != NO_BONE).then_some(self.parent as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IkChain {
    pub bone: u16,
    pub target: u16,
    pub iterations: u16,
    /// Rotation limit per iteration.
    pub limit: f32,
    pub chain: Vec<u16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MorphKind {
    #[default]
    Base,
    Eyebrow,
    Eye,
    Lip,
    Other,
    Unknown(u8),
}

impl MorphKind {
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Base,
            1 => Self::Eyebrow,
            2 => Self::Eye,
            3 => Self::Lip,
            4 => Self::Other,
            n => Self::Unknown(n),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Morph {
    pub name: String,
    pub kind: MorphKind,
    pub vertices: Vec<MorphVertex>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MorphVertex {
    /// Model vertex index for the base morph, base morph entry index for
    /// every other morph.
    pub index: u32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoneDisplay {
    pub bone: u16,
    /// Index into [`PmdModel::bone_windows`], counted from 1.
    pub window: u8,
}

/// Alternate-language (English) names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Localization {
    pub name: String,
    pub comment: String,
    pub bone_names: Vec<String>,
    /// One name per morph, excluding the base morph.
    pub morph_names: Vec<String>,
    pub bone_window_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rigidbody {
    pub name: String,
    pub bone_index: u16,
    pub group: u8,
    pub collision_mask: u16,
    /// 0 = sphere, 1 = box, 2 = capsule.
    pub shape: u8,
    pub size: Vec3,
    pub position: Vec3,
    pub rotation: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    /// 0 = follows bone, 1 = physics, 2 = physics aligned to bone.
    pub mode: u8,
}

impl Rigidbody {
    pub fn bone(&self) -> Option<usize> {
        (self.bone_index != NO_BONE).then_some(self.bone_index as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Joint {
    pub name: String,
    pub rigidbodies: [u32; 2],
    pub position: Vec3,
    pub rotation: Vec3,
    pub linear_lower: Vec3,
    pub linear_upper: Vec3,
    pub angular_lower: Vec3,
    pub angular_upper: Vec3,
    pub spring_linear: Vec3,
    pub spring_angular: Vec3,
}
