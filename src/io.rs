use std::fmt;
use std::io::{ErrorKind, Read, Seek};

use glam::{Quat, Vec2, Vec3};

use crate::codec::decode_legacy_text;
use crate::model::Rgb;
use crate::read::ReadError;

pub trait ReadSeek: Read + Seek {
}

impl<T: Read + Seek> ReadSeek for T {}

/// Upper bound on elements preallocated from a count read from the file.
const MAX_PREALLOC: usize = 4096;

pub(crate) fn capacity_hint(count: usize) -> usize {
    count.min(MAX_PREALLOC)
}

/// Sections of both file formats, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ModelHeader,
    Vertices,
    Faces,
    Materials,
    Bones,
    IkChains,
    Morphs,
    MorphDisplay,
    BoneWindows,
    BoneDisplay,
    Localization,
    ToonTextures,
    Rigidbodies,
    Joints,
    MotionHeader,
    BoneKeyframes,
    MorphKeyframes,
    CameraKeyframes,
    LightKeyframes,
    SelfShadowKeyframes,
}

impl Section {
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModelHeader => "model header",
            Self::Vertices => "vertices",
            Self::Faces => "faces",
            Self::Materials => "materials",
            Self::Bones => "bones",
            Self::IkChains => "IK chains",
            Self::Morphs => "morphs",
            Self::MorphDisplay => "morph display list",
            Self::BoneWindows => "bone windows",
            Self::BoneDisplay => "bone display list",
            Self::Localization => "localization",
            Self::ToonTextures => "toon textures",
            Self::Rigidbodies => "rigid bodies",
            Self::Joints => "joints",
            Self::MotionHeader => "motion header",
            Self::BoneKeyframes => "bone keyframes",
            Self::MorphKeyframes => "morph keyframes",
            Self::CameraKeyframes => "camera keyframes",
            Self::LightKeyframes => "light keyframes",
            Self::SelfShadowKeyframes => "self shadow keyframes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Forward-only cursor over a byte stream.
///
/// Tracks the absolute byte offset and the section being decoded, so every
/// failure can say where it happened.
pub struct SectionReader<'s> {
    read: &'s mut dyn Read,
    section: Section,
    offset: u64,
}

impl<'s> SectionReader<'s> {
    pub fn new(read: &'s mut dyn Read, section: Section) -> Self {
        Self {
            read,
            section,
            offset: 0,
        }
    }

    pub fn enter(&mut self, section: Section) {
        self.section = section;
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        match self.read.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ReadError::UnexpectedEof {
                section: self.section,
                offset: self.offset,
            }),
            Err(source) => Err(ReadError::Io {
                section: self.section,
                offset: self.offset,
                source,
            }),
        }
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ReadError> {
        let mut buf = vec![0; len];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut buf = [0; N];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_vec2(&mut self) -> Result<Vec2, ReadError> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, ReadError> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Stored in `x, y, z, w` order.
    pub fn read_quat(&mut self) -> Result<Quat, ReadError> {
        Ok(Quat::from_xyzw(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_rgb(&mut self) -> Result<Rgb, ReadError> {
        Ok(Rgb::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read a Shift_JIS text field of `N` bytes.
    pub fn read_text<const N: usize>(&mut self) -> Result<String, ReadError> {
        let buf = self.read_array::<N>()?;
        Ok(decode_legacy_text(&buf))
    }

    pub fn read_u16s(&mut self, count: usize) -> Result<Vec<u16>, ReadError> {
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(self.read_u16()?);
        }
        Ok(v)
    }
}
