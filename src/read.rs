use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use crate::calibrate::{CalibrateError, calibrate_rigidbodies};
use crate::codec::decode_legacy_text;
use crate::header::{HeaderParseError, LocalizedRawHeader, PmdRawHeader};
use crate::io::*;
use crate::model::*;
use crate::NO_BONE;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Did not find magic bytes at start of file")]
    BadMagic,
    #[error("Unsupported motion signature: {0:?}")]
    BadSignature(String),
    #[error("Data ends too early: {section} at byte {offset}")]
    UnexpectedEof { section: Section, offset: u64 },
    #[error("I/O: {section} at byte {offset}: {source}")]
    Io {
        section: Section,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot decode header: {0}")]
    Header(#[from] HeaderParseError),
    #[error("Face index count {count} is not a multiple of 3 (byte {offset})")]
    BadFaceCount { count: u32, offset: u64 },
    #[error("Bone {bone} has parent {parent}, but there are only {count} bones")]
    BadBoneParent { bone: usize, parent: u16, count: usize },
    #[error("Scale factor must be positive and finite, got {0}")]
    BadScale(f32),
    #[error("Rigid body calibration failed: {0}")]
    Calibrate(#[from] CalibrateError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmdReaderSettings {
    /// Multiplier for every stored position: vertices, bones, morph
    /// offsets, rigid bodies and joints.
    pub scale: f32,
    /// Convert rigid body positions to absolute coordinates after decoding.
    ///
    /// If disabled, the caller is expected to run
    /// [`calibrate_rigidbodies`] before handing the model to anything that
    /// needs absolute positions. Calibrating a scaled model later can
    /// round differently from calibrating during decode.
    pub calibrate_rigidbodies: bool,
}

impl Default for PmdReaderSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            calibrate_rigidbodies: true,
        }
    }
}

impl PmdReaderSettings {
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }
}

pub fn read_pmd(read: &mut dyn Read) -> Result<PmdModel, ReadError> {
    read_pmd_with_settings(Default::default(), read)
}

/// Decode a complete model.
///
/// Sections are read strictly in file order; nothing is returned unless
/// every section decodes.
pub fn read_pmd_with_settings(
    settings: PmdReaderSettings,
    read: &mut dyn Read,
) -> Result<PmdModel, ReadError> {
    if !(settings.scale.is_finite() && settings.scale > 0.0) {
        return Err(ReadError::BadScale(settings.scale));
    }
    let decoder = PmdDecoder {
        r: SectionReader::new(read, Section::ModelHeader),
    };
    let mut model = decoder.decode()?;
    // Calibration runs in file units, before scaling.
    if settings.calibrate_rigidbodies {
        calibrate_rigidbodies(&mut model)?;
    }
    if settings.scale != 1.0 {
        scale_positions(&mut model, settings.scale);
    }
    Ok(model)
}

fn scale_positions(model: &mut PmdModel, scale: f32) {
    for vertex in model.vertices.iter_mut() {
        vertex.position *= scale;
    }
    for bone in model.bones.iter_mut() {
        bone.position *= scale;
    }
    for vertex in model.morphs.iter_mut().flat_map(|m| m.vertices.iter_mut()) {
        vertex.offset *= scale;
    }
    for rigid in model.rigidbodies.iter_mut() {
        rigid.position *= scale;
    }
    for joint in model.joints.iter_mut() {
        joint.position *= scale;
    }
}

pub fn read_pmd_file(
    path: impl AsRef<Path>,
    settings: PmdReaderSettings,
) -> Result<PmdModel, ReadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ReadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let mut read = BufReader::new(file);
    read_pmd_with_settings(settings, &mut read)
}

pub fn is_pmd_file(read: &mut dyn ReadSeek) -> Result<bool, ReadError> {
    let magic = sniff::<3>(read, Section::ModelHeader)?;
    Ok(magic == Some(crate::PMD_MAGIC))
}

/// Peek at the first `N` bytes and rewind. `None` if the stream is shorter.
pub(crate) fn sniff<const N: usize>(
    read: &mut dyn ReadSeek,
    section: Section,
) -> Result<Option<[u8; N]>, ReadError> {
    let io_err = |source| ReadError::Io {
        section,
        offset: 0,
        source,
    };
    read.rewind().map_err(io_err)?;
    let mut magic = [0; N];
    let found = match read.read_exact(&mut magic) {
        Ok(()) => Some(magic),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => None,
        Err(e) => return Err(io_err(e)),
    };
    read.rewind().map_err(io_err)?;
    Ok(found)
}

struct PmdDecoder<'s> {
    r: SectionReader<'s>,
}

impl PmdDecoder<'_> {
    fn decode(mut self) -> Result<PmdModel, ReadError> {
        let mut model = PmdModel::default();
        model.header = self.read_header()?;
        model.vertices = self.read_vertices()?;
        model.faces = self.read_faces()?;
        model.materials = self.read_materials()?;
        model.bones = self.read_bones()?;
        model.iks = self.read_iks()?;
        model.morphs = self.read_morphs()?;
        model.morph_display = self.read_morph_display()?;
        model.bone_windows = self.read_bone_windows()?;
        model.bone_display = self.read_bone_display()?;
        model.localization = self.read_localization(
            model.bones.len(),
            model.morphs.len(),
            model.bone_windows.len(),
        )?;
        model.toon_textures = self.read_toon_textures()?;
        model.rigidbodies = self.read_rigidbodies()?;
        model.joints = self.read_joints()?;
        tracing::debug!(bytes = self.r.offset(), name = %model.header.name, "decoded model");
        Ok(model)
    }

    fn read_header(&mut self) -> Result<PmdHeader, ReadError> {
        self.r.enter(Section::ModelHeader);
        let buf = self.r.read_vec(PmdRawHeader::encoded_len())?;
        let raw = PmdRawHeader::from_bytes(&buf)?;
        if raw.magic != crate::PMD_MAGIC {
            return Err(ReadError::BadMagic);
        }
        Ok(PmdHeader {
            version: raw.version,
            name: decode_legacy_text(&raw.name),
            comment: decode_legacy_text(&raw.comment),
        })
    }

    fn read_vertices(&mut self) -> Result<Vec<Vertex>, ReadError> {
        self.r.enter(Section::Vertices);
        let count = self.r.read_u32()? as usize;
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(Vertex {
                position: self.r.read_vec3()?,
                normal: self.r.read_vec3()?,
                uv: self.r.read_vec2()?,
                bones: [self.r.read_u16()?, self.r.read_u16()?],
                bone_weight: self.r.read_u8()?,
                edge_flag: self.r.read_u8()?,
            });
        }
        tracing::debug!(count, "vertices");
        Ok(v)
    }

    fn read_faces(&mut self) -> Result<Vec<[u16; 3]>, ReadError> {
        self.r.enter(Section::Faces);
        let offset = self.r.offset();
        let count = self.r.read_u32()?;
        if count % 3 != 0 {
            return Err(ReadError::BadFaceCount { count, offset });
        }
        let n_faces = count as usize / 3;
        let mut v = Vec::with_capacity(capacity_hint(n_faces));
        for _ in 0..n_faces {
            v.push([self.r.read_u16()?, self.r.read_u16()?, self.r.read_u16()?]);
        }
        tracing::debug!(count = n_faces, "faces");
        Ok(v)
    }

    fn read_materials(&mut self) -> Result<Vec<Material>, ReadError> {
        self.r.enter(Section::Materials);
        let count = self.r.read_u32()? as usize;
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(Material {
                diffuse: self.r.read_rgb()?,
                alpha: self.r.read_f32()?,
                specularity: self.r.read_f32()?,
                specular: self.r.read_rgb()?,
                ambient: self.r.read_rgb()?,
                toon_index: self.r.read_u8()?,
                edge_flag: self.r.read_u8()?,
                face_vertex_count: self.r.read_u32()?,
                texture: self.r.read_text::<20>()?,
            });
        }
        tracing::debug!(count, "materials");
        Ok(v)
    }

    fn read_bones(&mut self) -> Result<Vec<Bone>, ReadError> {
        self.r.enter(Section::Bones);
        let count = self.r.read_u16()? as usize;
        let mut v = Vec::with_capacity(count);
        for _ in 0..count {
            v.push(Bone {
                name: self.r.read_text::<20>()?,
                parent: self.r.read_u16()?,
                tail: self.r.read_u16()?,
                kind: self.r.read_u8()?,
                ik_parent: self.r.read_u16()?,
                position: self.r.read_vec3()?,
            });
        }
        for (bone, b) in v.iter().enumerate() {
            if b.parent != NO_BONE && b.parent as usize >= count {
                return Err(ReadError::BadBoneParent {
                    bone,
                    parent: b.parent,
                    count,
                });
            }
        }
        tracing::debug!(count, "bones");
        Ok(v)
    }

    fn read_iks(&mut self) -> Result<Vec<IkChain>, ReadError> {
        self.r.enter(Section::IkChains);
        let count = self.r.read_u16()? as usize;
        let mut v = Vec::with_capacity(count);
        for _ in 0..count {
            let bone = self.r.read_u16()?;
            let target = self.r.read_u16()?;
            let chain_len = self.r.read_u8()? as usize;
            let iterations = self.r.read_u16()?;
            let limit = self.r.read_f32()?;
            let chain = self.r.read_u16s(chain_len)?;
            v.push(IkChain {
                bone,
                target,
                iterations,
                limit,
                chain,
            });
        }
        tracing::debug!(count, "IK chains");
        Ok(v)
    }

    fn read_morphs(&mut self) -> Result<Vec<Morph>, ReadError> {
        self.r.enter(Section::Morphs);
        let count = self.r.read_u16()? as usize;
        let mut v = Vec::with_capacity(count);
        for _ in 0..count {
            let name = self.r.read_text::<20>()?;
            let n_vertices = self.r.read_u32()? as usize;
            let kind = MorphKind::from_u8(self.r.read_u8()?);
            let mut vertices = Vec::with_capacity(capacity_hint(n_vertices));
            for _ in 0..n_vertices {
                vertices.push(MorphVertex {
                    index: self.r.read_u32()?,
                    offset: self.r.read_vec3()?,
                });
            }
            v.push(Morph {
                name,
                kind,
                vertices,
            });
        }
        tracing::debug!(count, "morphs");
        Ok(v)
    }

    fn read_morph_display(&mut self) -> Result<Vec<u16>, ReadError> {
        self.r.enter(Section::MorphDisplay);
        let count = self.r.read_u8()? as usize;
        self.r.read_u16s(count)
    }

    fn read_bone_windows(&mut self) -> Result<Vec<String>, ReadError> {
        self.r.enter(Section::BoneWindows);
        let count = self.r.read_u8()? as usize;
        let mut v = Vec::with_capacity(count);
        for _ in 0..count {
            v.push(self.r.read_text::<50>()?);
        }
        Ok(v)
    }

    fn read_bone_display(&mut self) -> Result<Vec<BoneDisplay>, ReadError> {
        self.r.enter(Section::BoneDisplay);
        let count = self.r.read_u32()? as usize;
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(BoneDisplay {
                bone: self.r.read_u16()?,
                window: self.r.read_u8()?,
            });
        }
        Ok(v)
    }

    /// The list lengths come from the sections already decoded; the block
    /// carries no counts of its own.
    fn read_localization(
        &mut self,
        n_bones: usize,
        n_morphs: usize,
        n_windows: usize,
    ) -> Result<Option<Localization>, ReadError> {
        self.r.enter(Section::Localization);
        if self.r.read_u8()? == 0 {
            return Ok(None);
        }
        let buf = self.r.read_vec(LocalizedRawHeader::encoded_len())?;
        let raw = LocalizedRawHeader::from_bytes(&buf)?;
        let mut loc = Localization {
            name: decode_legacy_text(&raw.name),
            comment: decode_legacy_text(&raw.comment),
            ..Default::default()
        };
        for _ in 0..n_bones {
            loc.bone_names.push(self.r.read_text::<20>()?);
        }
        // The base morph has no localized name.
        for _ in 0..n_morphs.saturating_sub(1) {
            loc.morph_names.push(self.r.read_text::<20>()?);
        }
        for _ in 0..n_windows {
            loc.bone_window_names.push(self.r.read_text::<50>()?);
        }
        Ok(Some(loc))
    }

    fn read_toon_textures(&mut self) -> Result<Vec<String>, ReadError> {
        self.r.enter(Section::ToonTextures);
        let mut v = Vec::with_capacity(TOON_TEXTURE_COUNT);
        for _ in 0..TOON_TEXTURE_COUNT {
            v.push(self.r.read_text::<100>()?);
        }
        Ok(v)
    }

    fn read_rigidbodies(&mut self) -> Result<Vec<Rigidbody>, ReadError> {
        self.r.enter(Section::Rigidbodies);
        let count = self.r.read_u32()? as usize;
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(Rigidbody {
                name: self.r.read_text::<20>()?,
                bone_index: self.r.read_u16()?,
                group: self.r.read_u8()?,
                collision_mask: self.r.read_u16()?,
                shape: self.r.read_u8()?,
                size: self.r.read_vec3()?,
                position: self.r.read_vec3()?,
                rotation: self.r.read_vec3()?,
                mass: self.r.read_f32()?,
                linear_damping: self.r.read_f32()?,
                angular_damping: self.r.read_f32()?,
                restitution: self.r.read_f32()?,
                friction: self.r.read_f32()?,
                mode: self.r.read_u8()?,
            });
        }
        tracing::debug!(count, "rigid bodies");
        Ok(v)
    }

    fn read_joints(&mut self) -> Result<Vec<Joint>, ReadError> {
        self.r.enter(Section::Joints);
        let count = self.r.read_u32()? as usize;
        let mut v = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            v.push(Joint {
                name: self.r.read_text::<20>()?,
                rigidbodies: [self.r.read_u32()?, self.r.read_u32()?],
                position: self.r.read_vec3()?,
                rotation: self.r.read_vec3()?,
                linear_lower: self.r.read_vec3()?,
                linear_upper: self.r.read_vec3()?,
                angular_lower: self.r.read_vec3()?,
                angular_upper: self.r.read_vec3()?,
                spring_linear: self.r.read_vec3()?,
                spring_angular: self.r.read_vec3()?,
            });
        }
        tracing::debug!(count, "joints");
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic() {
        let mut data = vec![b'P', b'm', b'x'];
        data.resize(PmdRawHeader::encoded_len(), 0);
        assert!(matches!(read_pmd(&mut &data[..]), Err(ReadError::BadMagic)));
    }

    #[test]
    fn test_empty_stream() {
        match read_pmd(&mut std::io::empty()) {
            Err(ReadError::UnexpectedEof { section, offset }) => {
                assert_eq!(section, Section::ModelHeader);
                assert_eq!(offset, 0);
            }
            other => panic!("expected eof, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_scale() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let settings = PmdReaderSettings::with_scale(scale);
            let result = read_pmd_with_settings(settings, &mut std::io::empty());
            assert!(matches!(result, Err(ReadError::BadScale(_))));
        }
    }

    #[test]
    fn test_sniff_short_stream() {
        let mut cursor = std::io::Cursor::new(vec![b'P', b'm']);
        assert!(!is_pmd_file(&mut cursor).unwrap());
        let mut cursor = std::io::Cursor::new(b"Pmd\0\0".to_vec());
        assert!(is_pmd_file(&mut cursor).unwrap());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_error_display_has_context() {
        let e = ReadError::UnexpectedEof {
            section: Section::Rigidbodies,
            offset: 1234,
        };
        assert_eq!(e.to_string(), "Data ends too early: rigid bodies at byte 1234");
    }
}
