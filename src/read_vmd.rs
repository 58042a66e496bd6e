//! Motion file decoding.
//!
//! Mirrors [`crate::write`]: the same five counted blocks, in the same
//! order. Unlike the encoder, every record kind can be decoded.

use std::io::{BufReader, Read};
use std::path::Path;

use crate::codec::decode_legacy_text;
use crate::header::VmdRawHeader;
use crate::io::*;
use crate::motion::*;
use crate::read::{ReadError, sniff};

pub fn read_vmd(read: &mut dyn Read) -> Result<VmdMotion, ReadError> {
    let mut r = SectionReader::new(read, Section::MotionHeader);
    let buf = r.read_vec(VmdRawHeader::encoded_len())?;
    let raw = VmdRawHeader::from_bytes(&buf)?;
    let signature = decode_legacy_text(&raw.signature);
    if signature != crate::VMD_SIGNATURE {
        return Err(ReadError::BadSignature(signature));
    }
    let mut motion = VmdMotion {
        header: VmdHeader {
            signature,
            model_name: decode_legacy_text(&raw.model_name),
        },
        ..Default::default()
    };

    r.enter(Section::BoneKeyframes);
    let count = r.read_u32()? as usize;
    for _ in 0..count {
        motion.bone_keyframes.insert(BoneKeyframe {
            bone_name: r.read_text::<15>()?,
            frame_no: r.read_u32()?,
            location: r.read_vec3()?,
            rotation: r.read_quat()?,
            interpolation: r.read_array()?,
        });
    }

    r.enter(Section::MorphKeyframes);
    let count = r.read_u32()? as usize;
    for _ in 0..count {
        motion.morph_keyframes.insert(MorphKeyframe {
            morph_name: r.read_text::<15>()?,
            frame_no: r.read_u32()?,
            weight: r.read_f32()?,
        });
    }

    r.enter(Section::CameraKeyframes);
    let count = r.read_u32()? as usize;
    motion.camera_keyframes.reserve(capacity_hint(count));
    for _ in 0..count {
        motion.camera_keyframes.push(CameraKeyframe {
            frame_no: r.read_u32()?,
            distance: r.read_f32()?,
            location: r.read_vec3()?,
            rotation: r.read_vec3()?,
            interpolation: r.read_array()?,
            view_angle: r.read_u32()?,
            perspective: r.read_u8()?,
        });
    }

    r.enter(Section::LightKeyframes);
    let count = r.read_u32()? as usize;
    motion.light_keyframes.reserve(capacity_hint(count));
    for _ in 0..count {
        motion.light_keyframes.push(LightKeyframe {
            frame_no: r.read_u32()?,
            color: r.read_rgb()?,
            location: r.read_vec3()?,
        });
    }

    r.enter(Section::SelfShadowKeyframes);
    let count = r.read_u32()? as usize;
    motion.self_shadow_keyframes.reserve(capacity_hint(count));
    for _ in 0..count {
        motion.self_shadow_keyframes.push(SelfShadowKeyframe {
            frame_no: r.read_u32()?,
            mode: r.read_u8()?,
            distance: r.read_f32()?,
        });
    }

    tracing::debug!(
        bytes = r.offset(),
        bones = motion.bone_keyframes.len(),
        morphs = motion.morph_keyframes.len(),
        cameras = motion.camera_keyframes.len(),
        "decoded motion"
    );
    Ok(motion)
}

pub fn read_vmd_file(path: impl AsRef<Path>) -> Result<VmdMotion, ReadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ReadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let mut read = BufReader::new(file);
    read_vmd(&mut read)
}

pub fn is_vmd_file(read: &mut dyn ReadSeek) -> Result<bool, ReadError> {
    let magic = sniff::<25>(read, Section::MotionHeader)?;
    Ok(magic.is_some_and(|m| &m[..] == crate::VMD_SIGNATURE.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_only(signature: &[u8]) -> Vec<u8> {
        let mut data = VmdRawHeader::new(signature, b"model").as_bytes().to_vec();
        data.extend_from_slice(&[0; 20]);
        data
    }

    #[test]
    fn test_empty_motion() {
        let motion = read_vmd(&mut &header_only(b"Vocaloid Motion Data 0002")[..]).unwrap();
        assert_eq!(motion, VmdMotion::new("model"));
    }

    #[test]
    fn test_old_signature_rejected() {
        let result = read_vmd(&mut &header_only(b"Vocaloid Motion Data file")[..]);
        assert!(matches!(
            result,
            Err(ReadError::BadSignature(s)) if s == "Vocaloid Motion Data file"
        ));
    }

    #[test]
    fn test_missing_block_is_eof() {
        let mut data = header_only(b"Vocaloid Motion Data 0002");
        data.truncate(50 + 8);
        match read_vmd(&mut &data[..]) {
            Err(ReadError::UnexpectedEof { section, offset }) => {
                assert_eq!(section, Section::CameraKeyframes);
                assert_eq!(offset, 58);
            }
            other => panic!("expected eof, got {:?}", other),
        }
    }

    #[test]
    fn test_sniff() {
        let mut cursor = std::io::Cursor::new(header_only(b"Vocaloid Motion Data 0002"));
        assert!(is_vmd_file(&mut cursor).unwrap());
        let mut cursor = std::io::Cursor::new(b"Pmd".to_vec());
        assert!(!is_vmd_file(&mut cursor).unwrap());
    }
}
