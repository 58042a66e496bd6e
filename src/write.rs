use std::io::Write;

use crate::codec::*;
use crate::header::VmdRawHeader;
use crate::motion::*;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding {0} records is not implemented")]
    Unimplemented(RecordKind),
    #[error("Too many {kind} records: {count}")]
    TooManyRecords { kind: RecordKind, count: usize },
}

/// Length of the buffer [`encode_vmd`] produces for `motion`.
pub fn encoded_len(motion: &VmdMotion) -> usize {
    VmdRawHeader::encoded_len()
        + 5 * 4
        + motion.bone_keyframes.len() * BoneKeyframe::WIDTH
        + motion.morph_keyframes.len() * MorphKeyframe::WIDTH
        + motion.camera_keyframes.len() * CameraKeyframe::WIDTH
        + motion.light_keyframes.len() * LightKeyframe::WIDTH
        + motion.self_shadow_keyframes.len() * SelfShadowKeyframe::WIDTH
}

/// Encode a motion document.
///
/// Bone and camera keyframes cannot be encoded yet: a document containing
/// any fails with [`WriteError::Unimplemented`]. Empty lists of those kinds
/// are written as a zero count.
pub fn encode_vmd(motion: &VmdMotion) -> Result<Vec<u8>, WriteError> {
    let mut out = Vec::with_capacity(encoded_len(motion));
    let header = VmdRawHeader::new(
        &encode_legacy_text(&motion.header.signature),
        &encode_legacy_text(&motion.header.model_name),
    );
    out.extend_from_slice(header.as_bytes());
    encode_counted_list(&mut out, &motion.bone_keyframes)?;
    encode_counted_list(&mut out, &motion.morph_keyframes)?;
    encode_counted_list(&mut out, &motion.camera_keyframes)?;
    encode_counted_list(&mut out, &motion.light_keyframes)?;
    encode_counted_list(&mut out, &motion.self_shadow_keyframes)?;
    tracing::debug!(
        bytes = out.len(),
        morphs = motion.morph_keyframes.len(),
        lights = motion.light_keyframes.len(),
        self_shadows = motion.self_shadow_keyframes.len(),
        "encoded motion"
    );
    Ok(out)
}

/// Encode a motion document and write it out.
///
/// Nothing is written unless the whole document encodes.
pub fn write_vmd(motion: &VmdMotion, write: &mut dyn Write) -> Result<(), WriteError> {
    let bytes = encode_vmd(motion)?;
    write.write_all(&bytes)?;
    Ok(())
}

impl FixedRecord for BoneKeyframe {
    const KIND: RecordKind = RecordKind::BoneMotion;

    fn encode_record(&self, _out: &mut Vec<u8>) -> Result<(), WriteError> {
        Err(WriteError::Unimplemented(Self::KIND))
    }
}

impl FixedRecord for MorphKeyframe {
    const KIND: RecordKind = RecordKind::Morph;

    fn encode_record(&self, out: &mut Vec<u8>) -> Result<(), WriteError> {
        put_fixed(out, &encode_legacy_text(&self.morph_name), 15);
        put_u32(out, self.frame_no);
        put_f32(out, self.weight);
        Ok(())
    }
}

impl FixedRecord for CameraKeyframe {
    const KIND: RecordKind = RecordKind::Camera;

    fn encode_record(&self, _out: &mut Vec<u8>) -> Result<(), WriteError> {
        Err(WriteError::Unimplemented(Self::KIND))
    }
}

impl FixedRecord for LightKeyframe {
    const KIND: RecordKind = RecordKind::Light;

    fn encode_record(&self, out: &mut Vec<u8>) -> Result<(), WriteError> {
        put_u32(out, self.frame_no);
        put_rgb(out, self.color);
        put_vec3(out, self.location);
        Ok(())
    }
}

impl FixedRecord for SelfShadowKeyframe {
    const KIND: RecordKind = RecordKind::SelfShadow;

    fn encode_record(&self, out: &mut Vec<u8>) -> Result<(), WriteError> {
        put_u32(out, self.frame_no);
        out.push(self.mode);
        put_f32(out, self.distance);
        Ok(())
    }
}
