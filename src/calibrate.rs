//! Rigid body positions are stored relative to the bone each body is bound
//! to, so they stay valid when bones are edited. Physics consumers need
//! them in model space.

use crate::model::{Bone, PmdModel, Rigidbody, RigidbodySpace};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalibrateError {
    #[error("No bones present to calibrate {rigidbodies} rigid bodies against")]
    NoBones { rigidbodies: usize },
    #[error("Rigid body {rigidbody} is bound to bone {bone}, but there are only {count} bones")]
    BoneOutOfRange {
        rigidbody: usize,
        bone: u16,
        count: usize,
    },
    #[error("Rigid body positions are already absolute")]
    AlreadyCalibrated,
}

/// Convert every rigid body position from bone-relative to absolute.
///
/// Each body is offset by the position of its bone. Unbound bodies use
/// the first bone. All bindings are resolved before anything is modified,
/// so on error the model is unchanged.
pub fn calibrate_rigidbodies(model: &mut PmdModel) -> Result<(), CalibrateError> {
    if model.rigidbody_space() == RigidbodySpace::Absolute {
        return Err(CalibrateError::AlreadyCalibrated);
    }
    let anchors = resolve_anchors(&model.bones, &model.rigidbodies)?;
    for (rigid, anchor) in model.rigidbodies.iter_mut().zip(anchors) {
        rigid.position += model.bones[anchor].position;
    }
    model.mark_rigidbodies_absolute();
    tracing::debug!(count = model.rigidbodies.len(), "calibrated rigid bodies");
    Ok(())
}

fn resolve_anchors(
    bones: &[Bone],
    rigidbodies: &[Rigidbody],
) -> Result<Vec<usize>, CalibrateError> {
    if bones.is_empty() && !rigidbodies.is_empty() {
        return Err(CalibrateError::NoBones {
            rigidbodies: rigidbodies.len(),
        });
    }
    rigidbodies
        .iter()
        .enumerate()
        .map(|(i, rigid)| match rigid.bone() {
            Some(bone) if bone < bones.len() => Ok(bone),
            Some(_) => Err(CalibrateError::BoneOutOfRange {
                rigidbody: i,
                bone: rigid.bone_index,
                count: bones.len(),
            }),
            None => Ok(0),
        })
        .collect()
}
