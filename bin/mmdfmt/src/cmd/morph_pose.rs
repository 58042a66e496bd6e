use std::io::Write;

use mmd_format::HashSet;
use mmd_format::model::PmdModel;
use mmd_format::motion::{MorphKeyframe, VmdMotion};
use mmd_format::read::{PmdReaderSettings, read_pmd_file};
use mmd_format::write::write_vmd;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::create_output;

#[derive(clap::Args, Debug)]
pub struct MorphPoseArgs {
    /// Morph weight override, as NAME=WEIGHT (repeatable)
    #[arg(long = "set", value_parser = parse_weight)]
    weights: Vec<(String, f32)>,
    /// Frame number for every key
    #[arg(short, long, default_value_t = 0)]
    frame: u32,
    #[command(flatten)]
    oarg: crate::OutputArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
    #[command(flatten)]
    outpath: crate::OutputPath,
}

fn parse_weight(s: &str) -> Result<(String, f32), String> {
    let (name, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=WEIGHT, got {:?}", s))?;
    let weight = weight
        .parse()
        .map_err(|e| format!("bad weight {:?}: {}", weight, e))?;
    Ok((name.to_owned(), weight))
}

pub fn run(
    args_common: &CommonArgs,
    args_cmd: &MorphPoseArgs,
) -> AnyResult<()> {
    let model = read_pmd_file(&args_cmd.inpath.in_file, PmdReaderSettings::default())
        .context("Cannot decode model file")?;

    let motion = pose_motion(&model, &args_cmd.weights, args_cmd.frame)?;
    if args_common.verbose {
        eprintln!("Writing {} morph keyframes.", motion.morph_keyframes.len());
    }

    let mut bufout = create_output(&args_cmd.outpath.out_file, args_cmd.oarg.overwrite)?;
    write_vmd(&motion, &mut bufout).context("Cannot encode output file")?;
    bufout.flush().context("Cannot write output file")?;
    Ok(())
}

/// One key per morph except the base morph, which is the rest shape and
/// cannot be keyed. Later overrides for the same name win.
fn pose_motion(
    model: &PmdModel,
    weights: &[(String, f32)],
    frame: u32,
) -> AnyResult<VmdMotion> {
    let keyable = &model.morphs[usize::from(model.base_morph().is_some())..];
    let known: HashSet<&str> = keyable.iter().map(|m| m.name.as_str()).collect();
    for (name, _) in weights.iter() {
        if !known.contains(name.as_str()) {
            bail!("Model has no keyable morph named {:?}", name);
        }
    }

    let mut motion = VmdMotion::new(model.header.name.clone());
    for morph in keyable {
        let weight = weights
            .iter()
            .rev()
            .find(|(name, _)| *name == morph.name)
            .map(|(_, w)| *w)
            .unwrap_or(0.0);
        motion
            .morph_keyframes
            .insert(MorphKeyframe::new(morph.name.clone(), frame, weight));
    }
    Ok(motion)
}

#[cfg(test)]
mod tests {
    use mmd_format::model::{Morph, MorphKind};

    use super::*;

    fn model_with_morphs() -> PmdModel {
        let morph = |name: &str, kind| Morph {
            name: name.to_owned(),
            kind,
            vertices: vec![],
        };
        let mut model = PmdModel::default();
        model.morphs = vec![
            morph("base", MorphKind::Base),
            morph("smile", MorphKind::Eyebrow),
            morph("a", MorphKind::Lip),
        ];
        model
    }

    #[test]
    fn test_keys_every_morph_but_base() {
        let weights = vec![("a".to_owned(), 0.25), ("a".to_owned(), 0.75)];
        let motion = pose_motion(&model_with_morphs(), &weights, 12).unwrap();
        let keys: Vec<_> = motion
            .morph_keyframes
            .iter()
            .map(|k| (k.morph_name.as_str(), k.frame_no, k.weight))
            .collect();
        assert_eq!(keys, [("smile", 12, 0.0), ("a", 12, 0.75)]);
    }

    #[test]
    fn test_base_morph_weight_rejected() {
        let weights = vec![("base".to_owned(), 1.0)];
        assert!(pose_motion(&model_with_morphs(), &weights, 0).is_err());
    }

    #[test]
    fn test_unknown_morph_rejected() {
        let weights = vec![("frown".to_owned(), 1.0)];
        assert!(pose_motion(&model_with_morphs(), &weights, 0).is_err());
    }

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("a=0.5"), Ok(("a".to_owned(), 0.5)));
        assert!(parse_weight("a").is_err());
        assert!(parse_weight("a=x").is_err());
    }
}
