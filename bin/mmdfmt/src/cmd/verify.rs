use std::fs::File;
use std::io::BufReader;

use mmd_format::read::{PmdReaderSettings, read_pmd_with_settings};
use mmd_format::read_vmd::read_vmd;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{FileKind, detect_file_kind};

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    args_common: &CommonArgs,
    args_cmd: &VerifyArgs,
) -> AnyResult<()> {
    let path = &args_cmd.inpath.in_file;
    let kind = detect_file_kind(path)?;
    if args_common.verbose {
        eprintln!("Detected {:?} file.", kind);
    }
    let file = File::open(path).context("Could not open input file")?;
    let mut read = BufReader::new(file);
    match kind {
        FileKind::Model => {
            let settings = PmdReaderSettings::from(&args_cmd.rarg);
            let model = read_pmd_with_settings(settings, &mut read)
                .context("Cannot decode model file")?;
            if args_common.verbose {
                eprintln!(
                    "Model data OK: {} vertices, {} bones, {} rigid bodies.",
                    model.vertices.len(),
                    model.bones.len(),
                    model.rigidbodies.len(),
                );
            }
        }
        FileKind::Motion => {
            let motion = read_vmd(&mut read).context("Cannot decode motion file")?;
            if args_common.verbose {
                eprintln!(
                    "Motion data OK: {} bone keyframes, {} morph keyframes.",
                    motion.bone_keyframes.len(),
                    motion.morph_keyframes.len(),
                );
            }
        }
    }
    tracing::info!(path = %path.display(), "file decoded successfully");
    Ok(())
}
