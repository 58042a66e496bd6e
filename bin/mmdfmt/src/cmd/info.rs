use mmd_format::model::PmdModel;
use mmd_format::motion::VmdMotion;
use mmd_format::read::{PmdReaderSettings, read_pmd_file};
use mmd_format::read_vmd::read_vmd_file;

use crate::CommonArgs;
use crate::prelude::*;
use crate::util::{FileKind, detect_file_kind};

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    rarg: crate::ReadArgs,
    /// List every bone and morph name
    #[arg(short, long)]
    names: bool,
    #[command(flatten)]
    inpath: crate::InputPath,
}

pub fn run(
    _args_common: &CommonArgs,
    args_cmd: &InfoArgs,
) -> AnyResult<()> {
    let path = &args_cmd.inpath.in_file;
    match detect_file_kind(path)? {
        FileKind::Model => {
            let model = read_pmd_file(path, PmdReaderSettings::from(&args_cmd.rarg))
                .context("Cannot decode model file")?;
            print_model(&model, args_cmd.names);
        }
        FileKind::Motion => {
            let motion = read_vmd_file(path).context("Cannot decode motion file")?;
            print_motion(&motion, args_cmd.names);
        }
    }
    Ok(())
}

fn print_model(model: &PmdModel, names: bool) {
    println!("Model: {}", model.header.name);
    println!("Version: {}", model.header.version);
    if !model.header.comment.is_empty() {
        println!("Comment:\n{}", model.header.comment);
    }
    if let Some(loc) = &model.localization {
        println!("Localized name: {}", loc.name);
    }
    println!("Vertices: {}", model.vertices.len());
    println!("Faces: {}", model.faces.len());
    println!("Materials: {}", model.materials.len());
    println!("Bones: {}", model.bones.len());
    println!("IK chains: {}", model.iks.len());
    println!("Morphs: {}", model.morphs.len());
    println!("Bone windows: {}", model.bone_windows.len());
    println!("Rigid bodies: {} ({:?})", model.rigidbodies.len(), model.rigidbody_space());
    println!("Joints: {}", model.joints.len());
    if names {
        println!();
        for (i, bone) in model.bones.iter().enumerate() {
            match bone.parent() {
                Some(parent) => println!("bone {:4}: {} (parent {})", i, bone.name, parent),
                None => println!("bone {:4}: {}", i, bone.name),
            }
        }
        for (i, morph) in model.morphs.iter().enumerate() {
            println!(
                "morph {:4}: {} ({:?}, {} vertices)",
                i,
                morph.name,
                morph.kind,
                morph.vertices.len()
            );
        }
    }
}

fn print_motion(motion: &VmdMotion, names: bool) {
    println!("Motion for model: {}", motion.header.model_name);
    println!(
        "Bone keyframes: {} ({} bones)",
        motion.bone_keyframes.len(),
        motion.bone_keyframes.group_count()
    );
    println!(
        "Morph keyframes: {} ({} morphs)",
        motion.morph_keyframes.len(),
        motion.morph_keyframes.group_count()
    );
    println!("Camera keyframes: {}", motion.camera_keyframes.len());
    println!("Light keyframes: {}", motion.light_keyframes.len());
    println!("Self shadow keyframes: {}", motion.self_shadow_keyframes.len());
    if names {
        println!();
        for group in motion.bone_keyframes.groups() {
            println!("bone: {} ({} keys)", group.name(), group.keyframes().len());
        }
        for group in motion.morph_keyframes.groups() {
            println!("morph: {} ({} keys)", group.name(), group.keyframes().len());
        }
    }
}
