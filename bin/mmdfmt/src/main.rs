use mmd_format::read::PmdReaderSettings;

use crate::prelude::*;

#[allow(unused_imports)]
mod prelude {
    pub use std::path::{Path, PathBuf};

    pub use anyhow::{Context, Result as AnyResult, bail};
}

mod cmd {
    pub mod info;
    pub mod morph_pose;
    pub mod verify;
}

mod util;

#[derive(clap::Parser, Debug)]
#[command(about = "Tool for inspecting MMD model (PMD) and motion (VMD) files.")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    /// Operation to perform
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Print extra info about what the tool is doing
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// Multiply every stored position by this factor
    #[arg(short, long, default_value_t = 1.0)]
    scale: f32,
    /// Keep rigid body positions relative to their bones
    #[arg(long)]
    no_calibrate: bool,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Overwrite output file if it exists
    #[arg(short, long)]
    overwrite: bool,
}

#[derive(clap::Args, Debug)]
struct InputPath {
    /// Path to the input file
    in_file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct OutputPath {
    /// Path where to save the output file
    out_file: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum CliCommand {
    /// Print information about the tool
    Version,
    /// Show general info about a model or motion file
    Info(cmd::info::InfoArgs),
    /// Try decoding the file to check for errors
    Verify(cmd::verify::VerifyArgs),
    /// Write a motion file posing every morph of a model
    MorphPose(cmd::morph_pose::MorphPoseArgs),
}

impl From<&ReadArgs> for PmdReaderSettings {
    fn from(args: &ReadArgs) -> Self {
        Self {
            scale: args.scale,
            calibrate_rigidbodies: !args.no_calibrate,
        }
    }
}

fn run_command(cli: &Cli) -> AnyResult<()> {
    match &cli.command {
        CliCommand::Version => {
            // Verbose always prints version anyway
            if !cli.common.verbose {
                print_version();
            }
            Ok(())
        }
        CliCommand::Info(args) => cmd::info::run(&cli.common, args),
        CliCommand::Verify(args) => cmd::verify::run(&cli.common, args),
        CliCommand::MorphPose(args) => cmd::morph_pose::run(&cli.common, args),
    }
}

fn print_version() {
    eprintln!(
        "{} version {}. Writes motion files as {:?}.",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        mmd_format::VMD_SIGNATURE,
    );
    eprintln!();
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn main() {
    use clap::Parser;
    let cli = Cli::parse();

    init_logging(cli.common.verbose);

    if cli.common.verbose {
        print_version();
    }

    if let Err(e) = run_command(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(2);
    }
}
