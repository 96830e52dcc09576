use compressed_mesh::MeshCapabilities;
use compressed_mesh::io::Endian;

use crate::prelude::*;

#[allow(unused_imports)]
mod prelude {
    pub use std::path::{Path, PathBuf};

    pub use anyhow::{Context, Result as AnyResult, bail};
}

mod cmd {
    pub mod info;
    pub mod verify;
}

mod util;

#[derive(clap::Parser, Debug)]
#[command(about = "Tool for inspecting serialized compressed mesh records.")]
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
    /// Scalars in the file are big-endian
    #[arg(long)]
    big_endian: bool,
    /// File uses the pre-5.0 schema (bind poses, 32-bit colors, no UV info)
    #[arg(long)]
    legacy: bool,
}

#[derive(clap::Args, Debug)]
struct InputPath {
    /// Path to the input file
    in_file: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum CliCommand {
    /// Print information about the tool
    Version,
    /// Show the streams stored in a record file
    Info(cmd::info::InfoArgs),
    /// Decode, re-encode and decode again to check for errors
    Verify(cmd::verify::VerifyArgs),
}

impl From<&ReadArgs> for Endian {
    fn from(args: &ReadArgs) -> Self {
        if args.big_endian {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

impl From<&ReadArgs> for MeshCapabilities {
    fn from(args: &ReadArgs) -> Self {
        if args.legacy {
            MeshCapabilities::legacy()
        } else {
            MeshCapabilities::modern()
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
    }
}

fn print_version() {
    eprintln!(
        "{} version {}. Reads up to {} UV channels per record.",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        compressed_mesh::MAX_UV_CHANNELS,
    );
    eprintln!();
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
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
