//! Polaroid Snap CLI — instant photos from a webcam or a file.
//!
//! Usage:
//!   polaroid shoot [OPTIONS]        Take a picture and export a print
//!   polaroid print <IMAGE>          Turn an existing image into a print
//!   polaroid caption <IMAGE>        Ask the caption service about an image
//!   polaroid develop <IMAGE>        Write the developing-effect frames
//!   polaroid check                  Check cameras, fonts, and credentials

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use polaroid_common::config::AppConfig;
use polaroid_model::Facing;

mod commands;

#[derive(Parser)]
#[command(
    name = "polaroid",
    about = "Instant-camera prints with AI captions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/polaroid/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the camera, take a picture, and export a print
    Shoot {
        /// Camera to use
        #[arg(long, value_enum, default_value = "front")]
        facing: FacingArg,

        /// Explicit camera device (e.g. /dev/video2)
        #[arg(long)]
        device: Option<String>,

        /// Flash before the shot
        #[arg(long)]
        flash: bool,

        /// Use the built-in test pattern instead of a camera
        #[arg(long)]
        synthetic: bool,

        /// Shoot immediately instead of waiting for Enter
        #[arg(long)]
        now: bool,

        #[command(flatten)]
        finish: FinishArgs,
    },

    /// Turn an existing image into a print
    Print {
        /// Image file to print
        image: PathBuf,

        /// Center-crop the image to a square first
        #[arg(long)]
        square: bool,

        #[command(flatten)]
        finish: FinishArgs,
    },

    /// Print the caption the service suggests for an image
    Caption {
        /// Image file to caption
        image: PathBuf,
    },

    /// Write the preview's developing animation as PNG frames
    Develop {
        /// Image file to develop
        image: PathBuf,

        /// Number of frames across the whole animation
        #[arg(long, default_value = "12")]
        frames: u32,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check cameras, fonts, credentials, and the output directory
    Check,
}

/// Caption and destination options shared by `shoot` and `print`.
#[derive(Args, Debug, Clone, Default)]
struct FinishArgs {
    /// Caption to print (wins over --ai)
    #[arg(long)]
    caption: Option<String>,

    /// Ask the caption service for a caption
    #[arg(long)]
    ai: bool,

    /// Output directory for the print
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<FinishArgs> for commands::finish::Finish {
    fn from(args: FinishArgs) -> Self {
        Self {
            caption: args.caption,
            ai: args.ai,
            output: args.output,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => Facing::Front,
            FacingArg::Back => Facing::Back,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    polaroid_common::logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Shoot {
            facing,
            device,
            flash,
            synthetic,
            now,
            finish,
        } => {
            commands::shoot::run(
                &config,
                commands::shoot::ShootOptions {
                    facing: facing.into(),
                    device,
                    flash,
                    synthetic,
                    now,
                },
                finish.into(),
            )
            .await
        }
        Commands::Print {
            image,
            square,
            finish,
        } => commands::print::run(&config, image, square, finish.into()).await,
        Commands::Caption { image } => commands::caption::run(&config, image).await,
        Commands::Develop {
            image,
            frames,
            output,
        } => commands::develop::run(&config, image, frames, output).await,
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shoot_flags_parse() {
        let cli = Cli::try_parse_from([
            "polaroid", "shoot", "--facing", "back", "--now", "--flash", "--ai", "-o", "/tmp/out",
        ])
        .unwrap();
        match cli.command {
            Commands::Shoot {
                facing,
                now,
                flash,
                finish,
                synthetic,
                ..
            } => {
                assert_eq!(Facing::from(facing), Facing::Back);
                assert!(now && flash && finish.ai && !synthetic);
                assert_eq!(finish.output, Some(PathBuf::from("/tmp/out")));
            }
            _ => panic!("expected shoot"),
        }
    }

    #[test]
    fn print_requires_an_image() {
        assert!(Cli::try_parse_from(["polaroid", "print"]).is_err());
        let cli = Cli::try_parse_from(["polaroid", "-v", "print", "cat.jpg", "--square"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Print { square: true, .. }));
    }

    #[test]
    fn unknown_facing_is_rejected() {
        assert!(Cli::try_parse_from(["polaroid", "shoot", "--facing", "side"]).is_err());
    }
}
