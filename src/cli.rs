use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vidforge")]
#[command(about = "Batch video converter with color grading previews", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every video in the input folder using the configured profile
    Run {
        /// Input folder (overrides config)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output folder (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Encoder to use: cpu, gpu-hevc, or gpu-av1 (overrides config)
        #[arg(long)]
        encoder: Option<String>,
    },

    /// Scan the input folder and list the videos a run would pick up
    Scan {
        /// Folder to scan (defaults to the configured input folder)
        directory: Option<PathBuf>,
    },

    /// Show the ffmpeg commands a run would execute, without encoding
    DryRun {
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        encoder: Option<String>,
    },

    /// Probe a video file for its duration
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Extract before/after preview frames for one file
    Preview {
        /// Path to the video file
        file: PathBuf,

        /// Directory the preview JPEGs are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Check that ffmpeg/ffprobe are installed and list hardware encoders
    CheckFfmpeg,

    /// Write a default config file if none exists and show its location
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
