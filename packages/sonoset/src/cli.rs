//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sonoset",
    about = "Build synchronized mel-spectrogram training datasets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a dataset from a directory of WAV recordings
    Build(BuildCommand),
    /// Check an existing dataset for index and shape consistency
    Verify(VerifyCommand),
}

#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Directory containing .wav recordings
    #[arg(long)]
    pub wav_dir: PathBuf,

    /// Dataset output root (the four artifact directories go here)
    #[arg(long, default_value = "./dataset")]
    pub out_dir: PathBuf,

    /// Optional TOML build configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Audio samples per chunk; defaults to exactly enough for a full
    /// canonical time window
    #[arg(long)]
    pub chunk_len: Option<usize>,

    /// Continue numbering after the highest index already on disk
    #[arg(long)]
    pub resume: bool,
}

#[derive(Args, Debug)]
pub struct VerifyCommand {
    /// Dataset root to check
    #[arg(long, default_value = "./dataset")]
    pub dataset: PathBuf,
}
