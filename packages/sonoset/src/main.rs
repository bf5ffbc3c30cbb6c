//! sonoset CLI binary.

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;
use log::info;

mod cli;
use cli::{Cli, Commands};

use sonoset::{BuildConfig, DatasetBuilder, MemoryChunkSource, verify_dataset};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build(cmd) => build(cmd),
        Commands::Verify(cmd) => verify(cmd),
    }
}

fn build(cmd: cli::BuildCommand) -> Result<()> {
    let cfg = match &cmd.config {
        Some(path) => BuildConfig::from_toml_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => BuildConfig::default(),
    };

    // enough samples for a full canonical time window
    let chunk_len = cmd
        .chunk_len
        .unwrap_or(cfg.win_length + cfg.hop_length * (cfg.win_length - 1));
    info!(
        "building from {} (chunk_len={chunk_len}, batch_size={}, n_jobs={})",
        cmd.wav_dir.display(),
        cfg.batch_size,
        cfg.n_jobs
    );

    let mut source =
        MemoryChunkSource::from_wav_dir(&cmd.wav_dir, chunk_len, cfg.batch_size, cfg.shuffle)
            .with_context(|| format!("load chunks from {}", cmd.wav_dir.display()))?;
    info!("{} chunk(s) loaded", source.len());

    let mut builder = DatasetBuilder::create(cfg, &cmd.out_dir)?;
    if cmd.resume {
        let start = DatasetBuilder::resume_index(&cmd.out_dir);
        info!("resuming at index {start}");
        builder = builder.with_start_index(start);
    }

    let summary = builder.run(&mut source)?;
    info!(
        "wrote {} of {} sample(s) in {} batch(es) to {}",
        summary.written,
        summary.attempted,
        summary.batches,
        cmd.out_dir.display()
    );
    if !summary.failed.is_empty() {
        bail!(
            "{} sample(s) failed to persist: {:?}",
            summary.failed.len(),
            summary.failed
        );
    }
    Ok(())
}

fn verify(cmd: cli::VerifyCommand) -> Result<()> {
    let report = verify_dataset(&cmd.dataset)
        .with_context(|| format!("verify {}", cmd.dataset.display()))?;
    info!(
        "{} verified: {} sample(s), indices {}..={}",
        cmd.dataset.display(),
        report.samples,
        report.first_index,
        report.last_index
    );
    Ok(())
}
