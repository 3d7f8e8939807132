use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cdn_rewrite::config::{Cli, Config};
use cdn_rewrite::logging;
use cdn_rewrite::runner;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {e}");
    }

    let Some(config) = Config::from_cli(cli).context("Invalid configuration")? else {
        tracing::info!("CDN rewriting disabled, nothing to do");
        return Ok(ExitCode::SUCCESS);
    };

    // Configure Rayon thread pool
    if config.jobs > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build_global()
            .ok();
    }

    // Progress bar only in verbose mode
    let progress = if config.verbose {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let result = runner::run(&config, progress.as_ref());

    // Clear the bar before anything else reaches the terminal
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let summary = result.with_context(|| {
        format!(
            "Failed to rewrite artifacts in {}",
            config.out_dir.display()
        )
    })?;

    println!("{summary}");

    Ok(ExitCode::SUCCESS)
}
