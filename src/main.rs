use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use api_shim::extractor::StubExtractor;
use api_shim::jdk;
use api_shim::resolver::JmodResolver;

/// Extract a deterministic API stub archive from the running JDK.
#[derive(Parser, Debug)]
#[command(name = "api_shim")]
#[command(about = "Extract a deterministic API stub archive from the running JDK")]
struct Cli {
    /// Platform release the stub archive is generated for; must match the
    /// running JDK exactly
    target_version: u32,

    /// Path of the stub archive to write
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    if let Err(error) = real_main() {
        eprintln!("error: {error:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = jdk::detect_runtime().context("while locating the running JDK")?;
    let resolver = JmodResolver::new(runtime.jmods_dir());
    let extractor = StubExtractor::new(resolver);

    let stats = extractor
        .run(cli.target_version, runtime.major_version, &cli.output)
        .with_context(|| format!("extraction for platform {} failed", cli.target_version))?;

    info!("Extraction complete:");
    info!("- Modules processed: {}", stats.modules_processed);
    info!("- Candidate class files: {}", stats.candidate_files);
    info!("- Visible classes: {}", stats.visible_classes);
    info!("- Stubs written: {}", stats.stubs_written);
    Ok(())
}
