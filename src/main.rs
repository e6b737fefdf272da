use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use amesc::{MirrorCommand, PageMirror};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MirrorCommand::parse();
    init_tracing(args.verbose);
    ensure!(
        args.from <= args.to,
        "first page {} is after last page {}",
        args.from,
        args.to
    );

    let config = args.to_config();
    println!("🚀 Mirroring pages {}..={} of {}", args.from, args.to, config.source_root.blue());
    println!("📁 Output directory: {:?}", config.output_root);

    let mut mirror = PageMirror::new(&config).context("failed to set up mirror")?;

    let pages = args.pages();
    let progress = ProgressBar::new(u64::from(args.to - args.from) + 1);
    progress.set_style(ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);

    let mut failed = Vec::new();
    for page in pages {
        progress.set_message(format!("page {page}"));
        match mirror.process_page(page).await {
            Ok(report) => progress.println(format!(
                "✅ {} ({} images, {} stylesheets)",
                report.path.display(),
                report.images,
                report.stylesheets
            )),
            Err(e) => {
                progress.println(format!("{} {}", "❌".red(), e.to_string().red()));
                failed.push(page);
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    println!(
        "📊 Assets downloaded: {}",
        mirror.store().fetched_count().to_string().green()
    );

    if !failed.is_empty() {
        bail!("{} page(s) failed: {:?}", failed.len(), failed);
    }
    println!("✅ Mirroring completed successfully!");
    Ok(())
}
