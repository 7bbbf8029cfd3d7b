mod abundance;
mod cli;
mod collapse;
mod error;
mod filter;
mod locus;
mod naming;
mod output;
mod pipeline;
mod record;
mod seqfile;
mod types;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stats = pipeline::run(&args)?;
    tracing::info!(
        total_records = stats.total_records,
        unmapped_records = stats.unmapped_records,
        filtered_records = stats.filtered_records,
        loci = stats.loci,
        groups = stats.groups,
        collapsed_isoforms = stats.collapsed_isoforms,
        "isocollapse-rs: collapsing complete"
    );
    Ok(())
}
