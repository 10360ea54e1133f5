//! CNVSCAN - Copy Number Variant evidence extraction
//!
//! CNVSCAN extracts the raw evidence a downstream CNV caller consumes from
//! indexed BAM/CRAM files: per-region read counts with a depth statistic,
//! and soft-clipped read segments at clip boundaries.
//!
//! # Tools
//!
//! - `depth`: scan a region list and write one binary record per region
//! - `softclips`: scan a region list and stream soft-clip evidence as text
//!
//! # Usage
//!
//! ```bash
//! # Per-region read counts and depth, written as binary records
//! cnvscan depth input.bam --regions regions.txt --output counts.bin
//!
//! # Soft-clipped segments for the same regions, to stdout
//! cnvscan softclips input.bam --regions regions.txt > clips.txt
//! ```
//!
//! For more detailed usage information, see the documentation for each
//! subcommand.

extern crate cnvscan_lib;
pub mod commands;
use anyhow::Result;
use cnvscan_lib::utils;
use env_logger::Env;
use log::*;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Commands for extracting CNV evidence with CNVSCAN
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Extract per-region read counts and depth as binary records
    Depth(commands::Depth),
    /// Report soft-clipped segments for reads in the given regions
    Softclips(commands::Softclips),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Depth(args) => args.run()?,
            Subcommand::Softclips(args) => args.run()?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if utils::is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{}", err);
        std::process::exit(1);
    }
    Ok(())
}
