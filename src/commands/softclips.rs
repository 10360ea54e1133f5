//! # Soft-Clip Reporting
//!
//! Scans each region of a region-list file and streams soft-clipped read
//! segments to standard output. Every event is two lines: `@contig:pos`,
//! then the clipped bases immediately followed by their Phred+33 quality
//! characters.

use anyhow::Result;
use cnvscan_lib::{
    cigar::DEFAULT_MIN_CLIP_LENGTH,
    output::TextClipWriter,
    read_filter::{CnvReadFilter, FlagPolicy},
    region,
    scan::{CnvScanner, ScanConfig},
};
use grep_cli::stdout;
use lazy_static::lazy_static;
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;
use termcolor::ColorChoice;

lazy_static! {
    /// DEFAULT_MIN_CLIP_LENGTH as a str for structopt.
    static ref MIN_CLIP_LENGTH_STR: String = DEFAULT_MIN_CLIP_LENGTH.to_string();
}

/// Report soft-clipped segments for reads in the given regions.
#[derive(StructOpt)]
#[structopt(author, name = "softclips")]
pub struct Softclips {
    /// Input indexed BAM/CRAM to analyze.
    reads: PathBuf,

    /// Indexed reference fasta, set if using CRAM.
    #[structopt(long, short = "r")]
    ref_fasta: Option<PathBuf>,

    /// Region-list file, one `contig:begin-end` per line (.gz accepted).
    #[structopt(long, short = "R")]
    regions: PathBuf,

    /// Minimum soft-clip length to report (inclusive).
    #[structopt(long, short = "l", default_value = MIN_CLIP_LENGTH_STR.as_str())]
    min_clip_length: u32,

    /// Minimum MAPQ for a read to be considered.
    #[structopt(long, short = "q", default_value = "0")]
    min_mapq: u8,
}

impl Softclips {
    pub fn run(self) -> Result<()> {
        info!("Running cnvscan-softclips on: {:?}", self.reads);

        let lines = region::read_region_lines(&self.regions)?;
        info!("Read {} regions from {:?}", lines.len(), self.regions);

        let filter = CnvReadFilter::new(FlagPolicy::cnv_baseline(), self.min_mapq);
        let config = ScanConfig {
            min_clip_length: self.min_clip_length,
            ..ScanConfig::default()
        };
        let mut scanner =
            CnvScanner::open(&self.reads, self.ref_fasta.as_deref(), filter, config)?;

        let mut sink = TextClipWriter::new(stdout(ColorChoice::Never));
        for line in &lines {
            scanner.scan_region(line, &mut sink)?;
        }
        sink.flush()?;
        Ok(())
    }
}
