//! # Depth Extraction
//!
//! Scans each region of a region-list file against an indexed BAM/CRAM and
//! writes one fixed-size binary record per region, in input order. With a
//! single thread, records stream out as each region finishes; with more
//! threads the regions are scanned as an ordered parallel batch first.

use anyhow::{Context, Result};
use cnvscan_lib::{
    output::{NullSink, RegionRecordWriter},
    read_filter::{CnvReadFilter, FlagPolicy},
    region,
    scan::{self, CnvScanner, ScanConfig},
    utils,
};
use log::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

/// Extract per-region read counts and depth as binary records.
#[derive(StructOpt)]
#[structopt(author, name = "depth")]
pub struct Depth {
    /// Input indexed BAM/CRAM to analyze.
    reads: PathBuf,

    /// Indexed reference fasta, set if using CRAM.
    #[structopt(long, short = "r")]
    ref_fasta: Option<PathBuf>,

    /// Region-list file, one `contig:begin-end` per line (.gz accepted).
    #[structopt(long, short = "R")]
    regions: PathBuf,

    /// Output path for the binary per-region records.
    #[structopt(long, short = "o")]
    output: PathBuf,

    /// Minimum MAPQ for a read to count toward depth.
    #[structopt(long, short = "q", default_value = "0")]
    min_mapq: u8,

    /// Divide each region's summed count by its interval length.
    #[structopt(long, short = "n")]
    normalize: bool,

    /// The number of threads to use. More than one scans regions as an
    /// ordered parallel batch instead of streaming.
    #[structopt(long, short = "t", default_value = "1")]
    threads: usize,
}

impl Depth {
    pub fn run(self) -> Result<()> {
        info!("Running cnvscan-depth on: {:?}", self.reads);
        let cpus = utils::determine_allowed_cpus(self.threads)?;

        let lines = region::read_region_lines(&self.regions)?;
        info!("Read {} regions from {:?}", lines.len(), self.regions);

        let filter = CnvReadFilter::new(FlagPolicy::cnv_baseline(), self.min_mapq);
        let config = ScanConfig {
            normalize_depth: self.normalize,
            ..ScanConfig::default()
        };

        let output = File::create(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        let mut writer = RegionRecordWriter::new(BufWriter::new(output));

        if cpus == 1 {
            let mut scanner =
                CnvScanner::open(&self.reads, self.ref_fasta.as_deref(), filter, config)?;
            for line in &lines {
                let result = scanner.scan_region(line, &mut NullSink)?;
                writer.write(&result)?;
            }
        } else {
            let results = scan::scan_regions_parallel(
                &self.reads,
                self.ref_fasta.as_deref(),
                &lines,
                filter,
                config,
                cpus,
            )?;
            for result in &results {
                writer.write(result)?;
            }
        }

        info!("Wrote {} region records to {:?}", lines.len(), self.output);
        Ok(())
    }
}
