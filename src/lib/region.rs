//! Region descriptors and region-list input.
//!
//! A region-list file holds one region per line in the samtools form
//! `contig:begin-end` (1-based inclusive begin) or a bare contig name for the
//! whole contig. Lines are forwarded to the scanner without validation here;
//! a malformed line degrades to a zero result at scan time.

use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::utils;

/// A parsed region descriptor: contig plus a 0-based half-open interval.
///
/// `end` is `None` for a bare contig name; the scanner resolves it against
/// the header's target length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub contig: String,
    pub begin: i64,
    pub end: Option<i64>,
}

impl RegionSpec {
    /// Parse one region-list line.
    ///
    /// `chr1:1,000-2,000` and `chr1:1000-2000` both map to the 0-based
    /// half-open interval `[999, 2000)` on `chr1`. Contig names containing
    /// `:` are handled by only treating the text after the last `:` as a
    /// coordinate range, falling back to a whole-contig query when it does
    /// not parse as one.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(anyhow!("Empty region"));
        }

        if let Some((contig, range)) = raw.rsplit_once(':') {
            if let Some((begin, end)) = parse_range(range) {
                if contig.is_empty() {
                    return Err(anyhow!("Missing contig in region '{}'", raw));
                }
                // 1-based inclusive begin to 0-based half-open.
                let begin = begin.saturating_sub(1);
                if begin > end {
                    return Err(anyhow!(
                        "Region '{}' has begin greater than end",
                        raw
                    ));
                }
                return Ok(Self {
                    contig: contig.to_string(),
                    begin,
                    end: Some(end),
                });
            }
        }

        Ok(Self {
            contig: raw.to_string(),
            begin: 0,
            end: None,
        })
    }
}

fn parse_range(range: &str) -> Option<(i64, i64)> {
    let (begin, end) = range.split_once('-')?;
    let begin = parse_coordinate(begin)?;
    let end = parse_coordinate(end)?;
    Some((begin, end))
}

/// Coordinates may carry digit-grouping commas, as accepted by htslib.
fn parse_coordinate(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    digits.parse::<i64>().ok().filter(|n| *n >= 0)
}

/// Read a region-list file into its lines, trimming line terminators.
///
/// Gzip-compressed lists are decompressed transparently based on the file
/// extension. Blank lines are kept so the output record stream stays aligned
/// with the input; they degrade to zero results at scan time.
pub fn read_region_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let reader: Box<dyn BufRead> = if utils::is_bgzipped(path) {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        lines.push(line.trim_end_matches('\r').to_string());
    }
    Ok(lines)
}
