//! Output sinks: binary region records and the soft-clip text stream.
//!
//! Region records use a fixed little-endian layout so a downstream
//! normalization stage can consume them without framing. Only `read_count`
//! and `depth` are populated by the scan; the remaining fields are reserved
//! for that later stage and written as zero.

use anyhow::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::cigar::SoftClip;

/// The per-region scan outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionResult {
    /// Number of accepted records overlapping the region.
    pub read_count: i32,
    /// Summed position-count depth, optionally normalized.
    pub depth: f32,
}

/// Size in bytes of one serialized [`RegionRecord`].
pub const REGION_RECORD_BYTES: usize = 36;

/// One fixed-size binary output record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionRecord {
    pub read_count: i32,
    pub depth: f32,
    /// Reserved for the reference read count of a later normalization stage.
    pub ref_read_count: i32,
    /// Reserved: median absolute deviation of reference depth.
    pub ref_mad: f64,
    /// Reserved: log2 ratio.
    pub l2r: f64,
    /// Reserved: normalized log2 ratio.
    pub nl2r: f64,
}

impl From<RegionResult> for RegionRecord {
    fn from(result: RegionResult) -> Self {
        Self {
            read_count: result.read_count,
            depth: result.depth,
            ..Self::default()
        }
    }
}

impl RegionRecord {
    /// Serialize as packed little-endian fields in declaration order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<LittleEndian>(self.read_count)?;
        writer.write_f32::<LittleEndian>(self.depth)?;
        writer.write_i32::<LittleEndian>(self.ref_read_count)?;
        writer.write_f64::<LittleEndian>(self.ref_mad)?;
        writer.write_f64::<LittleEndian>(self.l2r)?;
        writer.write_f64::<LittleEndian>(self.nl2r)?;
        Ok(())
    }

    /// Deserialize one record from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            read_count: reader.read_i32::<LittleEndian>()?,
            depth: reader.read_f32::<LittleEndian>()?,
            ref_read_count: reader.read_i32::<LittleEndian>()?,
            ref_mad: reader.read_f64::<LittleEndian>()?,
            l2r: reader.read_f64::<LittleEndian>()?,
            nl2r: reader.read_f64::<LittleEndian>()?,
        })
    }
}

/// Streams [`RegionResult`]s as binary records, flushing after each region so
/// already-written records survive a later fatal error.
pub struct RegionRecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RegionRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one region's record and flush.
    pub fn write(&mut self, result: &RegionResult) -> Result<()> {
        RegionRecord::from(*result).write_to(&mut self.inner)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Receives soft-clip events as a side channel of the region scan.
pub trait SoftClipSink {
    fn record_clip(&mut self, contig: &str, clip: &SoftClip) -> Result<()>;
}

/// Discards soft-clip events; used for depth-only scans.
pub struct NullSink;

impl SoftClipSink for NullSink {
    #[inline]
    fn record_clip(&mut self, _contig: &str, _clip: &SoftClip) -> Result<()> {
        Ok(())
    }
}

/// Writes each event as two text lines: `@contig:pos`, then the decoded bases
/// immediately followed by the Phred+33 quality characters.
pub struct TextClipWriter<W: Write> {
    inner: W,
}

impl<W: Write> TextClipWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write> SoftClipSink for TextClipWriter<W> {
    fn record_clip(&mut self, contig: &str, clip: &SoftClip) -> Result<()> {
        writeln!(self.inner, "@{}:{}", contig, clip.ref_pos)?;
        self.inner.write_all(&clip.seq)?;
        self.inner.write_all(&clip.qual)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn region_record_round_trips() {
        let record = RegionRecord {
            read_count: 42,
            depth: 1234.5,
            ref_read_count: 0,
            ref_mad: 0.0,
            l2r: 0.0,
            nl2r: 0.0,
        };

        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), REGION_RECORD_BYTES);

        let decoded = RegionRecord::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn reserved_fields_are_zero() {
        let record = RegionRecord::from(RegionResult {
            read_count: 3,
            depth: 211.0,
        });
        assert_eq!(record.ref_read_count, 0);
        assert_eq!(record.ref_mad, 0.0);
        assert_eq!(record.l2r, 0.0);
        assert_eq!(record.nl2r, 0.0);
    }

    #[test]
    fn writer_emits_consecutive_records() {
        let mut buf = Vec::new();
        {
            let mut writer = RegionRecordWriter::new(&mut buf);
            writer
                .write(&RegionResult {
                    read_count: 1,
                    depth: 10.0,
                })
                .unwrap();
            writer
                .write(&RegionResult {
                    read_count: 2,
                    depth: 20.0,
                })
                .unwrap();
        }

        assert_eq!(buf.len(), 2 * REGION_RECORD_BYTES);
        let mut cursor = Cursor::new(&buf);
        assert_eq!(RegionRecord::read_from(&mut cursor).unwrap().read_count, 1);
        assert_eq!(RegionRecord::read_from(&mut cursor).unwrap().read_count, 2);
    }

    #[test]
    fn clip_text_has_no_separator_between_bases_and_quals() {
        let clip = SoftClip {
            ref_pos: 510,
            seq: b"ACGTN".to_vec(),
            qual: vec![b'!', b'#', b'%', b'(', b'+'],
        };

        let mut buf = Vec::new();
        {
            let mut writer = TextClipWriter::new(&mut buf);
            writer.record_clip("chr1", &clip).unwrap();
        }
        assert_eq!(buf, b"@chr1:510\nACGTN!#%(+\n".to_vec());
    }
}
