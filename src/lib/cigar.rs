//! CIGAR traversal and soft-clip extraction.
//!
//! [`walk`] folds over a record's CIGAR operations, tracking how far the
//! alignment advances along the reference and the query, and collects a
//! [`SoftClip`] event for every soft-clip operation long enough to report.
//! Events are anchored at the reference position of the clip boundary, not at
//! the alignment start.

use rust_htslib::bam::record::{Cigar, Record};

/// Soft clips shorter than this many bases are not reported.
pub const DEFAULT_MIN_CLIP_LENGTH: u32 = 10;

/// A reported soft-clip event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftClip {
    /// Reference position of the clip boundary (0-based).
    pub ref_pos: i64,
    /// Decoded clipped bases, one of `A`/`C`/`G`/`T`/`N` each.
    pub seq: Vec<u8>,
    /// Clipped base qualities as Phred+33 characters.
    pub qual: Vec<u8>,
}

/// The outcome of walking one record's CIGAR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CigarWalk {
    /// Total reference bases consumed by the alignment.
    pub ref_span: i64,
    /// Soft-clip events in CIGAR order; zero, one, or two per record.
    pub clips: Vec<SoftClip>,
}

/// Does `op` advance the position in the reference sequence?
#[inline]
pub fn consumes_reference(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Del(_) | Cigar::RefSkip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Does `op` advance the position in the query sequence?
#[inline]
pub fn consumes_query(op: &Cigar) -> bool {
    matches!(
        op,
        Cigar::Match(_) | Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::Equal(_) | Cigar::Diff(_)
    )
}

/// Decode one 4-bit packed base code to a nucleotide character.
///
/// Codes other than the four unambiguous bases decode to `N`.
#[inline]
pub fn decode_base(code: u8) -> u8 {
    match code {
        1 => b'A',
        2 => b'C',
        4 => b'G',
        8 => b'T',
        _ => b'N',
    }
}

/// Walk `record`'s CIGAR, collecting soft-clip events of at least
/// `min_clip_length` bases (inclusive).
///
/// The walk is a fold over the operation list carrying `(ref_pos, query_pos)`
/// counters. A reported clip extracts the query sequence and qualities at
/// `[query_pos, query_pos + len)`; a clip below the threshold still advances
/// `query_pos` but emits nothing.
pub fn walk(record: &Record, min_clip_length: u32) -> CigarWalk {
    let seq = record.seq();
    let quals = record.qual();
    // Records without stored sequence cannot yield clip content.
    let extract = record.seq_len() > 0;
    let start = record.pos();

    let (ref_pos, _query_pos, clips) = record.cigar().iter().fold(
        (start, 0usize, Vec::new()),
        |(ref_pos, query_pos, mut clips), op| match op {
            Cigar::SoftClip(len) if *len >= min_clip_length && extract => {
                let len = *len as usize;
                let bases = (query_pos..query_pos + len)
                    .map(|i| decode_base(seq.encoded_base(i)))
                    .collect();
                let qual = quals[query_pos..query_pos + len]
                    .iter()
                    .map(|q| q + 33)
                    .collect();
                clips.push(SoftClip {
                    ref_pos,
                    seq: bases,
                    qual,
                });
                (ref_pos, query_pos, clips)
            }
            op => {
                let len = i64::from(op.len());
                let ref_pos = if consumes_reference(op) {
                    ref_pos + len
                } else {
                    ref_pos
                };
                let query_pos = if consumes_query(op) {
                    query_pos + op.len() as usize
                } else {
                    query_pos
                };
                (ref_pos, query_pos, clips)
            }
        },
    );

    CigarWalk {
        ref_span: ref_pos - start,
        clips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::CigarString;

    fn make_record(pos: i64, cigar: &[Cigar], seq: &[u8], qual: &[u8]) -> Record {
        let mut record = Record::new();
        record.set(b"read1", Some(&CigarString(cigar.to_vec())), seq, qual);
        record.set_pos(pos);
        record
    }

    fn bases(n: usize) -> Vec<u8> {
        b"ACGT".iter().copied().cycle().take(n).collect()
    }

    fn quals(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 40) as u8).collect()
    }

    #[test]
    fn trailing_clip_is_anchored_at_clip_boundary() {
        let seq = bases(25);
        let qual = quals(25);
        let record = make_record(
            500,
            &[Cigar::Match(10), Cigar::SoftClip(15)],
            &seq,
            &qual,
        );

        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        assert_eq!(walked.ref_span, 10);
        assert_eq!(walked.clips.len(), 1);

        let clip = &walked.clips[0];
        assert_eq!(clip.ref_pos, 510);
        assert_eq!(clip.seq, seq[10..25].to_vec());
        let expected_qual: Vec<u8> = qual[10..25].iter().map(|q| q + 33).collect();
        assert_eq!(clip.qual, expected_qual);
    }

    #[test]
    fn leading_clip_is_anchored_at_alignment_start() {
        let seq = bases(30);
        let qual = quals(30);
        let record = make_record(
            1000,
            &[Cigar::SoftClip(12), Cigar::Match(18)],
            &seq,
            &qual,
        );

        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        assert_eq!(walked.clips.len(), 1);
        assert_eq!(walked.clips[0].ref_pos, 1000);
        assert_eq!(walked.clips[0].seq, seq[0..12].to_vec());
    }

    #[test]
    fn threshold_is_inclusive() {
        let seq = bases(20);
        let qual = quals(20);
        let at_threshold = make_record(
            100,
            &[Cigar::SoftClip(10), Cigar::Match(10)],
            &seq,
            &qual,
        );
        assert_eq!(walk(&at_threshold, 10).clips.len(), 1);

        let seq = bases(19);
        let qual = quals(19);
        let below = make_record(100, &[Cigar::SoftClip(9), Cigar::Match(10)], &seq, &qual);
        assert_eq!(walk(&below, 10).clips.len(), 0);
    }

    #[test]
    fn short_clip_advances_query_position() {
        // 5S is unreported but must shift the offsets of the 12S content.
        let seq = bases(27);
        let qual = quals(27);
        let record = make_record(
            200,
            &[Cigar::SoftClip(5), Cigar::Match(10), Cigar::SoftClip(12)],
            &seq,
            &qual,
        );

        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        assert_eq!(walked.clips.len(), 1);
        assert_eq!(walked.clips[0].ref_pos, 210);
        assert_eq!(walked.clips[0].seq, seq[15..27].to_vec());
    }

    #[test]
    fn both_ends_report_independent_events() {
        let seq = bases(43);
        let qual = quals(43);
        let record = make_record(
            300,
            &[Cigar::SoftClip(12), Cigar::Match(20), Cigar::SoftClip(11)],
            &seq,
            &qual,
        );

        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        assert_eq!(walked.clips.len(), 2);
        assert_eq!(walked.clips[0].ref_pos, 300);
        assert_eq!(walked.clips[1].ref_pos, 320);
    }

    #[test]
    fn insertions_and_deletions_track_coordinates() {
        // 10M 2I 5D 10M 15S: ref span 10 + 5 + 10, clip content after 22 query bases.
        let seq = bases(37);
        let qual = quals(37);
        let record = make_record(
            700,
            &[
                Cigar::Match(10),
                Cigar::Ins(2),
                Cigar::Del(5),
                Cigar::Match(10),
                Cigar::SoftClip(15),
            ],
            &seq,
            &qual,
        );

        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        assert_eq!(walked.ref_span, 25);
        assert_eq!(walked.clips.len(), 1);
        assert_eq!(walked.clips[0].ref_pos, 725);
        assert_eq!(walked.clips[0].seq, seq[22..37].to_vec());
    }

    #[test]
    fn decoded_bases_round_trip_packed_sequence() {
        let seq = b"ACGTNACGTNACGTNACGTN";
        let qual = quals(20);
        let record = make_record(
            400,
            &[Cigar::Match(5), Cigar::SoftClip(15)],
            seq,
            &qual,
        );

        // Decoding the raw 4-bit codes must reproduce the reported characters.
        let raw = record.seq();
        let walked = walk(&record, DEFAULT_MIN_CLIP_LENGTH);
        let clip = &walked.clips[0];
        for (offset, base) in clip.seq.iter().enumerate() {
            assert_eq!(*base, decode_base(raw.encoded_base(5 + offset)));
        }
        assert_eq!(clip.seq, seq[5..20].to_vec());
    }

    #[test]
    fn unknown_codes_decode_to_n() {
        assert_eq!(decode_base(1), b'A');
        assert_eq!(decode_base(2), b'C');
        assert_eq!(decode_base(4), b'G');
        assert_eq!(decode_base(8), b'T');
        for code in [0u8, 3, 5, 6, 7, 9, 10, 11, 12, 13, 14, 15] {
            assert_eq!(decode_base(code), b'N');
        }
    }
}
