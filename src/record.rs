//! Alignment record model: turns the sorted SAM stream into per-isoform
//! exon-chain records on reference coordinates.
//!
//! The reader is forward-only and trusts the declared sort order; it never
//! re-sorts. Unparsable records fail the whole run with
//! [`CollapseError::MalformedInput`], since a corrupt alignment file
//! invalidates the partition-by-sort guarantees downstream. Multiple
//! alignment blocks for the same query name are independent records.

use crate::error::CollapseError;
use crate::naming::support_from_id;
use noodles::sam;
use sam::alignment::record::cigar::op::Kind as CigarKind;
use sam::alignment::record::data::field::Tag;
use sam::alignment::RecordBuf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One genomic exon interval, 1-based, half-open [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exon {
    pub start: u32,
    pub end: u32,
}

/// An intron boundary between two consecutive exons: `donor` is the exclusive
/// end of the upstream exon, `acceptor` the start of the downstream exon
/// (both in genomic order, independent of strand).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Junction {
    pub donor: u32,
    pub acceptor: u32,
}

/// One aligned transcript: an ordered exon chain on the reference plus the
/// alignment quality and upstream read-support metadata.
#[derive(Debug, Clone)]
pub struct AlignedIsoform {
    pub id: String,
    pub reference_id: String,
    pub strand: char,
    /// Sorted by start, non-overlapping, genomic order.
    pub exons: Vec<Exon>,
    /// Fraction of the query sequence aligned (0.0–1.0).
    pub coverage: f32,
    /// Fraction of aligned bases matching the reference (0.0–1.0).
    pub identity: f32,
    /// Query length in bases, clips included.
    pub length: u32,
    /// Supporting full-length reads, inherited from the isoform name.
    pub fl_reads: u32,
    /// Supporting non-full-length reads, inherited from the isoform name.
    pub nfl_reads: u32,
}

impl AlignedIsoform {
    /// Genomic footprint start (first exon start).
    pub fn start(&self) -> u32 {
        self.exons.first().map_or(0, |e| e.start)
    }

    /// Genomic footprint end (last exon end, exclusive).
    pub fn end(&self) -> u32 {
        self.exons.last().map_or(0, |e| e.end)
    }

    /// Used only for abundance weighting, never for structural grouping.
    pub fn is_full_length(&self) -> bool {
        self.fl_reads > 0
    }

    /// Internal junctions in genomic order.
    pub fn junctions(&self) -> Vec<Junction> {
        self.exons
            .windows(2)
            .map(|w| Junction { donor: w[0].end, acceptor: w[1].start })
            .collect()
    }
}

/// Pull-based reader over a sorted SAM alignment stream.
pub struct AlignmentReader<R> {
    inner: sam::io::Reader<R>,
    header: sam::Header,
    buf: RecordBuf,
    record_num: u64,
    /// Unmapped records skipped so far (reported in run statistics).
    pub skipped_unmapped: u64,
}

impl AlignmentReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CollapseError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> AlignmentReader<R> {
    pub fn new(reader: R) -> Result<Self, CollapseError> {
        let mut inner = sam::io::Reader::new(reader);
        let header = inner.read_header().map_err(|e| CollapseError::MalformedInput {
            record: 0,
            reason: format!("invalid SAM header: {e}"),
        })?;
        Ok(Self {
            inner,
            header,
            buf: RecordBuf::default(),
            record_num: 0,
            skipped_unmapped: 0,
        })
    }

    /// Read the next mapped isoform record, skipping unmapped records.
    /// Returns `None` at end of stream.
    pub fn next_isoform(&mut self) -> Option<Result<AlignedIsoform, CollapseError>> {
        loop {
            self.record_num += 1;
            match self.inner.read_record_buf(&self.header, &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(self.malformed(e.to_string()))),
            }

            if self.buf.flags().is_unmapped() {
                self.skipped_unmapped += 1;
                continue;
            }

            return Some(self.convert());
        }
    }

    fn malformed(&self, reason: String) -> CollapseError {
        CollapseError::MalformedInput { record: self.record_num, reason }
    }

    fn convert(&self) -> Result<AlignedIsoform, CollapseError> {
        let record = &self.buf;

        let id = match record.name() {
            Some(name) => name.to_string(),
            None => return Err(self.malformed("missing query name".into())),
        };

        let reference_id = record
            .reference_sequence_id()
            .and_then(|i| self.header.reference_sequences().get_index(i))
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| self.malformed("mapped record without a reference sequence".into()))?;

        let start = record
            .alignment_start()
            .map(|pos| pos.get() as u32)
            .ok_or_else(|| self.malformed("mapped record without an alignment start".into()))?;

        let stats = walk_cigar(start, record.cigar().as_ref().iter().map(|op| (op.kind(), op.len() as u32)));
        if stats.exons.is_empty() {
            return Err(self.malformed("alignment consumes no reference bases".into()));
        }

        let coverage = if stats.read_len > 0 {
            stats.aligned_query as f32 / stats.read_len as f32
        } else {
            0.0
        };
        let identity = match edit_distance(record) {
            Some(nm) if stats.aligned_len > 0 => {
                (1.0 - nm as f32 / stats.aligned_len as f32).clamp(0.0, 1.0)
            }
            // No NM tag: the aligner reported no mismatch count, assume perfect.
            _ => 1.0,
        };

        let strand = if record.flags().is_reverse_complemented() { '-' } else { '+' };
        let (fl_reads, nfl_reads) = support_from_id(&id);

        Ok(AlignedIsoform {
            id,
            reference_id,
            strand,
            exons: stats.exons,
            coverage,
            identity,
            length: stats.read_len,
            fl_reads,
            nfl_reads,
        })
    }
}

#[derive(Debug, Default)]
struct CigarStats {
    exons: Vec<Exon>,
    /// Query bases consumed by the full read (clips included).
    read_len: u32,
    /// Query bases inside the alignment proper (M/I/=/X).
    aligned_query: u32,
    /// Alignment columns (M/I/D/=/X), the denominator for identity.
    aligned_len: u32,
}

/// Walk a CIGAR, splitting exons at `N` (intron) operations.
///
/// Coordinates are 1-based, half-open [start, end).
fn walk_cigar(start: u32, ops: impl Iterator<Item = (CigarKind, u32)>) -> CigarStats {
    let mut stats = CigarStats::default();
    let mut ref_pos = start;
    let mut exon_start = ref_pos;

    for (kind, len) in ops {
        match kind {
            CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                ref_pos = ref_pos.saturating_add(len);
                stats.read_len += len;
                stats.aligned_query += len;
                stats.aligned_len += len;
            }
            CigarKind::Deletion => {
                ref_pos = ref_pos.saturating_add(len);
                stats.aligned_len += len;
            }
            CigarKind::Skip => {
                if ref_pos > exon_start {
                    stats.exons.push(Exon { start: exon_start, end: ref_pos });
                }
                ref_pos = ref_pos.saturating_add(len);
                exon_start = ref_pos;
            }
            CigarKind::Insertion => {
                stats.read_len += len;
                stats.aligned_query += len;
                stats.aligned_len += len;
            }
            CigarKind::SoftClip | CigarKind::HardClip => {
                stats.read_len += len;
            }
            CigarKind::Pad => {}
        }
    }

    if ref_pos > exon_start {
        stats.exons.push(Exon { start: exon_start, end: ref_pos });
    }

    stats
}

fn edit_distance(record: &RecordBuf) -> Option<u32> {
    let value = record.data().get(&Tag::EDIT_DISTANCE)?;
    value.as_int().and_then(|v| u32::try_from(v).ok())
}

// Convenience for tests and library callers that build isoforms directly.
impl AlignedIsoform {
    pub fn from_exons(
        id: &str,
        reference_id: &str,
        strand: char,
        exons: &[(u32, u32)],
    ) -> Self {
        let exons: Vec<Exon> = exons.iter().map(|&(start, end)| Exon { start, end }).collect();
        let length = exons.iter().map(|e| e.end - e.start).sum();
        let (fl_reads, nfl_reads) = support_from_id(id);
        Self {
            id: id.to_string(),
            reference_id: reference_id.to_string(),
            strand,
            exons,
            coverage: 1.0,
            identity: 1.0,
            length,
            fl_reads,
            nfl_reads,
        }
    }
}
