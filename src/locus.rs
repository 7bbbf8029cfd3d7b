//! Locus partitioner: single-pass grouping of the filtered, sorted stream
//! into independent genomic loci.
//!
//! A locus is a maximal set of isoforms on one reference/strand whose
//! footprints form a connected interval under pairwise overlap. The
//! partitioner exploits the sort order: once an incoming record starts past
//! the running maximum end of an open locus, that locus can never grow again
//! and is flushed. Memory stays bounded by the open loci, and a single pass
//! suffices.
//!
//! Sortedness is a hard precondition. A record starting before the previous
//! record on the same reference, or a reference reappearing after being
//! left, fails the run with [`CollapseError::UnsortedInput`] — silently
//! proceeding would corrupt grouping correctness.

use crate::error::CollapseError;
use crate::record::AlignedIsoform;
use crate::types::{HashSet, HashSetExt};

/// Records within this distance past an open locus's max end still join it.
const FLUSH_MARGIN: u32 = 0;

#[derive(Debug, Clone)]
pub struct Locus {
    pub reference_id: String,
    pub strand: char,
    pub isoforms: Vec<AlignedIsoform>,
    max_end: u32,
}

impl Locus {
    fn new(isoform: AlignedIsoform) -> Self {
        Self {
            reference_id: isoform.reference_id.clone(),
            strand: isoform.strand,
            max_end: isoform.end(),
            isoforms: vec![isoform],
        }
    }

    fn push(&mut self, isoform: AlignedIsoform) {
        self.max_end = self.max_end.max(isoform.end());
        self.isoforms.push(isoform);
    }

    /// True when `start` lies beyond every isoform in this locus, i.e. no
    /// later sorted record can still overlap it.
    fn closed_before(&self, start: u32) -> bool {
        start > self.max_end.saturating_add(FLUSH_MARGIN)
    }

    pub fn start(&self) -> u32 {
        self.isoforms.iter().map(|i| i.start()).min().unwrap_or(0)
    }

    pub fn end(&self) -> u32 {
        self.max_end
    }
}

/// Streaming partitioner. Owned exclusively by the single streaming pass;
/// finalized loci are moved out to workers with no further mutation.
pub struct LocusPartitioner {
    current_ref: Option<String>,
    seen_refs: HashSet<String>,
    last_start: u32,
    // At most one open locus per strand of the current reference.
    open: Vec<Locus>,
    record_num: u64,
}

impl LocusPartitioner {
    pub fn new() -> Self {
        Self {
            current_ref: None,
            seen_refs: HashSet::new(),
            last_start: 0,
            open: Vec::with_capacity(2),
            record_num: 0,
        }
    }

    /// Feed the next sorted record; returns any loci that became provably
    /// closed, in ascending (strand, start) order.
    pub fn push(&mut self, isoform: AlignedIsoform) -> Result<Vec<Locus>, CollapseError> {
        self.record_num += 1;
        let mut flushed = Vec::new();

        let same_ref = self.current_ref.as_deref() == Some(isoform.reference_id.as_str());
        if !same_ref {
            if self.seen_refs.contains(&isoform.reference_id) {
                return Err(self.unsorted(
                    &isoform,
                    format!("reference {} reappears after being left", isoform.reference_id),
                ));
            }
            flushed.append(&mut self.drain_open());
            if let Some(prev) = self.current_ref.take() {
                self.seen_refs.insert(prev);
            }
            self.current_ref = Some(isoform.reference_id.clone());
            self.last_start = 0;
        } else if isoform.start() < self.last_start {
            return Err(self.unsorted(
                &isoform,
                format!(
                    "start {} precedes the previous record's start {}",
                    isoform.start(),
                    self.last_start
                ),
            ));
        }
        self.last_start = isoform.start();

        // Close any open locus the new record has moved past, on either strand.
        let start = isoform.start();
        let mut still_open = Vec::with_capacity(2);
        for locus in self.open.drain(..) {
            if locus.closed_before(start) {
                flushed.push(locus);
            } else {
                still_open.push(locus);
            }
        }
        self.open = still_open;

        match self.open.iter_mut().find(|l| l.strand == isoform.strand) {
            Some(locus) => locus.push(isoform),
            None => self.open.push(Locus::new(isoform)),
        }

        flushed.sort_by_key(|l| (l.strand, l.start()));
        Ok(flushed)
    }

    /// Flush the remaining open loci at end of stream.
    pub fn finish(mut self) -> Vec<Locus> {
        self.drain_open()
    }

    fn drain_open(&mut self) -> Vec<Locus> {
        let mut loci: Vec<Locus> = self.open.drain(..).collect();
        loci.sort_by_key(|l| (l.strand, l.start()));
        loci
    }

    fn unsorted(&self, isoform: &AlignedIsoform, reason: String) -> CollapseError {
        CollapseError::UnsortedInput {
            record: self.record_num,
            reference: isoform.reference_id.clone(),
            reason,
        }
    }
}

impl Default for LocusPartitioner {
    fn default() -> Self {
        Self::new()
    }
}
