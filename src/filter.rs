//! Alignment filter: rejects low-quality alignments by coverage and identity
//! before any grouping happens.
//!
//! Filtering is stateless and order-preserving. Dropped isoforms contribute
//! to no group and to no downstream counts; they are not errors, only
//! filtered-out rows in the run statistics and read-stat table.

use crate::collapse::CollapseConfig;
use crate::record::AlignedIsoform;

pub fn keep(record: &AlignedIsoform, config: &CollapseConfig) -> bool {
    record.coverage >= config.min_aln_coverage && record.identity >= config.min_aln_identity
}
