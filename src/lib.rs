//! isocollapse-rs: collapse redundant aligned isoforms into representative
//! transcript models.
//!
//! Given a sorted stream of spliced alignments, the engine filters
//! low-quality records, partitions them into independent genomic loci in a
//! single pass, groups structurally equivalent exon chains under a fuzzy
//! junction tolerance, and emits one representative model per group with
//! merged junction coordinates and read-support counts.
//!
//! # Library usage
//!
//! ```no_run
//! use isocollapse_rs::{AlignedIsoform, CollapseConfig, LocusPartitioner};
//! use isocollapse_rs::collapse_locus;
//!
//! let config = CollapseConfig::default();
//! let mut partitioner = LocusPartitioner::new();
//!
//! // Records come from a sorted alignment stream (see `AlignmentReader`).
//! let iso = AlignedIsoform::from_exons("c1/f2p0/900", "chr1", '+',
//!                                      &[(100, 400), (700, 1000)]);
//! for locus in partitioner.push(iso)? {
//!     let groups = collapse_locus(&locus, &config);
//!     // one representative per group
//! }
//! # Ok::<(), isocollapse_rs::CollapseError>(())
//! ```

// Internal modules — not part of the public API.
pub(crate) mod cli;
pub(crate) mod pipeline;
pub(crate) mod types;

// Public modules — stable API surface.
pub mod abundance;
pub mod collapse;
pub mod filter;
pub mod error;
pub mod locus;
pub mod naming;
pub mod output;
pub mod record;
pub mod seqfile;

// Flat re-exports for the most commonly used public types.
pub use collapse::{collapse_locus, fuzzy_match, CollapseConfig, EquivalenceGroup};
pub use error::{CollapseError, FormatError};
pub use locus::{Locus, LocusPartitioner};
pub use naming::{ClusterName, SampleIsoformName};
pub use record::{AlignedIsoform, AlignmentReader, Exon, Junction};
pub use seqfile::SeqFormat;
