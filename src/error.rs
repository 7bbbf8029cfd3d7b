use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a collapse run.
///
/// Structural and precondition violations are never recoverable: once the
/// sort order or a record parse breaks, any partially computed grouping is
/// untrustworthy and the run exits non-zero.
#[derive(Debug, Error)]
pub enum CollapseError {
    /// An alignment record could not be parsed. Aborts the run, since a
    /// corrupt alignment file invalidates the sortedness guarantees that
    /// locus partitioning depends on.
    #[error("malformed alignment record {record}: {reason}")]
    MalformedInput { record: u64, reason: String },

    /// The declared sort order (reference, then start coordinate) was
    /// violated. The partitioner fails fast instead of silently emitting
    /// corrupt loci.
    #[error(
        "unsorted input at record {record} on {reference}: {reason}; \
         input must be sorted by reference then start coordinate"
    )]
    UnsortedInput {
        record: u64,
        reference: String,
        reason: String,
    },

    /// A sequence file name does not follow the FASTA/FASTQ/ContigSet
    /// suffix convention.
    #[error("unrecognized sequence file format: {0} (expected .fasta/.fa, .fastq/.fq, or .contigset.xml)")]
    UnrecognizedFileFormat(PathBuf),

    /// The requested collapsed-isoform container format cannot be derived
    /// from the input sequences (e.g. FASTQ output from FASTA input).
    #[error("cannot produce collapsed isoform file: {0}")]
    OutputConversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable parse failure for a single cluster / isoform name.
///
/// Scoped to the one name being parsed; callers fall back to default
/// support counts rather than aborting the run.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid name {line:?}, expected {expected}")]
pub struct FormatError {
    pub line: String,
    pub expected: &'static str,
}
