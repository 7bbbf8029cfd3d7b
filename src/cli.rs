use crate::collapse::CollapseConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "isocollapse-rs",
    about = "Collapse redundant aligned isoforms into representative transcripts, \
             merging merge-able fuzzy junctions",
    version
)]
pub struct Args {
    /// Input uncollapsed isoforms in a FASTA, FASTQ or ContigSet file
    pub input_isoforms: PathBuf,

    /// Input SORTED SAM file mapping uncollapsed isoforms to the reference genome
    pub alignment_sam: PathBuf,

    /// Output prefix; writes <prefix>.gff|.group.txt|.abundance.txt|.read_stat.txt
    pub output_prefix: String,

    /// Min query coverage to analyze an alignment
    #[arg(short = 'c', long = "min_coverage", default_value_t = 0.99)]
    pub min_aln_coverage: f32,

    /// Min identity to analyze an alignment
    #[arg(short = 'i', long = "min_identity", default_value_t = 0.95)]
    pub min_aln_identity: f32,

    /// Max edit distance between merge-able fuzzy junctions
    #[arg(long, default_value_t = 5)]
    pub max_fuzzy_junction: u32,

    /// Minimum number of supportive FLNC reads; only meaningful when the
    /// input is aligned FLNC reads, otherwise the result is undefined
    #[arg(long = "flnc_coverage", default_value_t = 1)]
    pub min_flnc_coverage: u32,

    /// Collapse shorter 5' transcripts into isoforms with one extra 5' exon
    #[arg(long = "merge-5-shorter")]
    pub allow_extra_5exon: bool,

    /// Never merge transcripts with differing 5' exon structure
    #[arg(long = "skip_5_exon_alt", hide = true)]
    pub skip_5_exon_alt: bool,

    /// Output collapsed isoforms to a FASTA, FASTQ or ContigSet file
    #[arg(long = "collapsed_isoforms", value_name = "FILE")]
    pub collapsed_isoforms: Option<PathBuf>,

    /// Sample prefix for isoform accessions in multi-sample runs
    #[arg(long = "sample_prefix", value_name = "PREFIX")]
    pub sample_prefix: Option<String>,

    /// Number of threads (CPUs) to use
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    pub threads: u8,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    pub fn collapse_config(&self) -> CollapseConfig {
        CollapseConfig {
            min_aln_coverage: self.min_aln_coverage,
            min_aln_identity: self.min_aln_identity,
            max_fuzzy_junction: self.max_fuzzy_junction,
            min_flnc_coverage: self.min_flnc_coverage,
            allow_extra_5exon: self.allow_extra_5exon,
            skip_5_exon_alt: self.skip_5_exon_alt,
        }
    }
}
