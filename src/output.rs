//! Output emitter: collapsed GFF, group membership, abundance and read-stat
//! tables.
//!
//! Loci are written whole: each locus's rows are formatted into memory and
//! flushed in one write per file, so an aborted run never leaves a
//! partially written locus behind. The writer is the single contended
//! resource in the pipeline and enforces the ascending locus output order.

use crate::collapse::EquivalenceGroup;
use crate::error::CollapseError;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const GFF_SOURCE: &str = "isocollapse";

/// One representative kept for optional sequence materialization.
#[derive(Debug, Clone)]
pub struct RepEntry {
    pub pbid: String,
    pub source_id: String,
    pub reference_id: String,
    pub start: u32,
    pub end: u32,
    pub strand: char,
    pub num_fl: u32,
    pub num_nfl: u32,
}

impl RepEntry {
    /// Full output sequence id, e.g.
    /// `PB.3.1|chr1:1000-2000(+)|i1_HQ_sample|c12/f2p4/1538`.
    pub fn seq_id(&self) -> String {
        format!(
            "{}|{}:{}-{}({})|{}",
            self.pbid,
            self.reference_id,
            self.start,
            self.end.saturating_sub(1),
            self.strand,
            self.source_id
        )
    }
}

pub struct OutputWriter {
    gff: BufWriter<File>,
    group: BufWriter<File>,
    abundance: BufWriter<File>,
    read_stat: BufWriter<File>,
    rep_entries: Vec<RepEntry>,
    gene_num: u64,
    // Explicit parameter for multi-sample runs, never ambient state.
    sample_prefix: Option<String>,
}

impl OutputWriter {
    pub fn create(prefix: &str, sample_prefix: Option<&str>) -> Result<Self, CollapseError> {
        let open = |suffix: &str| -> Result<BufWriter<File>, CollapseError> {
            let path = PathBuf::from(format!("{prefix}.{suffix}"));
            Ok(BufWriter::new(File::create(path)?))
        };

        let gff = open("gff")?;
        let group = open("group.txt")?;
        let mut abundance = open("abundance.txt")?;
        let mut read_stat = open("read_stat.txt")?;

        writeln!(abundance, "#")?;
        writeln!(abundance, "# -----------------")?;
        writeln!(abundance, "# Field explanation")?;
        writeln!(abundance, "# -----------------")?;
        writeln!(abundance, "# count_fl: Number of associated full-length reads")?;
        writeln!(abundance, "# count_nfl: Number of associated non-full-length reads")?;
        writeln!(abundance, "#")?;
        writeln!(abundance, "pbid\tcount_fl\tcount_nfl")?;

        writeln!(read_stat, "id\tlength\tis_fl\tstat\tpbid")?;

        Ok(Self {
            gff,
            group,
            abundance,
            read_stat,
            rep_entries: Vec::new(),
            gene_num: 0,
            sample_prefix: sample_prefix.map(str::to_string),
        })
    }

    fn pbid(&self, isoform_num: usize) -> String {
        match &self.sample_prefix {
            Some(sample) => format!("{}|PB.{}.{}", sample, self.gene_num, isoform_num),
            None => format!("PB.{}.{}", self.gene_num, isoform_num),
        }
    }

    /// Write one completed locus's groups atomically, in group order.
    pub fn write_locus(&mut self, groups: &[EquivalenceGroup]) -> Result<(), CollapseError> {
        if groups.is_empty() {
            return Ok(());
        }
        self.gene_num += 1;

        let mut gff_buf = String::new();
        let mut group_buf = String::new();
        let mut abundance_buf = String::new();
        let mut read_stat_buf = String::new();

        for (i, group) in groups.iter().enumerate() {
            let rep = &group.representative;
            let pbid = self.pbid(i + 1);
            let gene_id = format!("PB.{}", self.gene_num);

            // GFF is 1-based inclusive; exons are stored half-open.
            let _ = writeln!(
                gff_buf,
                "{}\t{}\ttranscript\t{}\t{}\t.\t{}\t.\tgene_id \"{}\"; transcript_id \"{}\";",
                rep.reference_id,
                GFF_SOURCE,
                rep.start(),
                rep.end().saturating_sub(1),
                rep.strand,
                gene_id,
                pbid
            );
            for exon in &rep.exons {
                let _ = writeln!(
                    gff_buf,
                    "{}\t{}\texon\t{}\t{}\t.\t{}\t.\tgene_id \"{}\"; transcript_id \"{}\";",
                    rep.reference_id,
                    GFF_SOURCE,
                    exon.start,
                    exon.end.saturating_sub(1),
                    rep.strand,
                    gene_id,
                    pbid
                );
            }

            let member_ids: Vec<&str> = group.members.iter().map(|m| m.id.as_str()).collect();
            let _ = writeln!(group_buf, "{}\t{}", pbid, member_ids.join(","));

            let _ = writeln!(abundance_buf, "{}\t{}\t{}", pbid, group.num_fl, group.num_nfl);

            for member in &group.members {
                let _ = writeln!(
                    read_stat_buf,
                    "{}\t{}\t{}\tunique\t{}",
                    member.id,
                    member.length,
                    if member.is_full_length() { "Y" } else { "N" },
                    pbid
                );
            }

            self.rep_entries.push(RepEntry {
                pbid,
                source_id: rep.id.clone(),
                reference_id: rep.reference_id.clone(),
                start: rep.start(),
                end: rep.end(),
                strand: rep.strand,
                num_fl: group.num_fl,
                num_nfl: group.num_nfl,
            });
        }

        self.gff.write_all(gff_buf.as_bytes())?;
        self.group.write_all(group_buf.as_bytes())?;
        self.abundance.write_all(abundance_buf.as_bytes())?;
        self.read_stat.write_all(read_stat_buf.as_bytes())?;
        Ok(())
    }

    /// Record an alignment dropped by the coverage/identity filter.
    pub fn write_filtered(
        &mut self,
        id: &str,
        length: u32,
        is_full_length: bool,
    ) -> Result<(), CollapseError> {
        writeln!(
            self.read_stat,
            "{}\t{}\t{}\tfiltered\tNA",
            id,
            length,
            if is_full_length { "Y" } else { "N" }
        )?;
        Ok(())
    }

    /// Flush all streams and hand back the representative index for the
    /// optional sequence output.
    pub fn finish(mut self) -> Result<Vec<RepEntry>, CollapseError> {
        self.gff.flush()?;
        self.group.flush()?;
        self.abundance.flush()?;
        self.read_stat.flush()?;
        Ok(self.rep_entries)
    }
}
