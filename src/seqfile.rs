//! Sequence file conventions: suffix-based format detection and optional
//! materialization of the collapsed representative sequences.
//!
//! Format classification is a pure function over the filename so it can be
//! tested without touching the filesystem; unrecognized suffixes surface as
//! a variant rather than an exception-shaped control flow.

use crate::error::CollapseError;
use crate::output::RepEntry;
use crate::types::{HashMap, HashMapExt};
use needletail::parse_fastx_file;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqFormat {
    Fasta,
    Fastq,
    ContigSet,
    Unrecognized,
}

/// Classify a sequence file by its name alone.
pub fn detect(path: &Path) -> SeqFormat {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.ends_with(".contigset.xml") {
        SeqFormat::ContigSet
    } else if name.ends_with(".fasta") || name.ends_with(".fa") {
        SeqFormat::Fasta
    } else if name.ends_with(".fastq") || name.ends_with(".fq") {
        SeqFormat::Fastq
    } else {
        SeqFormat::Unrecognized
    }
}

/// Split a sequence file name into (prefix, format); the ContigSet suffix
/// spans two dot components, all others one.
pub fn split_name(path: &Path) -> Result<(PathBuf, SeqFormat), CollapseError> {
    let format = detect(path);
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    // Strip exactly one suffix component so stacked extensions survive in
    // the prefix (`x.fa.fa` → `x.fa`).
    let stem = match format {
        SeqFormat::ContigSet => name.strip_suffix(".contigset.xml").unwrap_or(name),
        SeqFormat::Fasta => name
            .strip_suffix(".fasta")
            .or_else(|| name.strip_suffix(".fa"))
            .unwrap_or(name),
        SeqFormat::Fastq => name
            .strip_suffix(".fastq")
            .or_else(|| name.strip_suffix(".fq"))
            .unwrap_or(name),
        SeqFormat::Unrecognized => {
            return Err(CollapseError::UnrecognizedFileFormat(path.to_path_buf()))
        }
    };
    let prefix = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(stem),
        _ => PathBuf::from(stem),
    };
    Ok((prefix, format))
}

struct SeqRecord {
    seq: Vec<u8>,
    qual: Option<Vec<u8>>,
}

/// In-memory isoform sequences keyed by record id.
struct SeqDb {
    records: HashMap<String, SeqRecord>,
    has_qualities: bool,
}

impl SeqDb {
    fn load(path: &Path) -> Result<Self, CollapseError> {
        // A ContigSet container wraps a FASTA sibling sharing its prefix.
        let read_path = match split_name(path)? {
            (prefix, SeqFormat::ContigSet) => PathBuf::from(format!("{}.fasta", prefix.display())),
            _ => path.to_path_buf(),
        };

        let mut reader = parse_fastx_file(&read_path).map_err(|e| {
            CollapseError::OutputConversion(format!(
                "failed to open isoform sequences {}: {e}",
                read_path.display()
            ))
        })?;

        let mut records = HashMap::new();
        let mut has_qualities = true;
        while let Some(result) = reader.next() {
            let record = result.map_err(|e| {
                CollapseError::OutputConversion(format!("failed to parse isoform sequence: {e}"))
            })?;
            // Key by the first header token; alignments carry no description.
            let header = std::str::from_utf8(record.id()).unwrap_or("");
            let id = header.split_whitespace().next().unwrap_or("").to_string();
            let qual = record.qual().map(|q| q.to_vec());
            has_qualities &= qual.is_some();
            records.insert(id, SeqRecord { seq: record.seq().to_vec(), qual });
        }

        Ok(Self { records, has_qualities })
    }

    fn get(&self, id: &str) -> Option<&SeqRecord> {
        self.records.get(id)
    }
}

/// Materialize the collapsed representative sequences into `out_path`,
/// using the container convention requested by its suffix.
pub fn write_collapsed(
    input_isoforms: &Path,
    out_path: &Path,
    reps: &[RepEntry],
) -> Result<(), CollapseError> {
    let (out_prefix, out_format) = split_name(out_path)?;
    let db = SeqDb::load(input_isoforms)?;

    match out_format {
        SeqFormat::Fasta => write_fasta(out_path, &db, reps),
        SeqFormat::Fastq => {
            if !db.has_qualities {
                return Err(CollapseError::OutputConversion(format!(
                    "FASTQ output {} requires FASTQ input with qualities",
                    out_path.display()
                )));
            }
            write_fastq(out_path, &db, reps)
        }
        SeqFormat::ContigSet => {
            let fasta_path = PathBuf::from(format!("{}.fasta", out_prefix.display()));
            write_fasta(&fasta_path, &db, reps)?;
            write_contigset(out_path, &fasta_path, reps.len())
        }
        SeqFormat::Unrecognized => {
            Err(CollapseError::UnrecognizedFileFormat(out_path.to_path_buf()))
        }
    }
}

fn lookup<'a>(db: &'a SeqDb, rep: &RepEntry) -> Result<&'a SeqRecord, CollapseError> {
    db.get(&rep.source_id).ok_or_else(|| {
        CollapseError::OutputConversion(format!(
            "representative {} not present in the input isoform sequences",
            rep.source_id
        ))
    })
}

fn write_fasta(path: &Path, db: &SeqDb, reps: &[RepEntry]) -> Result<(), CollapseError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for rep in reps {
        let record = lookup(db, rep)?;
        writeln!(writer, ">{}", rep.seq_id())?;
        writer.write_all(&record.seq)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_fastq(path: &Path, db: &SeqDb, reps: &[RepEntry]) -> Result<(), CollapseError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for rep in reps {
        let record = lookup(db, rep)?;
        let qual = record.qual.as_ref().ok_or_else(|| {
            CollapseError::OutputConversion(format!(
                "no qualities for representative {}",
                rep.source_id
            ))
        })?;
        writeln!(writer, "@{}", rep.seq_id())?;
        writer.write_all(&record.seq)?;
        writeln!(writer, "\n+")?;
        writer.write_all(qual)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Minimal ContigSet dataset wrapper around an already written FASTA.
fn write_contigset(path: &Path, fasta: &Path, num_records: usize) -> Result<(), CollapseError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
    writeln!(
        writer,
        r#"<pbds:ContigSet xmlns:pbbase="http://pacificbiosciences.com/PacBioBaseDataModel.xsd" xmlns:pbds="http://pacificbiosciences.com/PacBioDatasets.xsd" MetaType="PacBio.DataSet.ContigSet" Name="Collapsed isoforms" NumRecords="{num_records}">"#
    )?;
    writeln!(writer, "  <pbbase:ExternalResources>")?;
    writeln!(
        writer,
        r#"    <pbbase:ExternalResource MetaType="PacBio.ContigFile.ContigFastaFile" ResourceId="{}"/>"#,
        fasta.display()
    )?;
    writeln!(writer, "  </pbbase:ExternalResources>")?;
    writeln!(writer, "</pbds:ContigSet>")?;
    writer.flush()?;
    Ok(())
}
