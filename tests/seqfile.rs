use isocollapse_rs::output::RepEntry;
use isocollapse_rs::seqfile::{detect, split_name, write_collapsed};
use isocollapse_rs::{CollapseError, SeqFormat};
use std::path::{Path, PathBuf};

#[test]
fn detect_classifies_by_suffix() {
    assert_eq!(detect(Path::new("isoforms.fasta")), SeqFormat::Fasta);
    assert_eq!(detect(Path::new("isoforms.fa")), SeqFormat::Fasta);
    assert_eq!(detect(Path::new("isoforms.fastq")), SeqFormat::Fastq);
    assert_eq!(detect(Path::new("isoforms.fq")), SeqFormat::Fastq);
    assert_eq!(detect(Path::new("isoforms.contigset.xml")), SeqFormat::ContigSet);
    assert_eq!(detect(Path::new("isoforms.bam")), SeqFormat::Unrecognized);
    assert_eq!(detect(Path::new("isoforms.xml")), SeqFormat::Unrecognized);
}

#[test]
fn split_name_strips_the_container_suffix() {
    let (prefix, format) = split_name(Path::new("out/sample.contigset.xml")).unwrap();
    assert_eq!(prefix, PathBuf::from("out/sample"));
    assert_eq!(format, SeqFormat::ContigSet);

    let (prefix, format) = split_name(Path::new("sample.fastq")).unwrap();
    assert_eq!(prefix, PathBuf::from("sample"));
    assert_eq!(format, SeqFormat::Fastq);
}

#[test]
fn split_name_strips_only_one_suffix_component() {
    let (prefix, format) = split_name(Path::new("x.fa.fa")).unwrap();
    assert_eq!(prefix, PathBuf::from("x.fa"));
    assert_eq!(format, SeqFormat::Fasta);

    let (prefix, _) = split_name(Path::new("reads.fa.fasta")).unwrap();
    assert_eq!(prefix, PathBuf::from("reads.fa"));

    let (prefix, _) = split_name(Path::new("reads.fq.fastq")).unwrap();
    assert_eq!(prefix, PathBuf::from("reads.fq"));
}

#[test]
fn split_name_rejects_unknown_suffixes() {
    let err = split_name(Path::new("sample.sam")).unwrap_err();
    assert!(matches!(err, CollapseError::UnrecognizedFileFormat(_)));
}

fn rep(pbid: &str, source_id: &str) -> RepEntry {
    RepEntry {
        pbid: pbid.to_string(),
        source_id: source_id.to_string(),
        reference_id: "chr1".to_string(),
        start: 100,
        end: 601,
        strand: '+',
        num_fl: 2,
        num_nfl: 0,
    }
}

#[test]
fn collapsed_fasta_renames_representatives() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("isoforms.fasta");
    std::fs::write(&input, ">c1/f2p0/8\nACGTACGT\n>c2/f1p0/4\nACGT\n").unwrap();

    let out = dir.path().join("collapsed.fasta");
    write_collapsed(&input, &out, &[rep("PB.1.1", "c1/f2p0/8")]).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, ">PB.1.1|chr1:100-600(+)|c1/f2p0/8\nACGTACGT\n");
}

#[test]
fn fastq_output_from_fasta_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("isoforms.fasta");
    std::fs::write(&input, ">c1/f2p0/8\nACGTACGT\n").unwrap();

    let out = dir.path().join("collapsed.fastq");
    let err = write_collapsed(&input, &out, &[rep("PB.1.1", "c1/f2p0/8")]).unwrap_err();
    assert!(matches!(err, CollapseError::OutputConversion(_)));
}

#[test]
fn fastq_output_carries_qualities_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("isoforms.fastq");
    std::fs::write(&input, "@c1/f2p0/8\nACGTACGT\n+\nIIIIIIII\n").unwrap();

    let out = dir.path().join("collapsed.fastq");
    write_collapsed(&input, &out, &[rep("PB.1.1", "c1/f2p0/8")]).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "@PB.1.1|chr1:100-600(+)|c1/f2p0/8\nACGTACGT\n+\nIIIIIIII\n");
}

#[test]
fn contigset_output_wraps_a_fasta_sibling() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("isoforms.fasta");
    std::fs::write(&input, ">c1/f2p0/8\nACGTACGT\n").unwrap();

    let out = dir.path().join("collapsed.contigset.xml");
    write_collapsed(&input, &out, &[rep("PB.1.1", "c1/f2p0/8")]).unwrap();

    let fasta = std::fs::read_to_string(dir.path().join("collapsed.fasta")).unwrap();
    assert!(fasta.starts_with(">PB.1.1|"));

    let xml = std::fs::read_to_string(&out).unwrap();
    assert!(xml.contains("ContigSet"));
    assert!(xml.contains("collapsed.fasta"));
}

#[test]
fn missing_representative_sequence_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("isoforms.fasta");
    std::fs::write(&input, ">c1/f2p0/8\nACGTACGT\n").unwrap();

    let out = dir.path().join("collapsed.fasta");
    let err = write_collapsed(&input, &out, &[rep("PB.1.1", "c9/f1p0/4")]).unwrap_err();
    assert!(matches!(err, CollapseError::OutputConversion(_)));
}
