//! Scenario tests for the fuzzy exon-chain matcher and per-locus collapsing.
//!
//! Loci are built through the partitioner so the tests also exercise the
//! locus invariant (isoforms in different loci never overlap).

use isocollapse_rs::{
    collapse_locus, fuzzy_match, AlignedIsoform, CollapseConfig, EquivalenceGroup, Locus,
    LocusPartitioner,
};

fn iso(id: &str, strand: char, exons: &[(u32, u32)]) -> AlignedIsoform {
    AlignedIsoform::from_exons(id, "chr1", strand, exons)
}

/// Run a set of overlapping isoforms through the partitioner as one locus.
fn one_locus(isoforms: Vec<AlignedIsoform>) -> Locus {
    let mut partitioner = LocusPartitioner::new();
    let mut loci = Vec::new();
    for isoform in isoforms {
        loci.extend(partitioner.push(isoform).expect("sorted input"));
    }
    loci.extend(partitioner.finish());
    assert_eq!(loci.len(), 1, "test isoforms must form a single locus");
    loci.into_iter().next().unwrap()
}

#[test]
fn scenario_1_junction_within_tolerance_collapses() {
    // Identical 3-exon structure, first junction donor differing by 3bp.
    let a = iso("c1/f2p0/300", '+', &[(100, 200), (300, 400), (500, 600)]);
    let b = iso("c2/f1p0/300", '+', &[(100, 203), (300, 400), (500, 600)]);

    let groups = collapse_locus(&one_locus(vec![a, b]), &CollapseConfig::default());
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.members.len(), 2);

    // Canonical junction comes from the better-supported member (f2 > f1).
    assert_eq!(group.representative.id, "c1/f2p0/300");
    assert_eq!(group.representative.exons[0].end, 200);
}

#[test]
fn scenario_1_canonical_junction_follows_support() {
    // Same structure, but now the 3bp-shifted isoform has more FL support:
    // its junction becomes the canonical coordinate.
    let a = iso("c1/f1p0/300", '+', &[(100, 200), (300, 400), (500, 600)]);
    let b = iso("c2/f4p0/300", '+', &[(100, 203), (300, 400), (500, 600)]);

    let groups = collapse_locus(&one_locus(vec![a, b]), &CollapseConfig::default());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].representative.id, "c2/f4p0/300");
    assert_eq!(groups[0].representative.exons[0].end, 203);
}

#[test]
fn scenario_2_junction_past_tolerance_stays_separate() {
    let a = iso("c1/f2p0/300", '+', &[(100, 200), (300, 400), (500, 600)]);
    let b = iso("c2/f1p0/300", '+', &[(100, 208), (300, 400), (500, 600)]);

    let groups = collapse_locus(&one_locus(vec![a, b]), &CollapseConfig::default());
    assert_eq!(groups.len(), 2);
}

#[test]
fn scenario_3_extra_5_exon_merges_when_allowed() {
    let config = CollapseConfig { allow_extra_5exon: true, ..CollapseConfig::default() };

    let a = iso("c1/f1p0/200", '+', &[(300, 400), (500, 600)]);
    let b = iso("c2/f1p0/300", '+', &[(100, 150), (250, 400), (500, 600)]);

    // The partitioner consumes records in start order: b starts first.
    let groups = collapse_locus(&one_locus(vec![b.clone(), a.clone()]), &config);
    assert_eq!(groups.len(), 1);
    // Representative is the longer isoform (equal FL support).
    assert_eq!(groups[0].representative.id, "c2/f1p0/300");

    // Without the policy the differing exon counts never match.
    assert!(!fuzzy_match(&a, &b, &CollapseConfig::default()));
}

#[test]
fn scenario_4_skip_5_exon_alt_takes_precedence() {
    let config = CollapseConfig {
        allow_extra_5exon: true,
        skip_5_exon_alt: true,
        ..CollapseConfig::default()
    };

    let a = iso("c1/f1p0/200", '+', &[(300, 400), (500, 600)]);
    let b = iso("c2/f1p0/300", '+', &[(100, 150), (250, 400), (500, 600)]);

    let groups = collapse_locus(&one_locus(vec![b, a]), &config);
    assert_eq!(groups.len(), 2);
}

#[test]
fn extra_5_exon_on_reverse_strand() {
    // On '-', the 5' end is the genomic right: the extra exon sits rightmost
    // and the shared 3' boundary is the genomic start.
    let config = CollapseConfig { allow_extra_5exon: true, ..CollapseConfig::default() };

    let a = iso("c1/f1p0/200", '-', &[(100, 200), (300, 400)]);
    let b = iso("c2/f1p0/250", '-', &[(100, 200), (300, 400), (500, 550)]);
    assert!(fuzzy_match(&a, &b, &config));

    // An extra exon at the genomic left is a 3' difference on '-': no merge.
    let c = iso("c3/f1p0/250", '-', &[(10, 50), (100, 200), (300, 400)]);
    assert!(!fuzzy_match(&a, &c, &config));
}

#[test]
fn transitive_chain_groups_non_adjacent_members() {
    // A~B and B~C each within the 5bp tolerance, A~C 8bp apart: connected
    // components still put all three in one group.
    let a = iso("c1/f1p0/300", '+', &[(100, 200), (300, 400)]);
    let b = iso("c2/f1p0/300", '+', &[(100, 204), (300, 400)]);
    let c = iso("c3/f1p0/300", '+', &[(100, 208), (300, 400)]);

    let config = CollapseConfig::default();
    assert!(fuzzy_match(&a, &b, &config));
    assert!(fuzzy_match(&b, &c, &config));
    assert!(!fuzzy_match(&a, &c, &config));

    let groups = collapse_locus(&one_locus(vec![a, b, c]), &config);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members.len(), 3);
}

#[test]
fn single_exon_isoforms_collapse_by_locus_overlap() {
    let a = iso("c1/f1p0/300", '+', &[(100, 400)]);
    let b = iso("c2/f1p0/250", '+', &[(150, 420)]);

    let groups = collapse_locus(&one_locus(vec![a, b]), &CollapseConfig::default());
    assert_eq!(groups.len(), 1);
}

#[test]
fn opposite_strands_never_match() {
    let a = iso("c1/f1p0/300", '+', &[(100, 200), (300, 400)]);
    let b = iso("c2/f1p0/300", '-', &[(100, 200), (300, 400)]);
    assert!(!fuzzy_match(&a, &b, &CollapseConfig::default()));
}

#[test]
fn representative_ties_break_deterministically() {
    // Equal FL support, equal length, equal identity: the lexicographically
    // smallest id wins.
    let a = iso("c2/f1p0/300", '+', &[(100, 200), (300, 400), (500, 600)]);
    let b = iso("c1/f1p0/300", '+', &[(100, 200), (300, 400), (500, 600)]);

    let groups = collapse_locus(&one_locus(vec![a, b]), &CollapseConfig::default());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].representative.id, "c1/f1p0/300");
}

fn reps(groups: &[EquivalenceGroup]) -> Vec<AlignedIsoform> {
    groups
        .iter()
        .map(|g| {
            let rep = &g.representative;
            let exons: Vec<(u32, u32)> = rep.exons.iter().map(|e| (e.start, e.end)).collect();
            AlignedIsoform::from_exons(&rep.id, &rep.reference_id, rep.strand, &exons)
        })
        .collect()
}

#[test]
fn collapsing_is_idempotent() {
    let config = CollapseConfig::default();
    let isoforms = vec![
        iso("c1/f2p0/300", '+', &[(100, 200), (300, 400), (500, 600)]),
        iso("c2/f1p0/300", '+', &[(100, 203), (300, 400), (500, 600)]),
        iso("c3/f1p0/300", '+', &[(100, 208), (300, 400), (500, 600)]),
    ];

    let first = collapse_locus(&one_locus(isoforms), &config);
    let second = collapse_locus(&one_locus(reps(&first)), &config);

    // Re-running on the representatives finds nothing further to merge.
    assert_eq!(second.len(), first.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.representative.exons, b.representative.exons);
    }
}

#[test]
fn raising_thresholds_never_adds_survivors() {
    use isocollapse_rs::filter;

    let mut isoforms = Vec::new();
    for (i, coverage) in [0.90f32, 0.95, 0.99, 1.0].iter().enumerate() {
        let mut record = iso(&format!("c{i}/f1p0/300"), '+', &[(100, 200), (300, 400)]);
        record.coverage = *coverage;
        record.identity = 0.96;
        isoforms.push(record);
    }

    let mut previous = usize::MAX;
    for min_coverage in [0.0f32, 0.92, 0.97, 0.995, 1.0] {
        let config = CollapseConfig { min_aln_coverage: min_coverage, ..CollapseConfig::default() };
        let survivors = isoforms.iter().filter(|r| filter::keep(r, &config)).count();
        assert!(survivors <= previous);
        previous = survivors;
    }
}
