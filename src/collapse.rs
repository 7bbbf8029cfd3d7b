//! Fuzzy exon-chain matching and per-locus collapsing.
//!
//! Two isoforms represent the same transcript model when all shared internal
//! junctions agree within `max_fuzzy_junction` bases; outer 5'/3' transcript
//! ends are the least reliable part of an alignment and are never
//! load-bearing for identity. Pairwise matching is NOT transitive: groups
//! are the connected components of the pairwise match graph (union-find), so
//! a chain of near-matches may group isoforms whose junctions individually
//! fall outside the literal tolerance. This chain-transitive behavior is
//! intentional and kept for compatibility with existing consumers.

use crate::record::{AlignedIsoform, Junction};
use crate::locus::Locus;

/// Tunable collapse parameters (see the CLI for the user-facing surface).
#[derive(Debug, Clone)]
pub struct CollapseConfig {
    /// Min fraction of the query aligned for a record to be analyzed.
    pub min_aln_coverage: f32,
    /// Min alignment identity for a record to be analyzed.
    pub min_aln_identity: f32,
    /// Max distance in bases between merge-able fuzzy junctions.
    pub max_fuzzy_junction: u32,
    /// Min supportive FLNC reads for a non-full-length isoform to count.
    pub min_flnc_coverage: u32,
    /// Collapse shorter 5' transcripts into those with one extra 5' exon.
    pub allow_extra_5exon: bool,
    /// Never merge structurally different 5' ends; overrides
    /// `allow_extra_5exon`.
    pub skip_5_exon_alt: bool,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            min_aln_coverage: 0.99,
            min_aln_identity: 0.95,
            max_fuzzy_junction: 5,
            min_flnc_coverage: 1,
            allow_extra_5exon: false,
            skip_5_exon_alt: false,
        }
    }
}

/// A finalized group of structurally equivalent isoforms.
///
/// Created during matching, finalized during merge (representative fixed,
/// junctions canonicalized), support counts attached by the abundance
/// aggregator, then consumed once by the emitter.
#[derive(Debug, Clone)]
pub struct EquivalenceGroup {
    /// Canonical model: the selected member with its junction coordinates
    /// rewritten to the group's merged values.
    pub representative: AlignedIsoform,
    /// Contributing isoforms, sorted by id.
    pub members: Vec<AlignedIsoform>,
    /// Contributing full-length reads (filled by the aggregator).
    pub num_fl: u32,
    /// Contributing non-full-length reads (filled by the aggregator).
    pub num_nfl: u32,
}

fn within(a: u32, b: u32, tol: u32) -> bool {
    a.abs_diff(b) <= tol
}

fn junctions_match(a: &Junction, b: &Junction, tol: u32) -> bool {
    within(a.donor, b.donor, tol) && within(a.acceptor, b.acceptor, tol)
}

/// Align a member's junction list against the representative's.
///
/// Exon chains of different length differ only at the 5' end, so shared
/// junctions sit at the 3' side: on '+' the genomic-order lists align at the
/// right end, on '-' at the left end. Returns, for each shared junction,
/// the (member index, reference index) pair.
fn shared_junctions(
    strand: char,
    member_len: usize,
    ref_len: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let shared = member_len.min(ref_len);
    let (m_off, r_off) = if strand == '-' {
        (0, 0)
    } else {
        (member_len - shared, ref_len - shared)
    };
    (0..shared).map(move |k| (m_off + k, r_off + k))
}

/// Decide whether two isoforms in the same locus represent the same
/// transcript model under the configured junction tolerance and 5' policy.
pub fn fuzzy_match(a: &AlignedIsoform, b: &AlignedIsoform, config: &CollapseConfig) -> bool {
    if a.strand != b.strand || a.reference_id != b.reference_id {
        return false;
    }

    let tol = config.max_fuzzy_junction;
    let ja = a.junctions();
    let jb = b.junctions();

    if ja.len() == jb.len() {
        // Strict case: every internal junction must fuzzy-match. Single-exon
        // chains have no junctions; locus membership already implies overlap.
        return ja.iter().zip(&jb).all(|(x, y)| junctions_match(x, y, tol));
    }

    // Differing exon counts only merge under the 5'-extension policy, and
    // only for exactly one extra 5' exon.
    if !config.allow_extra_5exon || config.skip_5_exon_alt {
        return false;
    }
    if ja.len().abs_diff(jb.len()) != 1 {
        return false;
    }

    let all_shared_match = shared_junctions(a.strand, ja.len(), jb.len())
        .all(|(i, j)| junctions_match(&ja[i], &jb[j], tol));
    if !all_shared_match {
        return false;
    }

    // The shared 3' boundary must also agree: genomic end on '+', genomic
    // start on '-'.
    if a.strand == '-' {
        within(a.start(), b.start(), tol)
    } else {
        within(a.end(), b.end(), tol)
    }
}

/// Plain union-find with path halving; indices are positions in the locus.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Ranking used for canonical junction merging and tie-breaks: more
/// full-length support wins, then higher identity, then the
/// lexicographically smallest id. Deterministic given identical input.
fn better_support(a: &AlignedIsoform, b: &AlignedIsoform) -> bool {
    (b.fl_reads, b.identity, std::cmp::Reverse(b.id.as_str()))
        < (a.fl_reads, a.identity, std::cmp::Reverse(a.id.as_str()))
}

/// Collapse one locus into equivalence groups.
///
/// Loci are independent by construction, so this runs per-locus on worker
/// threads. Groups come back sorted by representative start for a
/// deterministic output order; support counts are left to the aggregator.
pub fn collapse_locus(locus: &Locus, config: &CollapseConfig) -> Vec<EquivalenceGroup> {
    let isoforms = &locus.isoforms;
    let n = isoforms.len();

    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if fuzzy_match(&isoforms[i], &isoforms[j], config) {
                uf.union(i, j);
            }
        }
    }

    let mut components: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        let root = uf.find(i);
        components[root].push(i);
    }

    let mut groups: Vec<EquivalenceGroup> = components
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|component| {
            let mut members: Vec<AlignedIsoform> =
                component.iter().map(|&i| isoforms[i].clone()).collect();
            members.sort_by(|a, b| a.id.cmp(&b.id));
            let representative = build_representative(&members);
            EquivalenceGroup { representative, members, num_fl: 0, num_nfl: 0 }
        })
        .collect();

    groups.sort_by(|a, b| {
        let ka = (a.representative.start(), a.representative.end());
        let kb = (b.representative.start(), b.representative.end());
        ka.cmp(&kb).then_with(|| a.representative.id.cmp(&b.representative.id))
    });
    groups
}

/// Select the representative model and merge fuzzy junctions to canonical
/// coordinates.
///
/// The representative sequence is the longest member among those with the
/// maximum full-length support; each of its junctions is then rewritten to
/// the coordinates of the best-supported member that covers that junction.
fn build_representative(members: &[AlignedIsoform]) -> AlignedIsoform {
    debug_assert!(!members.is_empty(), "equivalence group cannot be empty");

    let max_fl = members.iter().map(|m| m.fl_reads).max().unwrap_or(0);
    let mut rep = members
        .iter()
        .filter(|m| m.fl_reads == max_fl)
        .max_by(|a, b| {
            a.length
                .cmp(&b.length)
                .then(a.identity.partial_cmp(&b.identity).unwrap_or(std::cmp::Ordering::Equal))
                // Smaller id wins an exact tie.
                .then_with(|| b.id.cmp(&a.id))
        })
        .expect("non-empty group")
        .clone();

    let rep_junctions = rep.junctions();
    if rep_junctions.is_empty() {
        return rep;
    }

    // Per junction, take the coordinates from the best-supported member that
    // has a corresponding junction.
    let mut canonical = rep_junctions.clone();
    let mut source: Vec<Option<&AlignedIsoform>> = vec![None; canonical.len()];
    for member in members {
        let mj = member.junctions();
        for (m_idx, r_idx) in shared_junctions(rep.strand, mj.len(), canonical.len()) {
            match source[r_idx] {
                Some(current) if !better_support(member, current) => {}
                _ => {
                    source[r_idx] = Some(member);
                    canonical[r_idx] = mj[m_idx];
                }
            }
        }
    }

    for (i, junction) in canonical.iter().enumerate() {
        rep.exons[i].end = junction.donor;
        rep.exons[i + 1].start = junction.acceptor;
    }
    rep
}
