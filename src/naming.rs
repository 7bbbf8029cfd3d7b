//! Cluster / isoform naming convention, e.g. `c72/f2p14/1556`.
//!
//! Upstream consensus clustering names each polished isoform after its
//! cluster id and supporting read counts. The collapse engine parses these
//! names to inherit per-isoform full-length / non-full-length support, and
//! renders them back when naming representatives. Parsing and serialization
//! round-trip exactly.

use crate::error::FormatError;
use std::fmt;
use std::str::FromStr;

const CLUSTER_NAME_SHAPE: &str = "c<cluster_index>/f<num_fl>p<num_nfl>/<length>";
const SAMPLE_NAME_SHAPE: &str = "<sample_prefix>|c<cluster_index>/f<num_fl>p<num_nfl>/<length>";

/// A cluster name `c<id>/f<num_fl>p<num_nfl>/<length>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterName {
    pub cluster_id: u64,
    pub num_fl: u32,
    pub num_nfl: u32,
    pub length: u32,
}

impl ClusterName {
    /// Build from a cluster id given either as a bare integer string (`"12"`)
    /// or already carrying the `c` prefix (`"c12"`). The canonical rendered
    /// form always has the prefix.
    pub fn from_parts(
        cluster_id: &str,
        num_fl: u32,
        num_nfl: u32,
        length: u32,
    ) -> Result<Self, FormatError> {
        let digits = cluster_id.strip_prefix('c').unwrap_or(cluster_id);
        let cluster_id = digits.parse::<u64>().map_err(|_| FormatError {
            line: cluster_id.to_string(),
            expected: CLUSTER_NAME_SHAPE,
        })?;
        Ok(Self { cluster_id, num_fl, num_nfl, length })
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "c{}/f{}p{}/{}",
            self.cluster_id, self.num_fl, self.num_nfl, self.length
        )
    }
}

impl FromStr for ClusterName {
    type Err = FormatError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let err = || FormatError {
            line: line.to_string(),
            expected: CLUSTER_NAME_SHAPE,
        };

        let mut fields = line.split('/');
        let (cid, fp, length) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(cid), Some(fp), Some(length), None) => (cid, fp, length),
            _ => return Err(err()),
        };

        let (f, p) = fp.split_once('p').ok_or_else(err)?;
        let num_fl = f.strip_prefix('f').ok_or_else(err)?.parse().map_err(|_| err())?;
        let num_nfl = p.parse().map_err(|_| err())?;
        let length = length.parse().map_err(|_| err())?;

        Self::from_parts(cid, num_fl, num_nfl, length).map_err(|_| err())
    }
}

/// An isoform name carrying a sample prefix, e.g.
/// `i1_HQ_sample18ba5d|c72/f2p14/1556`.
///
/// Holds a [`ClusterName`] by composition; read accessors delegate to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleIsoformName {
    pub sample_prefix: String,
    pub cluster: ClusterName,
}

impl SampleIsoformName {
    pub fn num_fl(&self) -> u32 {
        self.cluster.num_fl
    }

    pub fn num_nfl(&self) -> u32 {
        self.cluster.num_nfl
    }

    pub fn length(&self) -> u32 {
        self.cluster.length
    }
}

impl fmt::Display for SampleIsoformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.sample_prefix, self.cluster)
    }
}

impl FromStr for SampleIsoformName {
    type Err = FormatError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (sample_prefix, cluster) = line.split_once('|').ok_or_else(|| FormatError {
            line: line.to_string(),
            expected: SAMPLE_NAME_SHAPE,
        })?;
        let cluster = cluster.parse::<ClusterName>().map_err(|_| FormatError {
            line: line.to_string(),
            expected: SAMPLE_NAME_SHAPE,
        })?;
        Ok(Self { sample_prefix: sample_prefix.to_string(), cluster })
    }
}

/// Upstream FL/NFL support inherited from an isoform's name.
///
/// Isoform ids produced by the consensus clusterer end in a cluster name
/// (optionally behind a sample prefix). Ids that carry no such name are
/// treated as one full-length consensus isoform, matching the production
/// flow where collapse always runs on polished consensus sequences.
pub fn support_from_id(id: &str) -> (u32, u32) {
    let tail = id.rsplit('|').next().unwrap_or(id);
    match tail.parse::<ClusterName>() {
        Ok(name) => (name.num_fl, name.num_nfl),
        Err(_) => (1, 0),
    }
}
