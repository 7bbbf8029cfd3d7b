//! Abundance aggregation: per-group full-length / non-full-length read
//! support.
//!
//! `num_fl` counts the distinct contributing isoforms flagged full-length.
//! `num_nfl` counts the distinct non-full-length contributors whose own
//! FLNC read support meets `min_flnc_coverage`. In the production flow the
//! threshold is always 1, because collapse runs on consensus isoforms rather
//! than raw reads; feeding non-full-length reads directly with a higher
//! threshold is explicitly undefined.

use crate::collapse::{CollapseConfig, EquivalenceGroup};

/// Fill in the group's support counts. Pure; runs per-locus on workers.
pub fn annotate_support(group: &mut EquivalenceGroup, config: &CollapseConfig) {
    let mut num_fl = 0u32;
    let mut num_nfl = 0u32;
    for member in &group.members {
        if member.is_full_length() {
            num_fl += 1;
        } else if member.nfl_reads >= config.min_flnc_coverage {
            num_nfl += 1;
        }
    }
    group.num_fl = num_fl;
    group.num_nfl = num_nfl;
}
