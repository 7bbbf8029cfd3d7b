//! Run orchestration: stream → filter → partition → per-locus collapse →
//! aggregate → emit.
//!
//! The streaming/partitioning stage is single-threaded (the sort-order
//! dependence forbids reordering). Loci are independent by construction, so
//! collapsing and aggregation fan out to worker threads; results funnel back
//! through the single writer, which restores ascending locus order even when
//! loci finish out of order. Finalized loci are moved to workers by value,
//! so no locking guards locus contents.

use crate::abundance::annotate_support;
use crate::cli::Args;
use crate::collapse::{collapse_locus, CollapseConfig, EquivalenceGroup};
use crate::error::CollapseError;
use crate::filter;
use crate::locus::{Locus, LocusPartitioner};
use crate::output::OutputWriter;
use crate::record::AlignmentReader;
use crate::seqfile;
use anyhow::Result;
use crossfire::mpmc;
use std::collections::BTreeMap;
use std::thread;

#[derive(Debug, Default)]
pub struct Stats {
    pub total_records: u64,
    pub unmapped_records: u64,
    pub filtered_records: u64,
    pub loci: u64,
    pub groups: u64,
    pub collapsed_isoforms: u64,
}

struct WorkItem {
    idx: usize,
    locus: Locus,
}

struct ResultItem {
    idx: usize,
    groups: Vec<EquivalenceGroup>,
}

fn process_locus(locus: &Locus, config: &CollapseConfig) -> Vec<EquivalenceGroup> {
    let mut groups = collapse_locus(locus, config);
    for group in &mut groups {
        annotate_support(group, config);
    }
    groups
}

pub fn run(args: &Args) -> Result<Stats> {
    let config = args.collapse_config();
    let mut writer = OutputWriter::create(&args.output_prefix, args.sample_prefix.as_deref())?;
    let mut reader = AlignmentReader::open(&args.alignment_sam)?;
    let mut partitioner = LocusPartitioner::new();
    let mut stats = Stats::default();

    if args.threads > 1 {
        crossfire::detect_backoff_cfg();
        let worker_count = args.threads as usize;
        let cap = worker_count.saturating_mul(4).max(8);
        let (tx_work, rx_work) = mpmc::bounded_blocking::<WorkItem>(cap);
        let (tx_res, rx_res) = mpmc::unbounded_blocking::<ResultItem>();

        let mut locus_idx: usize = 0;
        let config_ref = &config;
        let writer_ref = &mut writer;

        thread::scope(|scope| -> Result<()> {
            for _ in 0..worker_count {
                let rx_work = rx_work.clone();
                let tx_res = tx_res.clone();
                scope.spawn(move || {
                    while let Ok(item) = rx_work.recv() {
                        let groups = process_locus(&item.locus, config_ref);
                        let _ = tx_res.send(ResultItem { idx: item.idx, groups });
                    }
                });
            }
            drop(tx_res);

            while let Some(result) = reader.next_isoform() {
                let isoform = result?;
                stats.total_records += 1;

                if !filter::keep(&isoform, config_ref) {
                    stats.filtered_records += 1;
                    writer_ref.write_filtered(&isoform.id, isoform.length, isoform.is_full_length())?;
                    continue;
                }

                for locus in partitioner.push(isoform)? {
                    tx_work.send(WorkItem { idx: locus_idx, locus })?;
                    locus_idx += 1;
                }
            }
            for locus in partitioner.finish() {
                tx_work.send(WorkItem { idx: locus_idx, locus })?;
                locus_idx += 1;
            }
            drop(tx_work);

            // Drain results, restoring ascending locus order.
            let mut pending: BTreeMap<usize, Vec<EquivalenceGroup>> = BTreeMap::new();
            let mut next_idx = 0usize;
            let mut written = 0usize;
            while written < locus_idx {
                let res = rx_res
                    .recv()
                    .map_err(|_| anyhow::anyhow!("worker result channel closed"))?;
                pending.insert(res.idx, res.groups);
                while let Some(groups) = pending.remove(&next_idx) {
                    stats.loci += 1;
                    stats.groups += groups.len() as u64;
                    stats.collapsed_isoforms +=
                        groups.iter().map(|g| g.members.len() as u64).sum::<u64>();
                    writer_ref.write_locus(&groups)?;
                    next_idx += 1;
                    written += 1;
                }
            }

            Ok(())
        })?;
    } else {
        while let Some(result) = reader.next_isoform() {
            let isoform = result?;
            stats.total_records += 1;

            if !filter::keep(&isoform, &config) {
                stats.filtered_records += 1;
                writer.write_filtered(&isoform.id, isoform.length, isoform.is_full_length())?;
                continue;
            }

            for locus in partitioner.push(isoform)? {
                emit_locus(&locus, &config, &mut writer, &mut stats)?;
            }
        }
        for locus in partitioner.finish() {
            emit_locus(&locus, &config, &mut writer, &mut stats)?;
        }
    }

    stats.unmapped_records = reader.skipped_unmapped;

    if stats.groups == 0 {
        // Empty result is reported, not fatal: downstream consumers still
        // receive well-formed, empty output files.
        tracing::warn!(
            total_records = stats.total_records,
            filtered_records = stats.filtered_records,
            "no isoforms survived filtering; emitting empty outputs"
        );
    }

    let rep_entries = writer.finish()?;

    if let Some(out_path) = &args.collapsed_isoforms {
        seqfile::write_collapsed(&args.input_isoforms, out_path, &rep_entries)?;
    }

    Ok(stats)
}

fn emit_locus(
    locus: &Locus,
    config: &CollapseConfig,
    writer: &mut OutputWriter,
    stats: &mut Stats,
) -> Result<(), CollapseError> {
    let groups = process_locus(locus, config);
    stats.loci += 1;
    stats.groups += groups.len() as u64;
    stats.collapsed_isoforms += groups.iter().map(|g| g.members.len() as u64).sum::<u64>();
    writer.write_locus(&groups)
}
