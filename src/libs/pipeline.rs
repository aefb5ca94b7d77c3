use crate::libs::chooser::Chooser;
use crate::libs::error::Result;
use crate::libs::flags::{fix_mate_fields, reconcile_flags};
use crate::libs::index::{AlignmentIndex, IndexSummary};
use crate::libs::insert_size::{estimate_distribution, Distribution};
use crate::libs::select::{
    final_selection, select_alignments, verify_single_alignments, ResolveStats,
};

/// What a full resolution run did to the index
#[derive(Debug, Clone)]
pub struct ResolveReport {
    pub distribution: Distribution,
    pub before: IndexSummary,
    pub after_selection: IndexSummary,
    pub discarded: usize,
    pub stats: ResolveStats,
}

/// Runs every stage in order on a loaded index: estimation, selection, final
/// selection, flags and mate fields. Afterwards each read has exactly one
/// final record and the index is ready for [`AlignmentIndex::write_sam`].
pub fn resolve<C: Chooser>(index: &mut AlignmentIndex, chooser: &mut C) -> Result<ResolveReport> {
    let before = index.summary();

    log::info!("Estimating insert size distribution");
    let distribution = estimate_distribution(index)?;

    log::info!("Filtering for plausible alignment combinations");
    let discarded = select_alignments(index, &distribution)?;
    log::info!("{} alignments discarded", discarded);
    let after_selection = index.summary();
    after_selection.log();

    log::info!("Selecting final alignments");
    let stats = final_selection(index, &distribution, chooser)?;
    verify_single_alignments(index)?;
    index.summary().log();

    log::info!("Setting SAM flags");
    reconcile_flags(index, &distribution)?;
    fix_mate_fields(index)?;

    Ok(ResolveReport {
        distribution,
        before,
        after_selection,
        discarded,
        stats,
    })
}
