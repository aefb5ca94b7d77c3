use itertools::{iproduct, Itertools};
use noodles::sam::alignment::record::MappingQuality;

use crate::libs::chooser::Chooser;
use crate::libs::error::{PairselError, Result};
use crate::libs::index::AlignmentIndex;
use crate::libs::insert_size::Distribution;
use crate::libs::sam::Alignment;

/// Combinations scoring within this many tiers of the best one survive selection
pub const SCORE_TOLERANCE: u8 = 2;

/// MAPQ of a read left with a single candidate
pub const UNIQUE_MAPQ: u8 = 60;

/// MAPQ of a read that enters final selection with `count` candidates: the
/// phred-scaled chance that a uniform pick among them is wrong.
///
/// ```
/// use pairsel::libs::select::mapq_for_count;
/// assert_eq!(mapq_for_count(1), 60);
/// assert_eq!(mapq_for_count(2), 3);
/// assert_eq!(mapq_for_count(20), 0);
/// ```
pub fn mapq_for_count(count: usize) -> u8 {
    if count <= 1 {
        return UNIQUE_MAPQ;
    }
    let p_wrong = 1.0 - 1.0 / count as f64;
    (-10.0 * p_wrong.log10()).round().min(UNIQUE_MAPQ as f64) as u8
}

/// Best score over all combinations of the two candidate lists
pub fn max_pair_score(
    alignments_1: &[Alignment],
    alignments_2: &[Alignment],
    dist: &Distribution,
) -> u8 {
    alignments_1
        .iter()
        .cartesian_product(alignments_2.iter())
        .map(|(a_1, a_2)| dist.score_pair(a_1, a_2))
        .max()
        .unwrap_or(0)
}

/// Marks the candidates in `alignments` that form a combination scoring at least
/// `min_score` with any candidate in `others`.
fn good_alignments(
    alignments: &[Alignment],
    others: &[Alignment],
    dist: &Distribution,
    min_score: u8,
) -> Vec<bool> {
    alignments
        .iter()
        .map(|a| others.iter().any(|o| dist.score_pair(a, o) >= min_score))
        .collect()
}

fn retain_marked(alignments: &mut Vec<Alignment>, keep: &[bool]) {
    let mut marks = keep.iter();
    alignments.retain(|_| *marks.next().unwrap_or(&false));
}

/// Discards candidates that are not part of a plausible combination.
///
/// Only pairs with candidates on both sides and at least three candidates in
/// total are touched. Each side is filtered against the full candidate list of
/// the other side, so the result doesn't depend on which side goes first.
/// Returns the number of candidates discarded.
pub fn select_alignments(index: &mut AlignmentIndex, dist: &Distribution) -> Result<usize> {
    let mut discarded = 0;
    let names = index.pair_names().to_vec();

    for name in &names {
        let (alignments_1, alignments_2) = index.pair(name)?;
        let count_1 = alignments_1.len();
        let count_2 = alignments_2.len();
        if count_1 == 0 || count_2 == 0 || count_1 + count_2 < 3 {
            continue;
        }

        let min_score =
            max_pair_score(alignments_1, alignments_2, dist).saturating_sub(SCORE_TOLERANCE);
        let keep_1 = good_alignments(alignments_1, alignments_2, dist, min_score);
        let keep_2 = good_alignments(alignments_2, alignments_1, dist, min_score);
        discarded += keep_1.iter().chain(keep_2.iter()).filter(|k| !**k).count();

        for (suffix, keep) in [("/1", keep_1), ("/2", keep_2)] {
            if let Some(alignments) = index.alignments_mut(&format!("{}{}", name, suffix)) {
                retain_marked(alignments, &keep);
            }
        }
        log::debug!(
            "{}: {} + {} candidates, kept {} + {} (min score {})",
            name,
            count_1,
            count_2,
            index.alignments(&format!("{}/1", name)).len(),
            index.alignments(&format!("{}/2", name)).len(),
            min_score
        );
    }

    Ok(discarded)
}

/// How final selection settled the multi-mapping pairs
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    /// A single best combination
    pub insert_size_decisions: usize,
    /// A random pick among tied best combinations
    pub random_decisions: usize,
    /// A random pick for a multi-mapping read whose mate is unaligned
    pub random_single_side: usize,
}

/// Reduces every read to at most one candidate.
///
/// First, every candidate of a read gets the MAPQ of [`mapq_for_count`] for the
/// number of candidates the read has at this point.
///
/// A multi-mapping read with an unaligned mate gets a uniform random pick. For
/// pairs with candidates on both sides, the combination with the best insert
/// size score wins, ties going to a uniform random pick. Pairs with at most one
/// candidate per read, (0, 0) included, are left as they are.
pub fn final_selection<C: Chooser>(
    index: &mut AlignmentIndex,
    dist: &Distribution,
    chooser: &mut C,
) -> Result<ResolveStats> {
    let mut stats = ResolveStats::default();
    let names = index.pair_names().to_vec();

    for name in &names {
        let name_1 = format!("{}/1", name);
        let name_2 = format!("{}/2", name);
        let (count_1, count_2) = index.pair(name).map(|(a_1, a_2)| (a_1.len(), a_2.len()))?;
        for (read, count) in [(&name_1, count_1), (&name_2, count_2)] {
            let mapq = MappingQuality::new(mapq_for_count(count));
            for a in index.alignments_mut(read).into_iter().flatten() {
                a.mapq = mapq;
            }
        }

        let (alignments_1, alignments_2) = index.pair(name)?;
        if count_1 <= 1 && count_2 <= 1 {
            continue;
        } else if count_1 > 1 && count_2 == 0 {
            let i = chooser.choose_index(count_1);
            index.keep_only(&name_1, i);
            stats.random_single_side += 1;
        } else if count_1 == 0 && count_2 > 1 {
            let i = chooser.choose_index(count_2);
            index.keep_only(&name_2, i);
            stats.random_single_side += 1;
        } else if count_1 >= 1 && count_2 >= 1 && count_1 + count_2 >= 3 {
            let max_score = max_pair_score(alignments_1, alignments_2, dist);
            let good_pairs: Vec<(usize, usize)> = iproduct!(0..count_1, 0..count_2)
                .filter(|&(i, j)| {
                    dist.score_pair(&alignments_1[i], &alignments_2[j]) == max_score
                })
                .collect();

            if good_pairs.len() == 1 {
                stats.insert_size_decisions += 1;
            } else {
                stats.random_decisions += 1;
            }
            let (i, j) = *chooser.choose(&good_pairs);
            index.keep_only(&name_1, i);
            index.keep_only(&name_2, j);
        } else {
            return Err(PairselError::ImpossibleCounts {
                name: name.clone(),
                count_1,
                count_2,
            });
        }
    }

    log::info!("Ties broken with insert size:   {}", stats.insert_size_decisions);
    log::info!("Ties broken with random choice: {}", stats.random_decisions);

    Ok(stats)
}

/// Checks that no read of any pair has more than one candidate left.
pub fn verify_single_alignments(index: &AlignmentIndex) -> Result<()> {
    for name in index.pair_names() {
        for suffix in ["/1", "/2"] {
            let read = format!("{}{}", name, suffix);
            let count = index.alignments(&read).len();
            if count > 1 {
                return Err(PairselError::MultipleAlignments { read, count });
            }
        }
    }
    Ok(())
}
