use std::fmt;
use std::ops::Index;

use crate::libs::error::{PairselError, Result};
use crate::libs::index::AlignmentIndex;
use crate::libs::percentile::percentile;
use crate::libs::sam::Alignment;

/// Larger insert sizes are left out of the distribution (structural variants,
/// chimeric fragments).
pub const MAX_ALLOWED_INSERT_SIZE: usize = 10_000;

/// The percentile points a [`Distribution`] records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Percentile {
    P0_001,
    P0_01,
    P0_1,
    P1,
    P10,
    P50,
    P90,
    P99,
    P99_9,
    P99_99,
    P99_999,
}

impl Percentile {
    pub const ALL: [Percentile; 11] = [
        Percentile::P0_001,
        Percentile::P0_01,
        Percentile::P0_1,
        Percentile::P1,
        Percentile::P10,
        Percentile::P50,
        Percentile::P90,
        Percentile::P99,
        Percentile::P99_9,
        Percentile::P99_99,
        Percentile::P99_999,
    ];

    pub fn value(self) -> f64 {
        match self {
            Percentile::P0_001 => 0.001,
            Percentile::P0_01 => 0.01,
            Percentile::P0_1 => 0.1,
            Percentile::P1 => 1.0,
            Percentile::P10 => 10.0,
            Percentile::P50 => 50.0,
            Percentile::P90 => 90.0,
            Percentile::P99 => 99.0,
            Percentile::P99_9 => 99.9,
            Percentile::P99_99 => 99.99,
            Percentile::P99_999 => 99.999,
        }
    }
}

// Nested bands, tightest first, with the score each one earns
const BANDS: [(Percentile, Percentile, u8); 5] = [
    (Percentile::P10, Percentile::P90, 5),
    (Percentile::P1, Percentile::P99, 4),
    (Percentile::P0_1, Percentile::P99_9, 3),
    (Percentile::P0_01, Percentile::P99_99, 2),
    (Percentile::P0_001, Percentile::P99_999, 1),
];

/// Empirical insert size distribution, stored as the insert size at each
/// [`Percentile`] point. Values are non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    values: [f64; 11],
}

impl Distribution {
    /// Reads the percentile points off a sorted sample.
    ///
    /// ```
    /// use pairsel::libs::insert_size::{Distribution, Percentile};
    /// let sizes: Vec<u32> = (300..=500).collect();
    /// let dist = Distribution::from_sorted(&sizes).unwrap();
    /// assert_eq!(dist[Percentile::P50], 400.0);
    /// assert_eq!(dist.score(400), 5);
    /// assert!(Distribution::from_sorted(&[]).is_err());
    /// ```
    pub fn from_sorted(sorted: &[u32]) -> Result<Self> {
        let mut values = [0.0; 11];
        for (i, p) in Percentile::ALL.iter().enumerate() {
            values[i] = percentile(sorted, p.value()).ok_or(PairselError::EmptyDistribution)?;
        }
        Ok(Self { values })
    }

    /// A distribution from known values, in [`Percentile::ALL`] order.
    pub fn from_values(values: [f64; 11]) -> Self {
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Percentile, f64)> + '_ {
        Percentile::ALL.into_iter().zip(self.values.iter().copied())
    }

    /// Confidence tier of an insert size, from 5 (between the 10th and 90th
    /// percentiles) down to 0 (outside the 0.001 to 99.999 band).
    pub fn score(&self, insert_size: usize) -> u8 {
        let size = insert_size as f64;
        BANDS
            .iter()
            .find(|(lo, hi, _)| self[*lo] <= size && size <= self[*hi])
            .map_or(0, |&(_, _, score)| score)
    }

    /// Score of the insert size implied by placing two mates at `a_1` and `a_2`
    pub fn score_pair(&self, a_1: &Alignment, a_2: &Alignment) -> u8 {
        self.score(insert_size(a_1, a_2))
    }

    pub fn log(&self) {
        log::info!("Percentile   Insert size");
        for (p, v) in self.iter() {
            log::info!("  {:8.3}   {:>11.1}", p.value(), v);
        }
    }

    pub fn write_tsv<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "percentile\tinsert_size")?;
        for (p, v) in self.iter() {
            writeln!(writer, "{}\t{}", p, v)?;
        }
        Ok(())
    }
}

impl Index<Percentile> for Distribution {
    type Output = f64;

    fn index(&self, p: Percentile) -> &f64 {
        &self.values[p as usize]
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Span of reference covered by both alignments, whichever one is leftmost.
///
/// ```
/// use pairsel::libs::insert_size::insert_size;
/// use pairsel::libs::sam::Alignment;
/// let a_1 = Alignment::new("r/1", "chr1", 1000, "100M", false);
/// let a_2 = Alignment::new("r/2", "chr1", 1200, "100M", true);
/// assert_eq!(insert_size(&a_1, &a_2), 300);
/// assert_eq!(insert_size(&a_2, &a_1), 300);
/// ```
pub fn insert_size(a_1: &Alignment, a_2: &Alignment) -> usize {
    let coords = [a_1.ref_start, a_1.ref_end, a_2.ref_start, a_2.ref_end];
    let min = coords.iter().min().copied().unwrap_or(0);
    let max = coords.iter().max().copied().unwrap_or(0);
    max - min
}

/// Pairs where each mate has exactly one candidate
pub fn uniquely_aligned_pairs(index: &AlignmentIndex) -> Result<Vec<(&Alignment, &Alignment)>> {
    let mut pairs = vec![];
    for name in index.pair_names() {
        if let ([a_1], [a_2]) = index.pair(name)? {
            pairs.push((a_1, a_2));
        }
    }
    Ok(pairs)
}

/// Unique pairs with no indels in either mate and the mates on opposite strands
pub fn properly_aligned_pairs<'a>(
    pairs: &[(&'a Alignment, &'a Alignment)],
) -> Vec<(&'a Alignment, &'a Alignment)> {
    pairs
        .iter()
        .filter(|(a_1, a_2)| {
            a_1.has_no_indels() && a_2.has_no_indels() && a_1.is_reverse() != a_2.is_reverse()
        })
        .copied()
        .collect()
}

/// Estimates the insert size distribution from the cleanly aligned pairs of the index.
pub fn estimate_distribution(index: &AlignmentIndex) -> Result<Distribution> {
    let unique_pairs = uniquely_aligned_pairs(index)?;
    log::info!("{} read pairs are uniquely aligned", unique_pairs.len());
    let proper_pairs = properly_aligned_pairs(&unique_pairs);
    log::info!(
        "{} read pairs are cleanly aligned (no indels and good orientation)",
        proper_pairs.len()
    );

    let mut sizes: Vec<u32> = proper_pairs
        .iter()
        .map(|(a_1, a_2)| insert_size(a_1, a_2))
        .filter(|&size| size <= MAX_ALLOWED_INSERT_SIZE)
        .map(|size| size as u32)
        .collect();
    sizes.sort_unstable();
    log::debug!(
        "{} insert sizes kept (at most {})",
        sizes.len(),
        MAX_ALLOWED_INSERT_SIZE
    );

    let distribution = Distribution::from_sorted(&sizes)?;
    distribution.log();
    Ok(distribution)
}
