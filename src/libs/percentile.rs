/// Percentile `p` (0 to 100) of an already sorted sample, interpolating linearly
/// between the two nearest ranks. Returns `None` for an empty sample.
///
/// ```
/// use pairsel::libs::percentile::percentile;
/// let sorted = [100, 200, 300, 400, 500];
/// assert_eq!(percentile(&sorted, 50.0), Some(300.0));
/// assert_eq!(percentile(&sorted, 10.0), Some(140.0));
/// assert_eq!(percentile(&sorted, 0.0), Some(100.0));
/// assert_eq!(percentile(&sorted, 100.0), Some(500.0));
/// assert_eq!(percentile::<u32>(&[], 50.0), None);
/// ```
pub fn percentile<T>(sorted: &[T], p: f64) -> Option<f64>
where
    T: Copy + Into<f64>,
{
    if sorted.is_empty() {
        return None;
    }

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(sorted.len() - 1);

    let lo: f64 = sorted[lower].into();
    let hi: f64 = sorted[upper].into();
    if lower == upper {
        return Some(lo);
    }

    let frac = rank - lower as f64;
    Some(lo + (hi - lo) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_value() {
        for p in [0.001, 1.0, 50.0, 99.999] {
            assert_eq!(percentile(&[250u32], p), Some(250.0));
        }
    }

    #[test]
    fn test_interpolation() {
        let sorted: Vec<u32> = (1..=11).map(|v| v * 10).collect();
        assert_relative_eq!(percentile(&sorted, 25.0).unwrap(), 35.0);
        assert_relative_eq!(percentile(&sorted, 99.999).unwrap(), 109.999, epsilon = 1e-9);
        assert_relative_eq!(percentile(&sorted, 0.001).unwrap(), 10.001, epsilon = 1e-9);
    }

    #[test]
    fn test_boundaries_without_index_error() {
        let sorted = [5u32, 7];
        assert_eq!(percentile(&sorted, 0.0), Some(5.0));
        assert_eq!(percentile(&sorted, 100.0), Some(7.0));
        assert_eq!(percentile(&sorted, 150.0), Some(7.0));
        assert_eq!(percentile(&sorted, -1.0), Some(5.0));
    }
}
