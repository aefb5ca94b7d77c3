/// Reverse complement of a nucleotide sequence. IUPAC codes are complemented, case is
/// kept, anything else is passed through unchanged. An empty (absent) sequence stays empty.
///
/// ```
/// assert_eq!(pairsel::libs::seq::rev_comp(b"ACGTn"), b"nACGT");
/// assert!(pairsel::libs::seq::rev_comp(b"").is_empty());
/// ```
pub fn rev_comp(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Reverses raw quality scores to follow a reverse-complemented sequence.
pub fn rev_qual(qual: &[u8]) -> Vec<u8> {
    qual.iter().rev().copied().collect()
}

fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'G' => b'C',
        b'C' => b'G',
        b'U' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'a' => b't',
        b't' => b'a',
        b'g' => b'c',
        b'c' => b'g',
        b'u' => b'a',
        b'r' => b'y',
        b'y' => b'r',
        b'k' => b'm',
        b'm' => b'k',
        b'b' => b'v',
        b'v' => b'b',
        b'd' => b'h',
        b'h' => b'd',
        _ => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_comp() {
        assert_eq!(rev_comp(b"AACCGGTT"), b"AACCGGTT");
        assert_eq!(rev_comp(b"AAACG"), b"CGTTT");
        assert_eq!(rev_comp(b"acgtN"), b"Nacgt");
        assert_eq!(rev_comp(b"RYKM"), b"KMRY");
        assert_eq!(rev_comp(b""), b"");
    }

    #[test]
    fn test_rev_qual() {
        assert_eq!(rev_qual(&[30, 31, 32]), [32, 31, 30]);
        assert!(rev_qual(&[]).is_empty());
    }
}
