use anyhow::anyhow;
use bstr::BString;
use noodles::core::Position;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::MappingQuality;
use noodles::sam::alignment::record_buf::{Cigar, Data, QualityScores, RecordBuf, Sequence};
use noodles::sam::Header;
use std::fmt;

pub use noodles::sam::alignment::record::Flags;

use crate::libs::seq::{rev_comp, rev_qual};

/// A single candidate placement of a single read, decoded from a SAM record.
///
/// Reference names are kept as text rather than header ids, so records read
/// from inputs with different headers can live side by side. The strand,
/// aligned and indel bits are fixed when the record is decoded. The `flags`
/// field is free to be rewritten afterwards without touching them.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub read_name: String,
    pub flags: Flags,
    pub ref_name: String,
    pub ref_start: usize, // 0-based
    pub ref_end: usize,   // 0-based, half-open
    pub mapq: Option<MappingQuality>,
    pub cigar: Cigar,
    pub mate_ref_name: String,
    pub mate_pos: usize, // 1-based, 0 for none
    pub tlen: i32,
    pub sequence: Sequence,
    pub quality_scores: QualityScores,
    pub data: Data,
    reverse: bool,
    aligned: bool,
    has_indels: bool,
}

impl Alignment {
    /// Builds an aligned record from its essentials. Mostly useful for tests and
    /// for callers that decode alignments from some other format.
    ///
    /// ```
    /// use pairsel::libs::sam::Alignment;
    /// let a = Alignment::new("r1/1", "chr1", 100, "150M", false);
    /// assert_eq!(a.ref_end, 250);
    /// assert!(a.is_aligned());
    /// assert!(a.has_no_indels());
    /// ```
    pub fn new(
        read_name: &str,
        ref_name: &str,
        ref_start: usize,
        cigar: &str,
        reverse: bool,
    ) -> Self {
        let flags = if reverse {
            Flags::REVERSE_COMPLEMENTED
        } else {
            Flags::empty()
        };
        let cigar = parse_cigar(cigar);
        Alignment {
            read_name: read_name.to_string(),
            flags,
            ref_name: ref_name.to_string(),
            ref_start,
            ref_end: ref_end(ref_start, &cigar),
            mapq: None,
            mate_ref_name: "*".to_string(),
            mate_pos: 0,
            tlen: 0,
            sequence: Sequence::default(),
            quality_scores: QualityScores::default(),
            data: Data::default(),
            reverse,
            aligned: true,
            has_indels: !is_match_only(&cigar),
            cigar,
        }
    }

    /// An unaligned record with no reference coordinates.
    pub fn unaligned(read_name: &str, sequence: Sequence, quality_scores: QualityScores) -> Self {
        Alignment {
            read_name: read_name.to_string(),
            flags: Flags::UNMAPPED,
            ref_name: "*".to_string(),
            ref_start: 0,
            ref_end: 0,
            mapq: MappingQuality::new(0),
            cigar: Cigar::default(),
            mate_ref_name: "*".to_string(),
            mate_pos: 0,
            tlen: 0,
            sequence,
            quality_scores,
            data: Data::default(),
            reverse: false,
            aligned: false,
            has_indels: false,
        }
    }

    /// Decodes a record read against `header`.
    ///
    /// A record counts as aligned when it isn't flagged unmapped and has both a
    /// position and a CIGAR.
    pub fn from_record(header: &Header, record: &RecordBuf) -> Self {
        let flags = record.flags();
        let ref_start = record
            .alignment_start()
            .map_or(0, |pos| usize::from(pos) - 1);
        let cigar = record.cigar().clone();
        let aligned = !flags.is_unmapped()
            && record.alignment_start().is_some()
            && !cigar.as_ref().is_empty();

        Alignment {
            read_name: record
                .name()
                .map_or_else(|| "*".to_string(), |name| name.to_string()),
            flags,
            ref_name: reference_name(header, record.reference_sequence_id()),
            ref_start,
            ref_end: ref_end(ref_start, &cigar),
            mapq: record.mapping_quality(),
            mate_ref_name: reference_name(header, record.mate_reference_sequence_id()),
            mate_pos: record.mate_alignment_start().map_or(0, usize::from),
            tlen: record.template_length(),
            sequence: record.sequence().clone(),
            quality_scores: record.quality_scores().clone(),
            data: record.data().clone(),
            reverse: flags.is_reverse_complemented(),
            aligned,
            has_indels: !is_match_only(&cigar),
            cigar,
        }
    }

    /// Encodes the record for writing against `header`. With `strip_suffix`, the
    /// `/1` or `/2` is dropped from QNAME so both mates share a name.
    pub fn to_record(&self, header: &Header, strip_suffix: bool) -> anyhow::Result<RecordBuf> {
        let qname = if strip_suffix {
            self.base_name()
        } else {
            &self.read_name
        };
        let ref_id = reference_id(header, &self.ref_name)?;
        let mate_ref_id = match self.mate_ref_name.as_str() {
            "=" => ref_id,
            name => reference_id(header, name)?,
        };

        let mut record = RecordBuf::default();
        *record.name_mut() = Some(BString::from(qname));
        *record.flags_mut() = self.flags;
        *record.reference_sequence_id_mut() = ref_id;
        *record.alignment_start_mut() = ref_id.and_then(|_| Position::new(self.ref_start + 1));
        *record.mapping_quality_mut() = self.mapq;
        *record.cigar_mut() = self.cigar.clone();
        *record.mate_reference_sequence_id_mut() = mate_ref_id;
        *record.mate_alignment_start_mut() = Position::new(self.mate_pos);
        *record.template_length_mut() = self.tlen;
        *record.sequence_mut() = self.sequence.clone();
        *record.quality_scores_mut() = self.quality_scores.clone();
        *record.data_mut() = self.data.clone();

        Ok(record)
    }

    /// The unaligned placeholder for this read, with the sequence and qualities
    /// turned back to the read's original orientation.
    pub fn to_unaligned(&self) -> Self {
        if self.reverse {
            Alignment::unaligned(
                &self.read_name,
                Sequence::from(rev_comp(self.sequence.as_ref())),
                QualityScores::from(rev_qual(self.quality_scores.as_ref())),
            )
        } else {
            Alignment::unaligned(
                &self.read_name,
                self.sequence.clone(),
                self.quality_scores.clone(),
            )
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn is_forward(&self) -> bool {
        !self.reverse
    }

    pub fn has_no_indels(&self) -> bool {
        !self.has_indels
    }

    /// Secondary and supplementary records may omit SEQ and QUAL
    pub fn is_secondary(&self) -> bool {
        self.flags.is_secondary() || self.flags.is_supplementary()
    }

    /// Value of the `NM` tag, if present
    pub fn edit_distance(&self) -> Option<u32> {
        self.data
            .get(&Tag::EDIT_DISTANCE)
            .and_then(|value| value.as_int())
            .and_then(|nm| u32::try_from(nm).ok())
    }

    /// True for end-to-end alignments: no clipping or indel at either end.
    pub fn starts_and_ends_with_match(&self) -> bool {
        let ops = self.cigar.as_ref();
        matches!(
            (ops.first(), ops.last()),
            (Some(first), Some(last)) if first.kind() == Kind::Match && last.kind() == Kind::Match
        )
    }

    /// Read name without the `/1` or `/2` suffix
    pub fn base_name(&self) -> &str {
        strip_pair_suffix(&self.read_name).unwrap_or(&self.read_name)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}",
            self.read_name, self.ref_name, self.ref_start, self.ref_end
        )
    }
}

/// Splits `name/1` or `name/2` into its base name.
///
/// ```
/// use pairsel::libs::sam::strip_pair_suffix;
/// assert_eq!(strip_pair_suffix("read_9/2"), Some("read_9"));
/// assert_eq!(strip_pair_suffix("read_9"), None);
/// ```
pub fn strip_pair_suffix(name: &str) -> Option<&str> {
    name.strip_suffix("/1").or_else(|| name.strip_suffix("/2"))
}

/// Builds a CIGAR from its text form. Unknown operations are skipped.
///
/// ```
/// use pairsel::libs::sam::parse_cigar;
/// assert_eq!(parse_cigar("5S50M2I").as_ref().len(), 3);
/// assert!(parse_cigar("*").as_ref().is_empty());
/// ```
pub fn parse_cigar(cigar: &str) -> Cigar {
    let mut ops = Vec::new();
    let mut len = 0;

    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = len * 10 + digit as usize;
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            _ => {
                len = 0;
                continue;
            }
        };
        if len > 0 {
            ops.push(Op::new(kind, len));
        }
        len = 0;
    }

    Cigar::from(ops)
}

/// Reference end (exclusive) of an alignment starting at `ref_start`.
/// `M`, `D`, `N`, `=` and `X` consume the reference.
///
/// ```
/// use pairsel::libs::sam::{parse_cigar, ref_end};
/// assert_eq!(ref_end(100, &parse_cigar("150M")), 250);
/// assert_eq!(ref_end(100, &parse_cigar("5S50M2I20M3D70M")), 243);
/// assert_eq!(ref_end(100, &parse_cigar("*")), 100);
/// ```
pub fn ref_end(ref_start: usize, cigar: &Cigar) -> usize {
    let consumed: usize = cigar
        .as_ref()
        .iter()
        .filter(|op| {
            matches!(
                op.kind(),
                Kind::Match
                    | Kind::Deletion
                    | Kind::Skip
                    | Kind::SequenceMatch
                    | Kind::SequenceMismatch
            )
        })
        .map(|op| op.len())
        .sum();
    ref_start + consumed
}

fn is_match_only(cigar: &Cigar) -> bool {
    matches!(cigar.as_ref(), [op] if op.kind() == Kind::Match)
}

fn reference_name(header: &Header, id: Option<usize>) -> String {
    id.and_then(|id| header.reference_sequences().get_index(id))
        .map_or_else(|| "*".to_string(), |(name, _)| name.to_string())
}

fn reference_id(header: &Header, name: &str) -> anyhow::Result<Option<usize>> {
    if name == "*" {
        return Ok(None);
    }
    header
        .reference_sequences()
        .get_index_of(&BString::from(name))
        .map(Some)
        .ok_or_else(|| anyhow!("Reference sequence {} is missing from the SAM header", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam;

    const HEADER: &str = "@SQ\tSN:chr1\tLN:10000\n";
    const LINE: &str =
        "read_1/1\t16\tchr1\t101\t60\t5S45M\t*\t0\t0\tAAAACCCCCGGGGGTTTTTAAAAACCCCCGGGGGTTTTTAAAAACCCCC\tIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIII\tNM:i:2\tAS:i:40";

    fn decode(text: &str) -> (Header, Vec<Alignment>) {
        let mut reader = sam::io::Reader::new(text.as_bytes());
        let header = reader.read_header().unwrap();
        let alignments = reader
            .record_bufs(&header)
            .map(|result| Alignment::from_record(&header, &result.unwrap()))
            .collect();
        (header, alignments)
    }

    fn encode(header: &Header, a: &Alignment, strip_suffix: bool) -> String {
        use noodles::sam::alignment::io::Write as AlignmentWrite;

        let mut writer = sam::io::Writer::new(Vec::new());
        let record = a.to_record(header, strip_suffix).unwrap();
        writer.write_alignment_record(header, &record).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn qual_text(a: &Alignment) -> String {
        a.quality_scores
            .as_ref()
            .iter()
            .map(|q| char::from(q + 33))
            .collect()
    }

    #[test]
    fn test_decode_record() {
        let (_, alignments) = decode(&format!("{HEADER}{LINE}\n"));
        let a = &alignments[0];
        assert_eq!(a.read_name, "read_1/1");
        assert_eq!(a.base_name(), "read_1");
        assert_eq!(a.ref_name, "chr1");
        assert_eq!(a.ref_start, 100);
        assert_eq!(a.ref_end, 145);
        assert_eq!(a.mapq.map(u8::from), Some(60));
        assert!(a.is_aligned());
        assert!(a.is_reverse());
        assert!(!a.has_no_indels());
        assert!(!a.starts_and_ends_with_match());
        assert_eq!(a.edit_distance(), Some(2));
        assert_eq!(format!("{}", a), "read_1/1:chr1:100-145");
    }

    #[test]
    fn test_decode_unmapped() {
        let (_, alignments) = decode("read_2/2\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n");
        let a = &alignments[0];
        assert!(!a.is_aligned());
        assert!(a.is_forward());
        assert_eq!(a.ref_name, "*");
        assert_eq!(a.ref_start, 0);
        assert_eq!(a.ref_end, 0);
        assert_eq!(a.edit_distance(), None);
    }

    #[test]
    fn test_decode_errors() {
        let bad_flag = "read/1\tx\tchr1\t1\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
        let mut reader = sam::io::Reader::new(bad_flag.as_bytes());
        let header = reader.read_header().unwrap();
        assert!(reader.record_bufs(&header).next().unwrap().is_err());

        // chr1 is not declared
        let undeclared = "read/1\t0\tchr1\t1\t60\t4M\t*\t0\t0\tACGT\tIIII\n";
        let mut reader = sam::io::Reader::new(undeclared.as_bytes());
        let header = reader.read_header().unwrap();
        assert!(reader.record_bufs(&header).next().unwrap().is_err());
    }

    #[test]
    fn test_parse_cigar() {
        let ops = parse_cigar("2S10M1I3=");
        let kinds: Vec<Kind> = ops.as_ref().iter().map(|op| op.kind()).collect();
        assert_eq!(
            kinds,
            [Kind::SoftClip, Kind::Match, Kind::Insertion, Kind::SequenceMatch]
        );
        assert_eq!(ops.as_ref()[1].len(), 10);
        assert!(parse_cigar("").as_ref().is_empty());
        // a dangling length or unknown op is dropped
        assert_eq!(parse_cigar("4Q10M5").as_ref().len(), 1);
    }

    #[test]
    fn test_indels() {
        assert!(Alignment::new("r/1", "c", 0, "150M", false).has_no_indels());
        assert!(!Alignment::new("r/1", "c", 0, "75M1I74M", false).has_no_indels());
        assert!(!Alignment::new("r/1", "c", 0, "75M1D75M", false).has_no_indels());
        assert!(!Alignment::new("r/1", "c", 0, "2S148M", false).has_no_indels());
    }

    #[test]
    fn test_starts_and_ends_with_match() {
        assert!(Alignment::new("r/1", "c", 0, "75M1D75M", false).starts_and_ends_with_match());
        assert!(!Alignment::new("r/1", "c", 0, "1I149M", false).starts_and_ends_with_match());
        assert!(!Alignment::new("r/1", "c", 0, "149M1S", false).starts_and_ends_with_match());
    }

    #[test]
    fn test_flags_independent_of_strand() {
        let (_, mut alignments) = decode(&format!("{HEADER}{LINE}\n"));
        let a = &mut alignments[0];
        a.flags = Flags::SEGMENTED | Flags::FIRST_SEGMENT;
        assert!(a.is_reverse());
        assert!(a.is_aligned());
    }

    #[test]
    fn test_to_unaligned() {
        let text = format!("{HEADER}r/1\t16\tchr1\t11\t60\t4M\t*\t0\t0\tAACG\tABCD\tNM:i:0\n");
        let (_, alignments) = decode(&text);
        let u = alignments[0].to_unaligned();
        assert!(!u.is_aligned());
        assert!(u.is_forward());
        assert_eq!(u.flags, Flags::UNMAPPED);
        assert_eq!(u.ref_name, "*");
        assert_eq!(u.sequence.as_ref(), b"CGTT");
        assert_eq!(qual_text(&u), "DCBA");
        assert!(u.data.is_empty());
    }

    #[test]
    fn test_encode_record() {
        let (header, alignments) = decode(&format!("{HEADER}{LINE}\n"));
        assert_eq!(encode(&header, &alignments[0], false), format!("{}\n", LINE));
        assert!(encode(&header, &alignments[0], true).starts_with("read_1\t16\tchr1\t101\t"));

        let u = Alignment::unaligned(
            "r/2",
            Sequence::from(b"ACGT".to_vec()),
            QualityScores::default(),
        );
        assert_eq!(encode(&header, &u, true), "r\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\t*\n");
    }

    #[test]
    fn test_encode_mate_fields() {
        let (header, _) = decode(HEADER);
        let mut a = Alignment::new("r/1", "chr1", 1000, "10M", false);
        a.mate_ref_name = "=".to_string();
        a.mate_pos = 1241;
        a.tlen = 250;
        assert_eq!(
            encode(&header, &a, true),
            "r\t0\tchr1\t1001\t255\t10M\t=\t1241\t250\t*\t*\n"
        );
    }

    #[test]
    fn test_encode_unknown_reference() {
        let (header, _) = decode(HEADER);
        let a = Alignment::new("r/1", "chr9", 1000, "10M", false);
        let err = a.to_record(&header, true).unwrap_err();
        assert!(err.to_string().contains("chr9"));
    }
}
