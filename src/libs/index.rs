use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use noodles::sam;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record_buf::{QualityScores, Sequence};
use std::io::{BufRead, Write};

use crate::libs::error::{PairselError, Result};
use crate::libs::sam::{strip_pair_suffix, Alignment};
use crate::libs::seq::{rev_comp, rev_qual};

/// Candidate alignments of every read, keyed by read name (`base/1`, `base/2`),
/// together with the registry of pair base names and one unaligned placeholder
/// per read.
///
/// For every base name in the registry, both `/1` and `/2` are present as keys
/// (an empty list means the read is unaligned) and both have a placeholder.
#[derive(Debug, Default, Clone)]
pub struct AlignmentIndex {
    alignments: IndexMap<String, Vec<Alignment>>,
    unaligned: IndexMap<String, Alignment>,
    pair_names: Vec<String>,
    header: sam::Header,
}

impl AlignmentIndex {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a read pair with its candidates. The placeholders are derived
    /// from the first candidate of each read when there is one.
    ///
    /// ```
    /// use pairsel::libs::index::AlignmentIndex;
    /// use pairsel::libs::sam::Alignment;
    ///
    /// let mut index = AlignmentIndex::new();
    /// index.insert_pair(
    ///     "read_1",
    ///     vec![Alignment::new("read_1/1", "chr1", 100, "150M", false)],
    ///     vec![],
    /// );
    /// assert_eq!(index.pair_names(), ["read_1"]);
    /// assert_eq!(index.alignments("read_1/1").len(), 1);
    /// assert!(index.alignments("read_1/2").is_empty());
    /// assert!(!index.final_alignment("read_1/2").is_aligned());
    /// ```
    pub fn insert_pair(
        &mut self,
        name: &str,
        alignments_1: Vec<Alignment>,
        alignments_2: Vec<Alignment>,
    ) {
        for (suffix, alignments) in [("/1", alignments_1), ("/2", alignments_2)] {
            let read = format!("{}{}", name, suffix);
            let placeholder = match alignments.first() {
                Some(a) => a.to_unaligned(),
                None => Alignment::unaligned(&read, Sequence::default(), QualityScores::default()),
            };
            self.unaligned.insert(read.clone(), placeholder);
            if self.alignments.insert(read, alignments).is_none() && suffix == "/1" {
                self.pair_names.push(name.to_string());
            }
        }
    }

    /// Base names of all read pairs, in input order
    pub fn pair_names(&self) -> &[String] {
        &self.pair_names
    }

    /// SAM header of the first input, written back out unchanged
    pub fn header(&self) -> &sam::Header {
        &self.header
    }

    /// Current candidates of a read; empty for unaligned or unknown reads
    pub fn alignments(&self, read: &str) -> &[Alignment] {
        self.alignments
            .get(read)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn alignments_mut(&mut self, read: &str) -> Option<&mut Vec<Alignment>> {
        self.alignments.get_mut(read)
    }

    /// Candidates of both mates of a pair
    pub fn pair(&self, name: &str) -> Result<(&[Alignment], &[Alignment])> {
        let alignments_1 = self.read_entry(name, "/1")?;
        let alignments_2 = self.read_entry(name, "/2")?;
        Ok((alignments_1, alignments_2))
    }

    fn read_entry(&self, name: &str, suffix: &str) -> Result<&[Alignment]> {
        self.alignments
            .get(&format!("{}{}", name, suffix))
            .map(|v| v.as_slice())
            .ok_or_else(|| PairselError::MissingMate {
                name: name.to_string(),
                mate: suffix.to_string(),
            })
    }

    /// Replaces the candidates of a read with the single one at `idx`
    pub fn keep_only(&mut self, read: &str, idx: usize) {
        if let Some(v) = self.alignments.get_mut(read) {
            let kept = v.swap_remove(idx);
            v.clear();
            v.push(kept);
        }
    }

    /// The record a read resolves to: its only candidate, or its placeholder
    /// when it has none. Only meaningful once final selection has run.
    pub fn final_alignment(&self, read: &str) -> &Alignment {
        match self.alignments(read).first() {
            Some(a) => a,
            None => &self.unaligned[read],
        }
    }

    pub fn final_alignment_mut(&mut self, read: &str) -> &mut Alignment {
        match self.alignments.get_mut(read).and_then(|v| v.first_mut()) {
            Some(a) => a,
            None => &mut self.unaligned[read],
        }
    }

    /// Keeps only end-to-end candidates with an edit distance (NM tag) of at most
    /// `max_errors`. Returns the number of candidates kept and discarded.
    pub fn filter_alignments(&mut self, max_errors: u32) -> (usize, usize) {
        let mut kept = 0;
        let mut discarded = 0;
        for alignments in self.alignments.values_mut() {
            let before = alignments.len();
            alignments.retain(|a| {
                a.starts_and_ends_with_match()
                    && a.edit_distance().is_some_and(|nm| nm <= max_errors)
            });
            kept += alignments.len();
            discarded += before - alignments.len();
        }
        (kept, discarded)
    }

    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary::default();
        for name in &self.pair_names {
            let count_1 = self.alignments(&format!("{}/1", name)).len();
            let count_2 = self.alignments(&format!("{}/2", name)).len();
            summary.alignments += count_1 + count_2;
            for count in [count_1, count_2] {
                match count {
                    0 => summary.zero_reads += 1,
                    1 => summary.single_reads += 1,
                    _ => summary.multi_reads += 1,
                }
            }
            if count_1 == 0 || count_2 == 0 {
                summary.incomplete_pairs += 1;
            } else if count_1 == 1 && count_2 == 1 {
                summary.unique_pairs += 1;
            } else {
                summary.multi_pairs += 1;
            }
        }
        summary
    }

    /// Writes the header, then the final record of `/1` and `/2` for every pair.
    /// Mates share the suffix-less base name as QNAME.
    pub fn write_sam<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut writer = sam::io::Writer::new(writer);
        writer.write_header(&self.header)?;
        for name in &self.pair_names {
            for suffix in ["/1", "/2"] {
                let read = format!("{}{}", name, suffix);
                let record = self
                    .final_alignment(&read)
                    .to_record(&self.header, true)
                    .with_context(|| format!("writing {}", read))?;
                writer.write_alignment_record(&self.header, &record)?;
            }
        }
        Ok(())
    }
}

/// Counts of reads and pairs by number of candidate alignments
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub alignments: usize,
    pub zero_reads: usize,
    pub single_reads: usize,
    pub multi_reads: usize,
    pub incomplete_pairs: usize,
    pub unique_pairs: usize,
    pub multi_pairs: usize,
}

impl IndexSummary {
    pub fn log(&self) {
        let width = self.alignments.to_string().len();
        log::info!("  {:>width$} alignments", self.alignments);
        log::info!("  {:>width$} reads have no alignments", self.zero_reads);
        log::info!("  {:>width$} reads have one alignment", self.single_reads);
        log::info!("  {:>width$} reads have multiple alignments", self.multi_reads);
        log::info!("  {:>width$} read pairs are incomplete", self.incomplete_pairs);
        log::info!("  {:>width$} read pairs are uniquely aligned", self.unique_pairs);
        log::info!("  {:>width$} read pairs have multiple combinations", self.multi_pairs);
    }

    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "key\tvalue")?;
        writeln!(writer, "alignments\t{}", self.alignments)?;
        writeln!(writer, "zero_reads\t{}", self.zero_reads)?;
        writeln!(writer, "single_reads\t{}", self.single_reads)?;
        writeln!(writer, "multi_reads\t{}", self.multi_reads)?;
        writeln!(writer, "incomplete_pairs\t{}", self.incomplete_pairs)?;
        writeln!(writer, "unique_pairs\t{}", self.unique_pairs)?;
        writeln!(writer, "multi_pairs\t{}", self.multi_pairs)?;
        Ok(())
    }
}

/// Collects SAM records from one or more readers and turns them into an
/// [`AlignmentIndex`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    records: IndexMap<String, Vec<Alignment>>,
    header: sam::Header,
    inputs: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Reads SAM text. The header is kept from the first input only.
    ///
    /// With a `suffix` (`/1` or `/2`), it is appended to every read name that
    /// doesn't already carry it. Without one, every read name must already end
    /// in `/1` or `/2`.
    pub fn add_reader<R: BufRead>(
        &mut self,
        reader: R,
        suffix: Option<&str>,
    ) -> anyhow::Result<()> {
        self.inputs += 1;
        let mut reader = sam::io::Reader::new(reader);
        let header = reader
            .read_header()
            .with_context(|| format!("header of input {}", self.inputs))?;

        for (i, result) in reader.record_bufs(&header).enumerate() {
            let record =
                result.with_context(|| format!("record {} of input {}", i + 1, self.inputs))?;
            let mut alignment = Alignment::from_record(&header, &record);
            match suffix {
                Some(s) if !alignment.read_name.ends_with(s) => {
                    alignment.read_name.push_str(s);
                }
                Some(_) => {}
                None => {
                    if strip_pair_suffix(&alignment.read_name).is_none() {
                        return Err(PairselError::BadReadName {
                            name: alignment.read_name,
                        }
                        .into());
                    }
                }
            }

            self.records
                .entry(alignment.read_name.clone())
                .or_default()
                .push(alignment);
        }

        if self.inputs == 1 {
            self.header = header;
        }
        Ok(())
    }

    /// Validates that both mates of every pair are present, then splits each
    /// read's records into aligned candidates and an unaligned placeholder.
    pub fn build(self) -> Result<AlignmentIndex> {
        let mut names: IndexSet<String> = IndexSet::new();
        for read in self.records.keys() {
            if let Some(base) = strip_pair_suffix(read) {
                names.insert(base.to_string());
            }
        }

        let mut records = self.records;
        let mut index = AlignmentIndex {
            header: self.header,
            ..Default::default()
        };

        for name in names {
            for suffix in ["/1", "/2"] {
                let read = format!("{}{}", name, suffix);
                let mut read_records =
                    records
                        .swap_remove(&read)
                        .ok_or_else(|| PairselError::MissingMate {
                            name: name.clone(),
                            mate: suffix.to_string(),
                        })?;
                fill_secondary_seqs(&mut read_records);

                let placeholder = read_records
                    .iter()
                    .find(|a| !a.is_aligned())
                    .or_else(|| read_records.iter().find(|a| !a.is_secondary()))
                    .or_else(|| read_records.first())
                    .map(|a| a.to_unaligned())
                    .unwrap_or_else(|| {
                        Alignment::unaligned(&read, Sequence::default(), QualityScores::default())
                    });

                let candidates: Vec<Alignment> =
                    read_records.into_iter().filter(|a| a.is_aligned()).collect();

                index.unaligned.insert(read.clone(), placeholder);
                index.alignments.insert(read, candidates);
            }
            index.pair_names.push(name);
        }

        Ok(index)
    }
}

/// Secondary records usually carry `*` for SEQ and QUAL. Copies them over from
/// the read's primary record, flipping them when the strands differ.
fn fill_secondary_seqs(records: &mut [Alignment]) {
    let source = records
        .iter()
        .find(|a| !a.is_secondary() && !a.sequence.is_empty())
        .map(|a| (a.sequence.clone(), a.quality_scores.clone(), a.is_reverse()));
    let Some((sequence, quality_scores, reverse)) = source else {
        return;
    };

    for a in records.iter_mut().filter(|a| a.sequence.is_empty()) {
        if a.is_reverse() == reverse {
            a.sequence = sequence.clone();
            a.quality_scores = quality_scores.clone();
        } else {
            a.sequence = Sequence::from(rev_comp(sequence.as_ref()));
            a.quality_scores = QualityScores::from(rev_qual(quality_scores.as_ref()));
        }
    }
}
