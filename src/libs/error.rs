use thiserror::Error;

pub type Result<T> = std::result::Result<T, PairselError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairselError {
    /// No cleanly aligned pair survived filtering, so there is nothing to score against
    #[error("no cleanly aligned read pairs found, unable to estimate the insert size distribution")]
    EmptyDistribution,

    /// A pair reached final selection with a combination of counts that can't be resolved
    #[error("impossible alignment counts for read pair {name}: {count_1} (/1) and {count_2} (/2)")]
    ImpossibleCounts {
        name: String,
        count_1: usize,
        count_2: usize,
    },

    /// A read still has more than one alignment after final selection
    #[error("read {read} has {count} alignments after final selection")]
    MultipleAlignments { read: String, count: usize },

    /// Only one mate of a pair is present in the input
    #[error("read pair {name} has no {mate} read")]
    MissingMate { name: String, mate: String },

    /// A read name lacks the /1 or /2 suffix
    #[error("read name {name} does not end with /1 or /2")]
    BadReadName { name: String },
}
