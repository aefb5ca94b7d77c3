//! Subcommand modules for the `pairsel` binary.

use clap::ArgMatches;
use pairsel::libs::index::{AlignmentIndex, IndexBuilder};

pub mod distribution;
pub mod resolve;
pub mod stat;

/// Loads the index from the `infiles` and `max_errors` arguments every
/// subcommand shares.
///
/// With one input, read names must carry `/1` or `/2`. With two, the first file
/// holds the `/1` reads and the second the `/2` reads.
pub fn load_index(args: &ArgMatches) -> anyhow::Result<AlignmentIndex> {
    let infiles: Vec<&String> = args.get_many::<String>("infiles").unwrap().collect();

    let mut builder = IndexBuilder::new();
    if infiles.len() == 1 {
        log::info!("Loading alignments from {}", infiles[0]);
        builder.add_reader(pairsel::reader(infiles[0])?, None)?;
    } else {
        for (infile, suffix) in infiles.iter().zip(["/1", "/2"]) {
            log::info!("Loading {} alignments from {}", suffix, infile);
            builder.add_reader(pairsel::reader(infile)?, Some(suffix))?;
        }
    }
    let mut index = builder.build()?;
    log::info!("{} read pairs loaded", index.pair_names().len());

    let max_errors = *args.get_one::<u32>("max_errors").unwrap();
    let (kept, discarded) = index.filter_alignments(max_errors);
    log::info!(
        "{} alignments kept, {} discarded (end-to-end, at most {} errors)",
        kept,
        discarded,
        max_errors
    );
    index.summary().log();

    Ok(index)
}
