use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("stat")
        .about("Counts reads and pairs by number of candidate alignments")
        .after_help(
            r###"
Output is a two-column TSV:

* alignments       - aligned candidates in total
* zero_reads       - reads without any alignment
* single_reads     - reads with one alignment
* multi_reads      - reads with more than one alignment
* incomplete_pairs - pairs where at least one read is unaligned
* unique_pairs     - pairs where both reads align once
* multi_pairs      - pairs with more than one combination

Reads are counted after dropping candidates that are clipped or have more
than --max-errors (default 10) mismatches in NM:i.

Examples:
1. pairsel stat all_hits.sam

2. pairsel stat all_hits.sam --max-errors 2

"###,
        )
        .arg(
            Arg::new("infiles")
                .num_args(1..=2)
                .index(1)
                .default_value("stdin")
                .help("Input SAM file(s). [stdin] for screen"),
        )
        .arg(
            Arg::new("max_errors")
                .long("max-errors")
                .num_args(1)
                .default_value("10")
                .value_parser(value_parser!(u32))
                .help("Only keep end-to-end alignments with at most this many errors (NM:i)"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = pairsel::writer(args.get_one::<String>("outfile").unwrap())?;

    let index = super::load_index(args)?;
    index.summary().write_tsv(&mut writer)?;
    writer.flush()?;

    Ok(())
}
