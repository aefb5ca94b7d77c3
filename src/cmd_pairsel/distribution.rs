use clap::*;
use std::io::Write;

use pairsel::libs::insert_size::estimate_distribution;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("distribution")
        .visible_alias("dist")
        .about("Estimates the insert size distribution")
        .after_help(
            r###"
Prints the insert size at the percentiles used for scoring, as TSV:

    percentile  insert_size
    0.001       ...
    ...
    99.999      ...

Only pairs where both reads align exactly once, on opposite strands and
without indels are used. Insert sizes above 10000 are ignored.

Candidates that are clipped or have more than --max-errors (default 10)
mismatches in NM:i are dropped first.

Examples:
1. pairsel distribution all_hits.sam

2. pairsel dist r1.sam r2.sam --max-errors 5 -o dist.tsv

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
    let distribution = estimate_distribution(&index)?;

    distribution.write_tsv(&mut writer)?;
    writer.flush()?;

    Ok(())
}
