use clap::*;
use std::io::Write;

use pairsel::libs::chooser::SeededChooser;
use pairsel::libs::pipeline;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("resolve")
        .about("Picks one alignment per read using the insert size distribution")
        .after_help(
            r###"
Reads SAM alignments that report every candidate hit of every read ("all hits"),
and writes a SAM file with exactly one record per read.

* Read pairs are identified by QNAME: `name/1` and `name/2`
    * With two input files, `/1` and `/2` are appended to the names of the
      first and second file
* Only end-to-end candidates (no clipping or indel at either end) with an
  NM:i of at most --max-errors are considered; the default is 10
* The insert size distribution is estimated from pairs where both reads
  align once, on opposite strands, without indels
* Candidates that can't form a plausible pair are discarded, then ties are
  broken by insert size, then at random (reproducible with --seed)
* Flags, RNEXT, PNEXT and TLEN are recomputed; QNAMEs lose their suffix

Examples:
1. One input with suffixed read names:
   pairsel resolve all_hits.sam -o resolved.sam

2. Reads split across two files, end-to-end hits with at most 5 mismatches:
   pairsel resolve r1.sam.gz r2.sam.gz --max-errors 5 -o resolved.sam

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
            Arg::new("seed")
                .long("seed")
                .short('s')
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Random seed for breaking ties"),
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
    //----------------------------
    // Args
    //----------------------------
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = pairsel::writer(args.get_one::<String>("outfile").unwrap())?;

    //----------------------------
    // Process
    //----------------------------
    let mut index = super::load_index(args)?;
    let mut chooser = SeededChooser::new(seed);
    pipeline::resolve(&mut index, &mut chooser)?;

    //----------------------------
    // Output
    //----------------------------
    index.write_sam(&mut writer)?;
    writer.flush()?;

    Ok(())
}
