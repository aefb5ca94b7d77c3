extern crate clap;
use clap::*;
use env_logger::Env;

mod cmd_pairsel;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = Command::new("pairsel")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`pairsel` - Insert-size guided alignment selection for read pairs")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_pairsel::resolve::make_subcommand())
        .subcommand(cmd_pairsel::distribution::make_subcommand())
        .subcommand(cmd_pairsel::stat::make_subcommand())
        .after_help(
            r###"Subcommands:

* resolve      - one alignment per read, flags and mate fields rewritten
* distribution - insert size percentiles of the cleanly aligned pairs
* stat         - reads and pairs by number of candidate alignments

Logging goes to stderr; set RUST_LOG=debug for per-pair details.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("resolve", sub_matches)) => cmd_pairsel::resolve::execute(sub_matches),
        Some(("distribution", sub_matches)) => cmd_pairsel::distribution::execute(sub_matches),
        Some(("stat", sub_matches)) => cmd_pairsel::stat::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
