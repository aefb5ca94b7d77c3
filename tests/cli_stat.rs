use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn get_input_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/sam");
    path.push(filename);
    path
}

fn stat(args: &[&str]) -> anyhow::Result<String> {
    let mut cmd = Command::cargo_bin("pairsel")?;
    let output = cmd.arg("stat").args(args).output()?;
    assert!(output.status.success());
    Ok(String::from_utf8(output.stdout)?)
}

#[test]
fn command_stat() -> anyhow::Result<()> {
    let infile = get_input_path("multi.sam");
    let stdout = stat(&[infile.to_str().unwrap()])?;

    assert_eq!(
        stdout,
        "key\tvalue\nalignments\t30\nzero_reads\t3\nsingle_reads\t21\nmulti_reads\t4\nincomplete_pairs\t2\nunique_pairs\t10\nmulti_pairs\t2\n"
    );

    Ok(())
}

#[test]
fn command_stat_max_errors() -> anyhow::Result<()> {
    let infile = get_input_path("multi.sam");
    let stdout = stat(&[infile.to_str().unwrap(), "--max-errors", "0"])?;

    assert!(stdout.contains("alignments\t28\n"));
    assert!(stdout.contains("single_reads\t22\n"));
    assert!(stdout.contains("multi_reads\t3\n"));

    Ok(())
}

#[test]
fn command_stat_two_files() -> anyhow::Result<()> {
    let infile_1 = get_input_path("pair_1.sam");
    let infile_2 = get_input_path("pair_2.sam");
    let stdout = stat(&[infile_1.to_str().unwrap(), infile_2.to_str().unwrap()])?;

    assert!(stdout.contains("alignments\t20\n"));
    assert!(stdout.contains("unique_pairs\t10\n"));

    Ok(())
}

#[test]
fn command_stat_stdin() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("pairsel")?;
    let output = cmd
        .arg("stat")
        .write_stdin(std::fs::read_to_string(get_input_path("unique.sam"))?)
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("unique_pairs\t10\n"));

    Ok(())
}

#[test]
fn command_stat_default_max_errors() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let input = temp.path().join("errors.sam");
    fs::write(
        &input,
        concat!(
            "@SQ\tSN:chr1\tLN:10000\n",
            "r1/1\t0\tchr1\t101\t60\t4M\t*\t0\t0\tAACG\tABCD\tNM:i:10\n",
            "r1/1\t256\tchr1\t501\t0\t4M\t*\t0\t0\t*\t*\tNM:i:11\n",
            "r1/2\t16\tchr1\t301\t60\t1S3M\t*\t0\t0\tAACG\tABCD\tNM:i:0\n",
            "r1/2\t272\tchr1\t901\t0\t4M\t*\t0\t0\t*\t*\n",
        ),
    )?;

    // only the NM:i:10 hit survives without --max-errors
    let stdout = stat(&[input.to_str().unwrap()])?;
    assert!(stdout.contains("alignments\t1\n"));
    assert!(stdout.contains("zero_reads\t1\n"));

    let stdout = stat(&[input.to_str().unwrap(), "--max-errors", "11"])?;
    assert!(stdout.contains("alignments\t2\n"));

    Ok(())
}
