//! Thin demonstration CLI over the builder and reader. Not part of the builder's contract —
//! everything the builder promises lives in the library crate.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cdbx::{BuilderConfig, HashFileBuilder, Reader};

fn main() -> ExitCode {
    pretty_env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("build") => build(args),
        Some("get") => get(args),
        _ => {
            eprintln!("usage:");
            eprintln!("  cdbx build <input.tsv> <output.cdbx> <expected_elements>");
            eprintln!("  cdbx get <output.cdbx> <key>");
            bail!("missing or unknown subcommand");
        }
    }
}

/// Builds a sealed file from a tab-separated `key\tvalue` input, one record per line.
fn build(mut args: impl Iterator<Item = String>) -> Result<()> {
    let input = args.next().context("missing <input.tsv>")?;
    let output = args.next().context("missing <output.cdbx>")?;
    let expected_elements: u64 = args
        .next()
        .context("missing <expected_elements>")?
        .parse()
        .context("<expected_elements> must be a non-negative integer")?;

    let file = File::open(&input).with_context(|| format!("opening input file {input}"))?;
    let config = BuilderConfig::new(PathBuf::from(&output), expected_elements);
    let mut builder = HashFileBuilder::with_config(config)
        .with_context(|| format!("initializing builder at {output}"))?;

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {input} line {}", lineno + 1))?;
        let mut parts = line.splitn(2, '\t');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        builder
            .add(key.as_bytes(), value.as_bytes())
            .with_context(|| format!("inserting record from {input} line {}", lineno + 1))?;
    }
    let count = builder.count();
    builder.finish().context("sealing output file")?;
    println!("wrote {count} records to {output}");
    Ok(())
}

fn get(mut args: impl Iterator<Item = String>) -> Result<()> {
    let path = args.next().context("missing <output.cdbx>")?;
    let key = args.next().context("missing <key>")?;

    let reader = Reader::open(&path).with_context(|| format!("opening {path}"))?;
    match reader.get(key.as_bytes()) {
        Some(value) => {
            println!("{}", String::from_utf8_lossy(&value));
            Ok(())
        }
        None => bail!("key not found"),
    }
}
