//! Repackage the WMA2 payloads of an ASF file as an xWMA RIFF/WAVE file.
//!
//! Usage:
//!   asf2wav <input.wma> <output.wav>

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use asf2wav::{ConvertConfig, WaveSummary};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// ASF/WMA file to read
    input: PathBuf,
    /// WAVE file to create
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let summary = convert(&args.input, &args.output)?;

    log::info!(
        "{:?} -> {:?}: {} payloads, {} data bytes, {} bytes total",
        args.input,
        args.output,
        summary.payload_count,
        summary.data_len,
        summary.total_len
    );
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<WaveSummary> {
    let reader = File::open(input).with_context(|| format!("unable to open {:?}", input))?;
    let writer = File::create(output).with_context(|| format!("unable to create {:?}", output))?;

    match asf2wav::transcode(BufReader::new(reader), BufWriter::new(writer), &ConvertConfig::default()) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            // A half-written file is never a valid WAVE file.
            if let Err(rm) = std::fs::remove_file(output) {
                log::warn!("unable to remove {:?}: {}", output, rm);
            }
            Err(e).with_context(|| format!("unable to convert {:?}", input))
        }
    }
}
