//! Check that an ASF file fits the single-stream WMA2 profile.
//!
//! Usage:
//!   asf-validate <input.wma>

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use asf2wav::ConvertConfig;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// ASF/WMA file to check
    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input).with_context(|| format!("unable to open {:?}", args.input))?;
    let asf = asf2wav::validate(BufReader::new(file), &ConvertConfig::default())
        .with_context(|| format!("{:?} is not a supported WMA2 file", args.input))?;

    log::info!(
        "{:?}: {} objects, {} packets, {} payloads ({} bytes)",
        args.input,
        asf.objects.len(),
        asf.packet_count,
        asf.payloads.len(),
        asf.payload_bytes()
    );
    Ok(())
}
