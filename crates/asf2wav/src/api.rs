//! Public library API.

use std::io::{Read, Seek, Write};

use crate::config::ConvertConfig;
use crate::error::{AsfError, Result};
use crate::object::AsfFile;
use crate::riff::{WaveAssembler, WaveSummary};

/// Walk the whole file, failing on the first structural or profile violation.
pub fn validate<R: Read + Seek>(reader: R, config: &ConvertConfig) -> Result<AsfFile> {
    AsfFile::parse(reader, config)
}

/// Repackage the audio payloads of an ASF file as a RIFF/WAVE file.
///
/// Nothing is written unless the whole input parsed cleanly.
pub fn transcode<R: Read + Seek, W: Write + Seek>(
    reader: R,
    writer: W,
    config: &ConvertConfig,
) -> Result<WaveSummary> {
    let file = AsfFile::parse(reader, config)?;
    let stream = file
        .stream
        .as_ref()
        .ok_or_else(|| AsfError::Inconsistent("no Stream Properties Object before end of input".into()))?;

    WaveAssembler::new(&stream.format, config.samples_per_packet).write(&file.payloads, writer)
}
