//! xWMA-style RIFF/WAVE output: `RIFF`/`WAVE`, `fmt `, `dpds`, `data`.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{AsfError, Result};
use crate::header::WaveFormat;
use crate::packet::Payload;

/// Offset of the RIFF size field from the start of the output.
pub const RIFF_SIZE_OFFSET: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveSummary {
    pub payload_count: usize,
    pub dpds_len: u32,
    pub data_len: u32,
    pub total_len: u64,
}

pub struct WaveAssembler<'a> {
    format: &'a WaveFormat,
    samples_per_packet: u32,
}

impl<'a> WaveAssembler<'a> {
    pub fn new(format: &'a WaveFormat, samples_per_packet: u32) -> Self {
        Self {
            format,
            samples_per_packet,
        }
    }

    pub fn bytes_per_sample(&self) -> Result<u32> {
        let bytes = self.format.bits_per_sample as u32 / 8;
        if bytes == 0 {
            return Err(AsfError::Inconsistent(format!(
                "{} bits per sample gives no whole bytes per sample",
                self.format.bits_per_sample
            )));
        }
        Ok(bytes)
    }

    /// Cumulative decoded byte offsets, one entry per payload.
    pub fn packet_offsets(&self, count: usize) -> Result<Vec<u32>> {
        let bytes_per_sample = self.bytes_per_sample()?;
        let step = self
            .samples_per_packet
            .checked_mul(bytes_per_sample)
            .ok_or_else(|| AsfError::Inconsistent("dpds step overflows 32 bits".into()))?;

        let mut table = Vec::with_capacity(count);
        let mut acc = 0u32;
        for _ in 0..count {
            acc = acc
                .checked_add(step)
                .ok_or_else(|| AsfError::Inconsistent(format!("dpds offsets overflow after {} entries", table.len())))?;
            table.push(acc);
        }

        let last = table.last().copied().unwrap_or(0);
        let expected = self.samples_per_packet as u64 * count as u64;
        if last % bytes_per_sample != 0 || (last / bytes_per_sample) as u64 != expected {
            return Err(AsfError::Inconsistent(format!(
                "dpds ends at {last} bytes, expected {expected} samples of {bytes_per_sample} bytes"
            )));
        }
        Ok(table)
    }

    /// Write the complete WAVE file and back-patch the RIFF size.
    pub fn write<W: Write + Seek>(&self, payloads: &[Payload], mut w: W) -> Result<WaveSummary> {
        let offsets = self.packet_offsets(payloads.len())?;
        let dpds_len = chunk_len(offsets.len() as u64 * 4, "dpds")?;
        let data_len = chunk_len(payloads.iter().map(|p| p.data.len() as u64).sum(), "data")?;
        let fmt_len = self.format.encoded_len()?;

        let start = w.stream_position()?;
        w.write_all(b"RIFF")?;
        w.write_u32::<LittleEndian>(0)?;
        w.write_all(b"WAVE")?;

        w.write_all(b"fmt ")?;
        w.write_u32::<LittleEndian>(fmt_len)?;
        write_wave_format(&mut w, self.format)?;

        w.write_all(b"dpds")?;
        w.write_u32::<LittleEndian>(dpds_len)?;
        for off in &offsets {
            w.write_u32::<LittleEndian>(*off)?;
        }

        w.write_all(b"data")?;
        w.write_u32::<LittleEndian>(data_len)?;
        for p in payloads {
            w.write_all(&p.data)?;
        }

        let end = w.stream_position()?;
        let total_len = end - start;
        let riff_size = chunk_len(total_len - 8, "RIFF")?;
        w.seek(SeekFrom::Start(start + RIFF_SIZE_OFFSET))?;
        w.write_u32::<LittleEndian>(riff_size)?;
        w.seek(SeekFrom::Start(end))?;
        w.flush()?;

        log::debug!("wrote {total_len} bytes: {} dpds entries, {data_len} data bytes", offsets.len());
        Ok(WaveSummary {
            payload_count: payloads.len(),
            dpds_len,
            data_len,
            total_len,
        })
    }
}

fn chunk_len(len: u64, id: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| AsfError::Inconsistent(format!("{id} chunk of {len} bytes exceeds 32 bits")))
}

pub fn write_wave_format<W: Write>(w: &mut W, f: &WaveFormat) -> Result<()> {
    w.write_u16::<LittleEndian>(f.format_tag)?;
    w.write_u16::<LittleEndian>(f.channels)?;
    w.write_u32::<LittleEndian>(f.sample_rate)?;
    w.write_u32::<LittleEndian>(f.avg_bytes_per_sec)?;
    w.write_u16::<LittleEndian>(f.block_align)?;
    w.write_u16::<LittleEndian>(f.bits_per_sample)?;
    w.write_u16::<LittleEndian>(f.cb_size()?)?;
    w.write_all(&f.extra)?;
    Ok(())
}
