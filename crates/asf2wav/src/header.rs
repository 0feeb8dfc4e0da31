//! Decoders for the Header Object children this profile cares about.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{AsfError, Result};
use crate::guid::{self, Guid};

/// `wFormatTag` of Windows Media Audio version 2.
pub const WAVE_FORMAT_WMAV2: u16 = 0x0161;

/// Codec List entry type of an audio codec.
pub const CODEC_TYPE_AUDIO: u16 = 2;

/// Size of WAVEFORMATEX without the trailing extra bytes.
pub const WAVE_FORMAT_EX_SIZE: u32 = 18;

/// span + virtual packet length + virtual chunk length + silence data length.
const AUDIO_SPREAD_FIXED_SIZE: u32 = 7;

// ─── File Properties ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePropertiesFlags {
    pub broadcast: bool,
    pub seekable: bool,
    pub reserved: u32,
}

impl FilePropertiesFlags {
    pub fn decode(v: u32) -> Self {
        Self {
            broadcast: v & 1 != 0,
            seekable: (v >> 1) & 1 != 0,
            reserved: v >> 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileProperties {
    pub file_id: Guid,
    pub file_size: u64,
    pub creation_date: u64,
    pub data_packets_count: u64,
    pub play_duration: u64,
    pub send_duration: u64,
    pub preroll: u64,
    pub flags: FilePropertiesFlags,
    pub min_data_packet_size: u32,
    pub max_data_packet_size: u32,
    pub max_bitrate: u32,
}

impl FileProperties {
    /// Fixed packet size, valid once [`read_file_properties`] accepted the object.
    pub fn packet_size(&self) -> u32 {
        self.max_data_packet_size
    }
}

pub fn read_file_properties<R: Read + Seek>(c: &mut ByteCursor<R>) -> Result<FileProperties> {
    let props = FileProperties {
        file_id: c.read_guid()?,
        file_size: c.read_u64()?,
        creation_date: c.read_u64()?,
        data_packets_count: c.read_u64()?,
        play_duration: c.read_u64()?,
        send_duration: c.read_u64()?,
        preroll: c.read_u64()?,
        flags: FilePropertiesFlags::decode(c.read_u32()?),
        min_data_packet_size: c.read_u32()?,
        max_data_packet_size: c.read_u32()?,
        max_bitrate: c.read_u32()?,
    };

    if props.flags.broadcast {
        return Err(AsfError::Unsupported("broadcast ASF files".into()));
    }
    if props.flags.reserved != 0 {
        return Err(AsfError::InvalidData(format!(
            "file properties reserved flags are {:#x}",
            props.flags.reserved
        )));
    }
    if props.min_data_packet_size != props.max_data_packet_size {
        return Err(AsfError::Unsupported(format!(
            "variable packet size ({}..{})",
            props.min_data_packet_size, props.max_data_packet_size
        )));
    }

    log::debug!(
        "file properties: {} packets of {} bytes, preroll {} ms",
        props.data_packets_count,
        props.max_data_packet_size,
        props.preroll
    );
    Ok(props)
}

// ─── Stream Properties ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFlags {
    pub stream_number: u8,
    pub reserved: u8,
    pub encrypted: bool,
}

impl StreamFlags {
    pub fn decode(v: u16) -> Self {
        Self {
            stream_number: (v & 0x7F) as u8,
            reserved: ((v >> 7) & 0xFF) as u8,
            encrypted: v >> 15 != 0,
        }
    }
}

/// WAVEFORMATEX plus its codec-specific trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extra: Vec<u8>,
}

impl WaveFormat {
    /// `cbSize` as serialized; fails when `extra` does not fit the 16-bit field.
    pub fn cb_size(&self) -> Result<u16> {
        u16::try_from(self.extra.len()).map_err(|_| {
            AsfError::Inconsistent(format!("{} extra format bytes exceed cbSize", self.extra.len()))
        })
    }

    /// Length of the serialized structure including the extra bytes.
    pub fn encoded_len(&self) -> Result<u32> {
        Ok(WAVE_FORMAT_EX_SIZE + u32::from(self.cb_size()?))
    }
}

/// Audio Spread error-correction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpread {
    pub span: u8,
    pub virtual_packet_length: u16,
    pub virtual_chunk_length: u16,
    pub silence_data_length: u16,
}

#[derive(Debug, Clone)]
pub struct StreamProperties {
    pub error_correction_type: Guid,
    pub time_offset: u64,
    pub stream_number: u8,
    pub format: WaveFormat,
    pub spread: Option<AudioSpread>,
}

pub fn read_stream_properties<R: Read + Seek>(c: &mut ByteCursor<R>) -> Result<StreamProperties> {
    let stream_type = c.read_guid()?;
    let error_correction_type = c.read_guid()?;
    let time_offset = c.read_u64()?;
    let type_specific_len = c.read_u32()?;
    let error_correction_len = c.read_u32()?;
    let flags = StreamFlags::decode(c.read_u16()?);
    let reserved = c.read_u32()?;

    if stream_type != guid::AUDIO_MEDIA {
        let kind = stream_type.name().unwrap_or("unknown");
        return Err(AsfError::Unsupported(format!("non-audio stream type {stream_type} ({kind})")));
    }
    if flags.reserved != 0 || reserved != 0 {
        return Err(AsfError::InvalidData("stream properties reserved fields are nonzero".into()));
    }
    if flags.encrypted {
        return Err(AsfError::Unsupported("encrypted content".into()));
    }
    if error_correction_type != guid::NO_ERROR_CORRECTION && error_correction_type != guid::AUDIO_SPREAD {
        return Err(AsfError::Unsupported(format!("error correction type {error_correction_type}")));
    }

    let format = read_wave_format(c, type_specific_len)?;
    let spread = if error_correction_len != 0 {
        Some(read_audio_spread(c, error_correction_len)?)
    } else {
        None
    };

    log::debug!(
        "stream #{}: tag {:#06x}, {} ch, {} Hz, {} B/s, align {}, {} bits, {} extra bytes",
        flags.stream_number,
        format.format_tag,
        format.channels,
        format.sample_rate,
        format.avg_bytes_per_sec,
        format.block_align,
        format.bits_per_sample,
        format.extra.len()
    );

    Ok(StreamProperties {
        error_correction_type,
        time_offset,
        stream_number: flags.stream_number,
        format,
        spread,
    })
}

fn read_wave_format<R: Read + Seek>(c: &mut ByteCursor<R>, declared_len: u32) -> Result<WaveFormat> {
    if declared_len < WAVE_FORMAT_EX_SIZE {
        return Err(AsfError::InvalidData(format!(
            "type-specific data of {declared_len} bytes cannot hold WAVEFORMATEX"
        )));
    }

    let format_tag = c.read_u16()?;
    if format_tag != WAVE_FORMAT_WMAV2 {
        return Err(AsfError::Unsupported(format!("audio format tag {format_tag:#06x}")));
    }
    let channels = c.read_u16()?;
    let sample_rate = c.read_u32()?;
    let avg_bytes_per_sec = c.read_u32()?;
    let block_align = c.read_u16()?;
    let bits_per_sample = c.read_u16()?;
    let cb_size = c.read_u16()?;

    if WAVE_FORMAT_EX_SIZE + cb_size as u32 != declared_len {
        return Err(AsfError::InvalidData(format!(
            "WAVEFORMATEX with {cb_size} extra bytes does not fill {declared_len} bytes"
        )));
    }
    let extra = c.read_bytes(cb_size as usize)?;

    Ok(WaveFormat {
        format_tag,
        channels,
        sample_rate,
        avg_bytes_per_sec,
        block_align,
        bits_per_sample,
        extra,
    })
}

fn read_audio_spread<R: Read + Seek>(c: &mut ByteCursor<R>, declared_len: u32) -> Result<AudioSpread> {
    let spread = AudioSpread {
        span: c.read_u8()?,
        virtual_packet_length: c.read_u16()?,
        virtual_chunk_length: c.read_u16()?,
        silence_data_length: c.read_u16()?,
    };
    if AUDIO_SPREAD_FIXED_SIZE + spread.silence_data_length as u32 != declared_len {
        return Err(AsfError::InvalidData(format!(
            "error correction data of {declared_len} bytes does not match {} silence bytes",
            spread.silence_data_length
        )));
    }
    // Interleaved payloads would need descrambling before they are usable.
    if spread.span > 1 {
        return Err(AsfError::Unsupported(format!("audio spread span {}", spread.span)));
    }
    c.skip_forward(spread.silence_data_length as u64)?;
    Ok(spread)
}

// ─── Header Extension ────────────────────────────────────────────────────────

pub fn read_header_extension<R: Read + Seek>(c: &mut ByteCursor<R>) -> Result<()> {
    let reserved1 = c.read_guid()?;
    let reserved2 = c.read_u16()?;
    let data_size = c.read_u32()?;

    if reserved1 != guid::RESERVED_1 {
        return Err(AsfError::InvalidData(format!("header extension reserved GUID {reserved1}")));
    }
    if reserved2 != 6 {
        return Err(AsfError::InvalidData(format!("header extension reserved field {reserved2}")));
    }
    if data_size != 0 {
        return Err(AsfError::Unsupported(format!("{data_size} bytes of header extension data")));
    }
    Ok(())
}

// ─── Extended Content Description ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    pub name: String,
    pub value_type: u16,
    pub value_len: u16,
}

pub fn read_extended_content_description<R: Read + Seek>(
    c: &mut ByteCursor<R>,
    max_name_bytes: usize,
) -> Result<Vec<ContentDescriptor>> {
    let count = c.read_u16()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_len = c.read_u16()?;
        let name = read_utf16(c, name_len as usize, max_name_bytes)?;
        let value_type = c.read_u16()?;
        let value_len = c.read_u16()?;
        c.skip_forward(value_len as u64)?;

        log::trace!("content descriptor {name:?}: type {value_type}, {value_len} bytes");
        out.push(ContentDescriptor {
            name,
            value_type,
            value_len,
        });
    }
    Ok(out)
}

// ─── Codec List ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecEntry {
    pub codec_type: u16,
    pub name: String,
    pub description: String,
    pub information_len: u16,
}

pub fn read_codec_list<R: Read + Seek>(c: &mut ByteCursor<R>, max_name_bytes: usize) -> Result<Vec<CodecEntry>> {
    let reserved = c.read_guid()?;
    if reserved != guid::RESERVED_2 {
        return Err(AsfError::InvalidData(format!("codec list reserved GUID {reserved}")));
    }

    let count = c.read_u32()?;
    let mut out = Vec::new();
    for _ in 0..count {
        let codec_type = c.read_u16()?;
        // Name and description lengths count UTF-16 code units.
        let name_len = c.read_u16()?;
        let name = read_utf16(c, name_len as usize * 2, max_name_bytes)?;
        let description_len = c.read_u16()?;
        let description = read_utf16(c, description_len as usize * 2, max_name_bytes)?;
        let information_len = c.read_u16()?;
        c.skip_forward(information_len as u64)?;

        if codec_type != CODEC_TYPE_AUDIO {
            return Err(AsfError::Unsupported(format!("codec {name:?} of type {codec_type}")));
        }
        log::debug!("codec: {name} ({description})");
        out.push(CodecEntry {
            codec_type,
            name,
            description,
            information_len,
        });
    }
    Ok(out)
}

/// Read a UTF-16LE string of `byte_len` bytes, keeping at most `max_bytes`.
fn read_utf16<R: Read + Seek>(c: &mut ByteCursor<R>, byte_len: usize, max_bytes: usize) -> Result<String> {
    let keep = byte_len.min(max_bytes) & !1;
    let raw = c.read_bytes(keep)?;
    c.skip_forward((byte_len - keep) as u64)?;

    let units: Vec<u16> = raw.chunks_exact(2).map(|p| u16::from_le_bytes([p[0], p[1]])).collect();
    let s = String::from_utf16_lossy(&units);
    Ok(s.trim_end_matches('\0').to_string())
}
