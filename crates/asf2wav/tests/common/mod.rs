#![allow(dead_code)]

use asf2wav::guid::{self, Guid};
use asf2wav::header::{CODEC_TYPE_AUDIO, WAVE_FORMAT_WMAV2};
use asf2wav::packet::WMA_PROPERTY_FLAGS;

pub const WMA2_EXTRA: [u8; 10] = [0x00, 0x88, 0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Builds small single-stream WMA2 ASF files in memory.
#[derive(Debug, Clone)]
pub struct AsfBuilder {
    pub format_tag: u16,
    pub bits_per_sample: u16,
    /// Overrides for File Properties; default is the largest packet.
    pub min_packet_size: Option<u32>,
    pub max_packet_size: Option<u32>,
    /// Packets, each a list of payload buffers.
    pub packets: Vec<Vec<Vec<u8>>>,
    pub replicated_data_len: u8,
    pub error_correction_prefix: bool,
    pub error_correction_object: bool,
    pub with_stream: bool,
    pub extra_children: Vec<Vec<u8>>,
    pub extra_top_level: Vec<Vec<u8>>,
}

impl AsfBuilder {
    pub fn new(packets: Vec<Vec<Vec<u8>>>) -> Self {
        Self {
            format_tag: WAVE_FORMAT_WMAV2,
            bits_per_sample: 16,
            min_packet_size: None,
            max_packet_size: None,
            packets,
            replicated_data_len: 8,
            error_correction_prefix: true,
            error_correction_object: false,
            with_stream: true,
            extra_children: Vec::new(),
            extra_top_level: Vec::new(),
        }
    }

    /// `count` packets with one payload each, payload `i` filled with byte `i`.
    pub fn single_payloads(count: usize, len: usize) -> Self {
        Self::new((0..count).map(|i| vec![vec![i as u8; len]]).collect())
    }

    pub fn packet_size(&self) -> u32 {
        self.packets
            .iter()
            .map(|p| self.encode_packet(p, 0).len() as u32)
            .max()
            .unwrap_or(64)
    }

    pub fn build(&self) -> Vec<u8> {
        let packet_size = self.packet_size();

        let mut children = vec![object(guid::FILE_PROPERTIES_OBJECT, &self.file_properties(packet_size))];
        if self.with_stream {
            children.push(object(guid::STREAM_PROPERTIES_OBJECT, &self.stream_properties()));
        }
        children.push(object(guid::HEADER_EXTENSION_OBJECT, &header_extension()));
        children.push(object(guid::CODEC_LIST_OBJECT, &codec_list()));
        children.push(object(
            guid::EXTENDED_CONTENT_DESCRIPTION_OBJECT,
            &content_description(),
        ));
        if self.error_correction_object {
            children.push(object(guid::ERROR_CORRECTION_OBJECT, &[0u8; 20]));
        }
        children.extend(self.extra_children.iter().cloned());

        let mut out = header_object(&children);
        for obj in &self.extra_top_level {
            out.extend_from_slice(obj);
        }
        out.extend_from_slice(&self.data_object(packet_size));
        out
    }

    fn file_properties(&self, packet_size: u32) -> Vec<u8> {
        let mut b = vec![0x42; 16];
        for v in [0u64, 0, self.packets.len() as u64, 0, 0, 3000] {
            b.extend_from_slice(&v.to_le_bytes());
        }
        b.extend_from_slice(&2u32.to_le_bytes());
        b.extend_from_slice(&self.min_packet_size.unwrap_or(packet_size).to_le_bytes());
        b.extend_from_slice(&self.max_packet_size.unwrap_or(packet_size).to_le_bytes());
        b.extend_from_slice(&128_000u32.to_le_bytes());
        b
    }

    pub fn stream_properties(&self) -> Vec<u8> {
        let mut b = guid::AUDIO_MEDIA.as_bytes().to_vec();
        b.extend_from_slice(guid::AUDIO_SPREAD.as_bytes());
        b.extend_from_slice(&0u64.to_le_bytes());
        b.extend_from_slice(&(18 + WMA2_EXTRA.len() as u32).to_le_bytes());
        b.extend_from_slice(&8u32.to_le_bytes());
        b.extend_from_slice(&1u16.to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());

        b.extend_from_slice(&self.format_tag.to_le_bytes());
        b.extend_from_slice(&2u16.to_le_bytes());
        b.extend_from_slice(&44_100u32.to_le_bytes());
        b.extend_from_slice(&16_000u32.to_le_bytes());
        b.extend_from_slice(&2_973u16.to_le_bytes());
        b.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        b.extend_from_slice(&(WMA2_EXTRA.len() as u16).to_le_bytes());
        b.extend_from_slice(&WMA2_EXTRA);

        b.push(1);
        b.extend_from_slice(&2_973u16.to_le_bytes());
        b.extend_from_slice(&2_973u16.to_le_bytes());
        b.extend_from_slice(&1u16.to_le_bytes());
        b.push(0);
        b
    }

    fn data_object(&self, packet_size: u32) -> Vec<u8> {
        let mut body = vec![0x42; 16];
        body.extend_from_slice(&(self.packets.len() as u64).to_le_bytes());
        body.extend_from_slice(&0x0101u16.to_le_bytes());
        for p in &self.packets {
            let unpadded = self.encode_packet(p, 0).len() as u32;
            body.extend_from_slice(&self.encode_packet(p, packet_size - unpadded));
        }
        object(guid::DATA_OBJECT, &body)
    }

    pub fn encode_packet(&self, payloads: &[Vec<u8>], padding: u32) -> Vec<u8> {
        let mut b = Vec::new();
        if self.error_correction_prefix {
            b.extend_from_slice(&[0x82, 0x00, 0x00]);
        }
        // Multiple payloads, word-sized padding length.
        b.push(0x11);
        b.push(WMA_PROPERTY_FLAGS);
        b.extend_from_slice(&(padding as u16).to_le_bytes());
        b.extend_from_slice(&0u32.to_le_bytes());
        b.extend_from_slice(&0u16.to_le_bytes());
        b.push(0x80 | payloads.len() as u8);
        for (i, data) in payloads.iter().enumerate() {
            b.push(0x81);
            b.push(i as u8);
            b.extend_from_slice(&0u32.to_le_bytes());
            b.push(self.replicated_data_len);
            b.extend(std::iter::repeat(0u8).take(self.replicated_data_len as usize));
            b.extend_from_slice(&(data.len() as u16).to_le_bytes());
            b.extend_from_slice(data);
        }
        b.extend(std::iter::repeat(0u8).take(padding as usize));
        b
    }
}

pub fn object(guid: Guid, body: &[u8]) -> Vec<u8> {
    let mut b = guid.as_bytes().to_vec();
    b.extend_from_slice(&(24 + body.len() as u64).to_le_bytes());
    b.extend_from_slice(body);
    b
}

pub fn header_object(children: &[Vec<u8>]) -> Vec<u8> {
    let mut body = (children.len() as u32).to_le_bytes().to_vec();
    body.extend_from_slice(&[1, 2]);
    for c in children {
        body.extend_from_slice(c);
    }
    object(guid::HEADER_OBJECT, &body)
}

fn header_extension() -> Vec<u8> {
    let mut b = guid::RESERVED_1.as_bytes().to_vec();
    b.extend_from_slice(&6u16.to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());
    b
}

fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().chain(std::iter::once(0)).flat_map(|u| u.to_le_bytes()).collect()
}

fn codec_list() -> Vec<u8> {
    let name = "Windows Media Audio V2";
    let desc = "128 kbps, 44 kHz, stereo";
    let mut b = guid::RESERVED_2.as_bytes().to_vec();
    b.extend_from_slice(&1u32.to_le_bytes());
    b.extend_from_slice(&CODEC_TYPE_AUDIO.to_le_bytes());
    b.extend_from_slice(&(name.encode_utf16().count() as u16 + 1).to_le_bytes());
    b.extend_from_slice(&utf16(name));
    b.extend_from_slice(&(desc.encode_utf16().count() as u16 + 1).to_le_bytes());
    b.extend_from_slice(&utf16(desc));
    b.extend_from_slice(&2u16.to_le_bytes());
    b.extend_from_slice(&WAVE_FORMAT_WMAV2.to_le_bytes());
    b
}

fn content_description() -> Vec<u8> {
    let name = utf16("WM/EncodingSettings");
    let value = utf16("Lavf");
    let mut b = 1u16.to_le_bytes().to_vec();
    b.extend_from_slice(&(name.len() as u16).to_le_bytes());
    b.extend_from_slice(&name);
    b.extend_from_slice(&0u16.to_le_bytes());
    b.extend_from_slice(&(value.len() as u16).to_le_bytes());
    b.extend_from_slice(&value);
    b
}

/// Chunks following the 12-byte RIFF/WAVE header.
pub fn wave_chunks(bytes: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    let mut out = Vec::new();
    let mut i = 12;
    while i + 8 <= bytes.len() {
        let id: [u8; 4] = bytes[i..i + 4].try_into().unwrap();
        let len = u32::from_le_bytes(bytes[i + 4..i + 8].try_into().unwrap()) as usize;
        out.push((id, bytes[i + 8..i + 8 + len].to_vec()));
        i += 8 + len;
    }
    assert_eq!(i, bytes.len());
    out
}

pub fn dpds_entries(chunk: &[u8]) -> Vec<u32> {
    chunk
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}
