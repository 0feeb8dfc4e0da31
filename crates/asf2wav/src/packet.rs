//! Data Object packet demultiplexing.
//!
//! Only the packet shape produced by WMA2 encoders is accepted: fixed-size
//! packets with multiple payloads, no per-packet length or sequence fields,
//! 1-byte stream / media-object-number / replicated-data-length fields,
//! 4-byte offsets and 2-byte payload lengths.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{AsfError, Result};

/// Property flags value for the field widths listed above.
pub const WMA_PROPERTY_FLAGS: u8 = 0x5D;

const LENGTH_TYPE_BYTE: u8 = 1;
const LENGTH_TYPE_WORD: u8 = 2;
const LENGTH_TYPE_DWORD: u8 = 3;

// ─── Bit-packed flag bytes ───────────────────────────────────────────────────

/// Leading byte of a packet when error correction data is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCorrectionFlags {
    pub data_length: u8,
    pub opaque_data_present: bool,
    pub length_type: u8,
    pub present: bool,
}

impl ErrorCorrectionFlags {
    pub fn decode(b: u8) -> Self {
        Self {
            data_length: b & 0x0F,
            opaque_data_present: (b >> 4) & 1 != 0,
            length_type: (b >> 5) & 3,
            present: b >> 7 != 0,
        }
    }
}

/// Length type flags of the payload parsing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthTypeFlags {
    pub multiple_payloads: bool,
    pub sequence_type: u8,
    pub padding_length_type: u8,
    pub packet_length_type: u8,
    pub error_correction_present: bool,
}

impl LengthTypeFlags {
    pub fn decode(b: u8) -> Self {
        Self {
            multiple_payloads: b & 1 != 0,
            sequence_type: (b >> 1) & 3,
            padding_length_type: (b >> 3) & 3,
            packet_length_type: (b >> 5) & 3,
            error_correction_present: b >> 7 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyFlags {
    pub replicated_data_length_type: u8,
    pub offset_into_media_object_length_type: u8,
    pub media_object_number_length_type: u8,
    pub stream_number_length_type: u8,
}

impl PropertyFlags {
    pub fn decode(b: u8) -> Self {
        Self {
            replicated_data_length_type: b & 3,
            offset_into_media_object_length_type: (b >> 2) & 3,
            media_object_number_length_type: (b >> 4) & 3,
            stream_number_length_type: b >> 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFlags {
    pub count: u8,
    pub length_type: u8,
}

impl PayloadFlags {
    pub fn decode(b: u8) -> Self {
        Self {
            count: b & 0x3F,
            length_type: b >> 6,
        }
    }
}

// ─── Decoded packet contents ─────────────────────────────────────────────────

/// One compressed audio fragment, forwarded untouched to the WAVE `data` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub stream_number: u8,
    pub key_frame: bool,
    pub media_object_number: u8,
    pub offset_into_media_object: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DataPacket {
    pub send_time: u32,
    pub duration: u16,
    pub padding_length: u32,
    pub payloads: Vec<Payload>,
}

/// Per-run state the demultiplexer needs from the header walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketDemuxer {
    /// An Error Correction Object was declared in the Header Object.
    pub has_error_correction_object: bool,
    /// Fixed packet size from File Properties, when it was seen.
    pub packet_size: Option<u32>,
}

impl PacketDemuxer {
    pub fn new(has_error_correction_object: bool, packet_size: Option<u32>) -> Self {
        Self {
            has_error_correction_object,
            packet_size,
        }
    }

    /// Decode one data packet starting at the cursor.
    pub fn read_packet<R: Read + Seek>(&self, c: &mut ByteCursor<R>) -> Result<DataPacket> {
        let start = c.position();

        // The first byte is either error correction flags or the length type flags.
        let ec = ErrorCorrectionFlags::decode(c.peek_u8()?);
        if ec.present {
            c.read_u8()?;
            self.read_error_correction(c, ec)?;
        }

        let length_type = LengthTypeFlags::decode(c.read_u8()?);
        let property = c.read_u8()?;
        check_length_type(length_type)?;
        if property != WMA_PROPERTY_FLAGS {
            let p = PropertyFlags::decode(property);
            return Err(AsfError::Unsupported(format!("packet property flags {property:#04x} ({p:?})")));
        }

        // Read now, applied after the last payload.
        let padding_length = c.read_sized(length_type.padding_length_type)?;
        let send_time = c.read_u32()?;
        let duration = c.read_u16()?;

        if !length_type.multiple_payloads {
            return Err(AsfError::Unsupported("single-payload data packets".into()));
        }
        let payload_flags = PayloadFlags::decode(c.read_u8()?);
        if payload_flags.count == 0 {
            return Err(AsfError::InvalidData(format!("packet at offset {start} has no payloads")));
        }
        if payload_flags.length_type != LENGTH_TYPE_WORD {
            return Err(AsfError::Unsupported(format!(
                "payload length type {}",
                payload_flags.length_type
            )));
        }

        let mut payloads = Vec::with_capacity(payload_flags.count as usize);
        for _ in 0..payload_flags.count {
            payloads.push(read_payload(c)?);
        }

        c.skip_forward(padding_length as u64)?;

        let consumed = c.position() - start;
        if let Some(size) = self.packet_size {
            if consumed != size as u64 {
                log::warn!("packet at offset {start} spans {consumed} bytes, expected {size}");
            }
        }
        log::trace!(
            "packet @{start}: send {send_time} ms, {} payloads, {padding_length} padding",
            payloads.len()
        );

        Ok(DataPacket {
            send_time,
            duration,
            padding_length,
            payloads,
        })
    }

    fn read_error_correction<R: Read + Seek>(&self, c: &mut ByteCursor<R>, ec: ErrorCorrectionFlags) -> Result<()> {
        if ec.data_length != 2 || ec.opaque_data_present || ec.length_type != 0 {
            return Err(AsfError::InvalidData(format!("error correction flags {ec:?}")));
        }
        let type_number = c.read_u8()?;
        let cycle = c.read_u8()?;
        let ec_type = type_number & 0x0F;
        if ec_type != 0 || cycle != 0 {
            return Err(AsfError::Unsupported(format!(
                "packet error correction type {ec_type}, cycle {cycle}"
            )));
        }
        if self.has_error_correction_object {
            return Err(AsfError::Inconsistent(
                "packet error correction data alongside an Error Correction Object".into(),
            ));
        }
        Ok(())
    }
}

fn check_length_type(f: LengthTypeFlags) -> Result<()> {
    if f.error_correction_present {
        return Err(AsfError::InvalidData("length type flags bit 7 is set".into()));
    }
    if f.packet_length_type != 0 {
        return Err(AsfError::Unsupported(format!("packet length type {}", f.packet_length_type)));
    }
    if f.sequence_type != 0 {
        return Err(AsfError::Unsupported(format!("sequence type {}", f.sequence_type)));
    }
    Ok(())
}

fn read_payload<R: Read + Seek>(c: &mut ByteCursor<R>) -> Result<Payload> {
    let stream = c.read_u8()?;
    let media_object_number = c.read_sized(LENGTH_TYPE_BYTE)? as u8;
    let offset_into_media_object = c.read_sized(LENGTH_TYPE_DWORD)?;

    let replicated_len = c.read_u8()?;
    match replicated_len {
        0 | 8..=u8::MAX => c.skip_forward(replicated_len as u64)?,
        1 => return Err(AsfError::Unsupported("compressed payloads (replicated data length 1)".into())),
        n => return Err(AsfError::InvalidData(format!("replicated data length {n}"))),
    }

    let len = c.read_u16()?;
    if len == 0 {
        return Err(AsfError::InvalidData(format!("empty payload at offset {}", c.position())));
    }
    let data = c.read_bytes(len as usize)?;

    Ok(Payload {
        stream_number: stream & 0x7F,
        key_frame: stream & 0x80 != 0,
        media_object_number,
        offset_into_media_object,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn cursor(bytes: Vec<u8>) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::new(Cursor::new(bytes)).unwrap()
    }

    fn payload_bytes(replicated: &[u8], data: &[u8]) -> Vec<u8> {
        let mut b = vec![0x81, 0x00];
        b.extend_from_slice(&0u32.to_le_bytes());
        b.push(replicated.len() as u8);
        b.extend_from_slice(replicated);
        b.extend_from_slice(&(data.len() as u16).to_le_bytes());
        b.extend_from_slice(data);
        b
    }

    /// EC prefix, 1-byte padding length, `payloads` pre-encoded, then padding.
    fn packet(payloads: &[Vec<u8>], padding: u8) -> Vec<u8> {
        let mut b = vec![0x82, 0x00, 0x00, 0x09, WMA_PROPERTY_FLAGS, padding];
        b.extend_from_slice(&1500u32.to_le_bytes());
        b.extend_from_slice(&46u16.to_le_bytes());
        b.push(0x80 | payloads.len() as u8);
        for p in payloads {
            b.extend_from_slice(p);
        }
        b.extend(std::iter::repeat(0u8).take(padding as usize));
        b
    }

    #[test]
    fn flag_bytes_decode_by_bit_position() {
        let ec = ErrorCorrectionFlags::decode(0x82);
        assert!(ec.present);
        assert_eq!(ec.data_length, 2);
        assert_eq!(ec.length_type, 0);
        assert!(!ec.opaque_data_present);

        let lt = LengthTypeFlags::decode(0x11);
        assert!(lt.multiple_payloads);
        assert_eq!(lt.padding_length_type, 2);
        assert_eq!(lt.sequence_type, 0);
        assert_eq!(lt.packet_length_type, 0);

        let p = PropertyFlags::decode(WMA_PROPERTY_FLAGS);
        assert_eq!(p.replicated_data_length_type, 1);
        assert_eq!(p.offset_into_media_object_length_type, 3);
        assert_eq!(p.media_object_number_length_type, 1);
        assert_eq!(p.stream_number_length_type, 1);

        let pf = PayloadFlags::decode(0x83);
        assert_eq!(pf.count, 3);
        assert_eq!(pf.length_type, 2);
    }

    #[test]
    fn padding_is_skipped_after_payloads() {
        let bytes = packet(&[payload_bytes(&[], &[1, 2, 3]), payload_bytes(&[0; 8], &[4])], 5);
        let total = bytes.len() as u64;
        let mut c = cursor(bytes);
        let pkt = PacketDemuxer::default().read_packet(&mut c).unwrap();

        assert_eq!(pkt.padding_length, 5);
        assert_eq!(pkt.send_time, 1500);
        assert_eq!(pkt.payloads.len(), 2);
        assert_eq!(pkt.payloads[0].data, vec![1, 2, 3]);
        assert_eq!(pkt.payloads[1].data, vec![4]);
        assert!(pkt.payloads[0].key_frame);
        assert_eq!(pkt.payloads[0].stream_number, 1);
        assert_eq!(c.position(), total);
    }

    #[test]
    fn packet_without_error_correction_prefix() {
        let mut bytes = packet(&[payload_bytes(&[], &[9; 4])], 0);
        bytes.drain(..3);
        let mut c = cursor(bytes);
        let pkt = PacketDemuxer::default().read_packet(&mut c).unwrap();
        assert_eq!(pkt.payloads[0].data, vec![9; 4]);
        assert!(c.is_eof());
    }

    #[test]
    fn replicated_data_length_boundaries() {
        for len in [1usize, 2, 7] {
            let mut c = cursor(packet(&[payload_bytes(&vec![0; len], &[1])], 0));
            assert!(PacketDemuxer::default().read_packet(&mut c).is_err(), "length {len}");
        }
        let mut c = cursor(packet(&[payload_bytes(&[0; 8], &[1])], 0));
        assert!(PacketDemuxer::default().read_packet(&mut c).is_ok());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let mut c = cursor(packet(&[payload_bytes(&[], &[])], 0));
        assert!(matches!(
            PacketDemuxer::default().read_packet(&mut c),
            Err(AsfError::InvalidData(_))
        ));
    }

    #[test]
    fn error_correction_conflicts_with_header_object() {
        let mut c = cursor(packet(&[payload_bytes(&[], &[1])], 0));
        assert!(matches!(
            PacketDemuxer::new(true, None).read_packet(&mut c),
            Err(AsfError::Inconsistent(_))
        ));

        let mut bytes = packet(&[payload_bytes(&[], &[1])], 0);
        bytes[1] = 0x01;
        assert!(matches!(
            PacketDemuxer::default().read_packet(&mut cursor(bytes)),
            Err(AsfError::Unsupported(_))
        ));
    }

    #[test]
    fn profile_field_widths_are_enforced() {
        let mut single = packet(&[payload_bytes(&[], &[1])], 0);
        single[3] = 0x08;
        assert!(matches!(
            PacketDemuxer::default().read_packet(&mut cursor(single)),
            Err(AsfError::Unsupported(_))
        ));

        let mut property = packet(&[payload_bytes(&[], &[1])], 0);
        property[4] = 0x59;
        assert!(PacketDemuxer::default().read_packet(&mut cursor(property)).is_err());

        let mut zero = packet(&[payload_bytes(&[], &[1])], 0);
        zero[12] = 0x80;
        assert!(matches!(
            PacketDemuxer::default().read_packet(&mut cursor(zero)),
            Err(AsfError::InvalidData(_))
        ));
    }

    #[test]
    fn truncated_payload_is_fatal() {
        let mut bytes = packet(&[payload_bytes(&[], &[1, 2, 3, 4])], 0);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            PacketDemuxer::default().read_packet(&mut cursor(bytes)),
            Err(AsfError::Truncated { .. })
        ));
    }
}
