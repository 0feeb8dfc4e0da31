//! Well-known ASF object and type GUIDs.

use std::fmt;

/// A 16-byte GUID in its on-disk (mixed-endian) layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Build a GUID from its canonical `a-b-c-d` fields.
    ///
    /// The first three fields are stored little-endian, `d` is stored as-is.
    pub const fn from_fields(a: u32, b: u16, c: u16, d: [u8; 8]) -> Self {
        let a = a.to_le_bytes();
        let b = b.to_le_bytes();
        let c = c.to_le_bytes();
        Guid([
            a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], d[0], d[1], d[2], d[3], d[4], d[5],
            d[6], d[7],
        ])
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Human-readable name for registry members.
    pub fn name(&self) -> Option<&'static str> {
        REGISTRY.iter().find(|(g, _)| g == self).map(|(_, n)| *n)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}{:02X}{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12],
            b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Guid({name})"),
            None => write!(f, "Guid({self})"),
        }
    }
}

// ─── Top-level objects ───────────────────────────────────────────────────────

pub const HEADER_OBJECT: Guid =
    Guid::from_fields(0x75B22630, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
pub const DATA_OBJECT: Guid =
    Guid::from_fields(0x75B22636, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);

// ─── Header children ─────────────────────────────────────────────────────────

pub const FILE_PROPERTIES_OBJECT: Guid =
    Guid::from_fields(0x8CABDCA1, 0xA947, 0x11CF, [0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const STREAM_PROPERTIES_OBJECT: Guid =
    Guid::from_fields(0xB7DC0791, 0xA9B7, 0x11CF, [0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const HEADER_EXTENSION_OBJECT: Guid =
    Guid::from_fields(0x5FBF03B5, 0xA92E, 0x11CF, [0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const CODEC_LIST_OBJECT: Guid =
    Guid::from_fields(0x86D15240, 0x311D, 0x11D0, [0xA3, 0xA4, 0x00, 0xA0, 0xC9, 0x03, 0x48, 0xF6]);
pub const ERROR_CORRECTION_OBJECT: Guid =
    Guid::from_fields(0x75B22635, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
pub const EXTENDED_CONTENT_DESCRIPTION_OBJECT: Guid =
    Guid::from_fields(0xD2D0A440, 0xE307, 0x11D2, [0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50]);

// ─── Stream types ────────────────────────────────────────────────────────────

pub const AUDIO_MEDIA: Guid =
    Guid::from_fields(0xF8699E40, 0x5B4D, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);
pub const VIDEO_MEDIA: Guid =
    Guid::from_fields(0xBC19EFC0, 0x5B4D, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);

// ─── Error correction types ──────────────────────────────────────────────────

pub const NO_ERROR_CORRECTION: Guid =
    Guid::from_fields(0x20FB5700, 0x5B55, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);
pub const AUDIO_SPREAD: Guid =
    Guid::from_fields(0xBFC3CD50, 0x618F, 0x11CF, [0x8B, 0xB2, 0x00, 0xAA, 0x00, 0xB4, 0xE2, 0x20]);

// ─── Reserved markers ────────────────────────────────────────────────────────

/// Must follow the Header Extension Object header.
pub const RESERVED_1: Guid =
    Guid::from_fields(0xABD3D211, 0xA9BA, 0x11CF, [0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
/// Must follow the Codec List Object header.
pub const RESERVED_2: Guid =
    Guid::from_fields(0x86D15241, 0x311D, 0x11D0, [0xA3, 0xA4, 0x00, 0xA0, 0xC9, 0x03, 0x48, 0xF6]);

const REGISTRY: &[(Guid, &str)] = &[
    (HEADER_OBJECT, "ASF_Header_Object"),
    (DATA_OBJECT, "ASF_Data_Object"),
    (FILE_PROPERTIES_OBJECT, "ASF_File_Properties_Object"),
    (STREAM_PROPERTIES_OBJECT, "ASF_Stream_Properties_Object"),
    (HEADER_EXTENSION_OBJECT, "ASF_Header_Extension_Object"),
    (CODEC_LIST_OBJECT, "ASF_Codec_List_Object"),
    (ERROR_CORRECTION_OBJECT, "ASF_Error_Correction_Object"),
    (EXTENDED_CONTENT_DESCRIPTION_OBJECT, "ASF_Extended_Content_Description_Object"),
    (AUDIO_MEDIA, "ASF_Audio_Media"),
    (VIDEO_MEDIA, "ASF_Video_Media"),
    (NO_ERROR_CORRECTION, "ASF_No_Error_Correction"),
    (AUDIO_SPREAD, "ASF_Audio_Spread"),
    (RESERVED_1, "ASF_Reserved_1"),
    (RESERVED_2, "ASF_Reserved_2"),
];
