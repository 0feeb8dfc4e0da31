//! ASF object walker.
//!
//! Top-level objects are visited in file order. The Header Object expands
//! into its children and the Data Object into its packets; anything else is
//! skipped by its declared size.

use std::io::{Read, Seek};

use crate::config::ConvertConfig;
use crate::cursor::ByteCursor;
use crate::error::{AsfError, Result};
use crate::guid::{self, Guid};
use crate::header::{
    read_codec_list, read_extended_content_description, read_file_properties, read_header_extension,
    read_stream_properties, CodecEntry, ContentDescriptor, FileProperties, StreamProperties,
};
use crate::packet::{PacketDemuxer, Payload};

/// GUID + 64-bit size.
pub const OBJECT_HEADER_SIZE: u64 = 24;

const DATA_OBJECT_RESERVED: u16 = 0x0101;

#[derive(Debug, Clone, Copy)]
pub struct ObjectHeader {
    pub guid: Guid,
    pub size: u64,
}

impl ObjectHeader {
    pub fn read<R: Read + Seek>(c: &mut ByteCursor<R>) -> Result<Self> {
        let offset = c.position();
        let guid = c.read_guid()?;
        let size = c.read_u64()?;
        if size < OBJECT_HEADER_SIZE {
            return Err(AsfError::InvalidData(format!(
                "object {guid:?} at offset {offset} declares size {size} < {OBJECT_HEADER_SIZE}"
            )));
        }
        Ok(Self { guid, size })
    }

    pub fn body_len(&self) -> u64 {
        self.size - OBJECT_HEADER_SIZE
    }
}

/// Where an object sat in the input; `depth` is 0 for top-level objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSpan {
    pub guid: Guid,
    pub offset: u64,
    pub size: u64,
    pub depth: u8,
}

impl ObjectSpan {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataObjectInfo {
    pub file_id: Guid,
    pub total_data_packets: u64,
}

/// Everything the walk extracted from one ASF file.
#[derive(Debug, Default)]
pub struct AsfFile {
    pub file_properties: Option<FileProperties>,
    pub stream: Option<StreamProperties>,
    pub has_header_extension: bool,
    pub content_descriptors: Vec<ContentDescriptor>,
    pub codecs: Vec<CodecEntry>,
    pub has_error_correction_object: bool,
    pub data: Option<DataObjectInfo>,
    pub packet_count: u64,
    /// Audio payloads of every packet, in file order.
    pub payloads: Vec<Payload>,
    pub objects: Vec<ObjectSpan>,
}

impl AsfFile {
    /// Walk the whole input and decode every object this profile knows.
    pub fn parse<R: Read + Seek>(reader: R, config: &ConvertConfig) -> Result<Self> {
        ObjectWalker::new(ByteCursor::new(reader)?, config).walk()
    }

    pub fn payload_bytes(&self) -> u64 {
        self.payloads.iter().map(|p| p.data.len() as u64).sum()
    }
}

pub struct ObjectWalker<'a, R> {
    cursor: ByteCursor<R>,
    config: &'a ConvertConfig,
    file: AsfFile,
}

impl<'a, R: Read + Seek> ObjectWalker<'a, R> {
    pub fn new(cursor: ByteCursor<R>, config: &'a ConvertConfig) -> Self {
        Self {
            cursor,
            config,
            file: AsfFile::default(),
        }
    }

    pub fn walk(mut self) -> Result<AsfFile> {
        if self.cursor.is_eof() {
            return Err(AsfError::InvalidData("Not an ASF file: input is empty".into()));
        }
        while !self.cursor.is_eof() {
            let offset = self.cursor.position();
            let hdr = ObjectHeader::read(&mut self.cursor)?;
            if self.file.objects.is_empty() && hdr.guid != guid::HEADER_OBJECT {
                return Err(AsfError::InvalidData(format!(
                    "Not an ASF file: first object is {:?}, expected the Header Object",
                    hdr.guid
                )));
            }
            self.record(&hdr, offset, 0);
            log::debug!("object {:?} @{offset}, {} bytes", hdr.guid, hdr.size);

            match hdr.guid {
                guid::HEADER_OBJECT => self.read_header_object(offset, &hdr)?,
                guid::DATA_OBJECT => self.read_data_object()?,
                _ => self.cursor.skip_forward(hdr.body_len())?,
            }
            self.settle(offset, &hdr)?;
        }

        if self.file.data.is_none() {
            return Err(AsfError::InvalidData("Expected an ASF Data Object after the header".into()));
        }
        Ok(self.file)
    }

    fn record(&mut self, hdr: &ObjectHeader, offset: u64, depth: u8) {
        self.file.objects.push(ObjectSpan {
            guid: hdr.guid,
            offset,
            size: hdr.size,
            depth,
        });
    }

    /// Leave the cursor exactly at the end of the object that started at `offset`.
    fn settle(&mut self, offset: u64, hdr: &ObjectHeader) -> Result<()> {
        let end = offset
            .checked_add(hdr.size)
            .ok_or_else(|| AsfError::InvalidData(format!("object size {} overflows", hdr.size)))?;
        let pos = self.cursor.position();
        if pos > end {
            return Err(AsfError::InvalidData(format!(
                "object {:?} at offset {offset} overran its declared end {end} (now at {pos})",
                hdr.guid
            )));
        }
        if pos < end {
            log::debug!("skipping {} trailing bytes of {:?}", end - pos, hdr.guid);
            self.cursor.skip_forward(end - pos)?;
        }
        Ok(())
    }

    fn read_header_object(&mut self, offset: u64, hdr: &ObjectHeader) -> Result<()> {
        let num_objects = self.cursor.read_u32()?;
        let reserved1 = self.cursor.read_u8()?;
        let reserved2 = self.cursor.read_u8()?;
        if reserved1 != 1 || reserved2 != 2 {
            return Err(AsfError::InvalidData(format!(
                "header object reserved bytes are {reserved1:#04x} {reserved2:#04x}"
            )));
        }

        let header_end = offset.saturating_add(hdr.size);
        for _ in 0..num_objects {
            let child_offset = self.cursor.position();
            let child = ObjectHeader::read(&mut self.cursor)?;
            if child_offset.saturating_add(child.size) > header_end {
                return Err(AsfError::InvalidData(format!(
                    "header child {:?} at offset {child_offset} extends past the Header Object",
                    child.guid
                )));
            }
            self.record(&child, child_offset, 1);
            log::debug!("  header child {:?} @{child_offset}, {} bytes", child.guid, child.size);

            self.read_header_child(&child)?;
            self.settle(child_offset, &child)?;
        }
        Ok(())
    }

    fn read_header_child(&mut self, child: &ObjectHeader) -> Result<()> {
        let c = &mut self.cursor;
        match child.guid {
            guid::FILE_PROPERTIES_OBJECT => {
                self.file.file_properties = Some(read_file_properties(c)?);
            }
            guid::STREAM_PROPERTIES_OBJECT => {
                if self.file.stream.is_some() {
                    return Err(AsfError::Unsupported("more than one stream".into()));
                }
                self.file.stream = Some(read_stream_properties(c)?);
            }
            guid::HEADER_EXTENSION_OBJECT => {
                read_header_extension(c)?;
                self.file.has_header_extension = true;
            }
            guid::EXTENDED_CONTENT_DESCRIPTION_OBJECT => {
                let descs = read_extended_content_description(c, self.config.max_name_bytes)?;
                self.file.content_descriptors.extend(descs);
            }
            guid::CODEC_LIST_OBJECT => {
                let codecs = read_codec_list(c, self.config.max_name_bytes)?;
                self.file.codecs.extend(codecs);
            }
            guid::ERROR_CORRECTION_OBJECT => {
                self.file.has_error_correction_object = true;
                c.skip_forward(child.body_len())?;
            }
            _ => c.skip_forward(child.body_len())?,
        }
        Ok(())
    }

    fn read_data_object(&mut self) -> Result<()> {
        let file_id = self.cursor.read_guid()?;
        let total_data_packets = self.cursor.read_u64()?;
        let reserved = self.cursor.read_u16()?;
        if reserved != DATA_OBJECT_RESERVED {
            return Err(AsfError::InvalidData(format!("data object reserved field {reserved:#06x}")));
        }

        let props = self.file.file_properties.as_ref();
        if let Some(p) = props {
            if p.data_packets_count != total_data_packets {
                log::warn!(
                    "data object holds {total_data_packets} packets, file properties say {}",
                    p.data_packets_count
                );
            }
        }
        let demuxer = PacketDemuxer::new(self.file.has_error_correction_object, props.map(|p| p.packet_size()));

        for _ in 0..total_data_packets {
            let packet = demuxer.read_packet(&mut self.cursor)?;
            self.file.payloads.extend(packet.payloads);
            self.file.packet_count += 1;
        }

        self.file.data = Some(DataObjectInfo {
            file_id,
            total_data_packets,
        });
        Ok(())
    }
}
