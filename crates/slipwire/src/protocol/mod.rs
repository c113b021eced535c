//! Wire frames and their integrity checks.
//!
//! Both frame layouts are fixed-size, alignment padding included: a data
//! frame is always [`DATA_FRAME_LEN`] bytes no matter how short its payload,
//! and an ACK is always [`ACK_FRAME_LEN`] bytes. The trailing 4-byte field
//! carries the CRC-16 of the zero-checksum frame image, big-endian, so
//! verification is a single re-check to zero.

use crate::consts::{ACK_FRAME_LEN, DATA_FRAME_LEN, PAYLOAD_MAX};
use bytes::Bytes;
use slipstream_binary::error::BinaryError;
use slipstream_binary::io::{BinaryReader, BinaryWriter};
use slipstream_binary::traits::{Readable, Writable};
use thiserror::Error;

pub mod crc;

use crc::crc16;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("datagram size {0} does not match any frame layout")]
    WrongSize(usize),
    #[error("checksum verification failed")]
    Checksum,
    #[error(transparent)]
    Binary(#[from] BinaryError),
}

/// A data frame: one application payload tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    seq: u8,
    payload: Bytes,
}

impl DataFrame {
    /// Builds a frame, truncating the payload to [`PAYLOAD_MAX`] bytes.
    pub fn new(seq: u8, mut payload: Bytes) -> Self {
        payload.truncate(PAYLOAD_MAX);
        Self { seq, payload }
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Encodes to the fixed wire layout with the checksum filled in.
    pub fn encode(&self) -> Bytes {
        let mut writer = BinaryWriter::with_capacity(DATA_FRAME_LEN);
        self.write(&mut writer)
            .expect("payload is truncated at construction");
        seal(writer)
    }

    /// Parses and verifies a received datagram.
    pub fn decode(datagram: &[u8]) -> Result<Self, FrameError> {
        let mut reader = verified(datagram, DATA_FRAME_LEN)?;
        Ok(Self::read(&mut reader)?)
    }
}

impl Writable for DataFrame {
    fn write(&self, writer: &mut BinaryWriter) -> Result<(), BinaryError> {
        if self.payload.len() > PAYLOAD_MAX {
            return Err(BinaryError::InvalidData(format!(
                "payload length {} out of range",
                self.payload.len()
            )));
        }
        writer.write_u8(self.seq);
        writer.write_zeros(3);
        writer.write_u32_le(self.payload.len() as u32);
        writer.write_bytes(&self.payload);
        // unused payload region plus the zeroed checksum field
        writer.write_zeros(PAYLOAD_MAX - self.payload.len() + 4);
        Ok(())
    }
}

impl Readable for DataFrame {
    fn read(reader: &mut BinaryReader) -> Result<Self, BinaryError> {
        let seq = reader.read_u8()?;
        reader.skip(3)?;
        let length = reader.read_u32_le()? as usize;
        if length > PAYLOAD_MAX {
            return Err(BinaryError::InvalidData(format!(
                "payload length {length} out of range"
            )));
        }
        let payload = reader.read_bytes(length)?;
        Ok(Self { seq, payload })
    }
}

/// A cumulative acknowledgement: every sequence number up to and including
/// `ack` inside the sender's open window is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFrame {
    pub ack: u8,
}

impl AckFrame {
    pub fn encode(&self) -> Bytes {
        let mut writer = BinaryWriter::with_capacity(ACK_FRAME_LEN);
        self.write(&mut writer)
            .expect("ack frame writes are fixed layout");
        seal(writer)
    }

    pub fn decode(datagram: &[u8]) -> Result<Self, FrameError> {
        let mut reader = verified(datagram, ACK_FRAME_LEN)?;
        Ok(Self::read(&mut reader)?)
    }
}

impl Writable for AckFrame {
    fn write(&self, writer: &mut BinaryWriter) -> Result<(), BinaryError> {
        writer.write_u8(self.ack);
        writer.write_zeros(3 + 4);
        Ok(())
    }
}

impl Readable for AckFrame {
    fn read(reader: &mut BinaryReader) -> Result<Self, BinaryError> {
        let ack = reader.read_u8()?;
        reader.skip(3)?;
        Ok(Self { ack })
    }
}

/// Overwrites the trailing zeroed checksum field with the big-endian CRC-16
/// of the frame, making the whole frame re-check to zero.
fn seal(writer: BinaryWriter) -> Bytes {
    let mut frame = writer.finish();
    let sum = crc16(&frame);
    let tail = frame.len() - 4;
    frame[tail..].copy_from_slice(&u32::from(sum).to_be_bytes());
    frame.freeze()
}

/// Size and integrity gate shared by both decoders.
fn verified(datagram: &[u8], expected_len: usize) -> Result<BinaryReader, FrameError> {
    if datagram.len() != expected_len {
        return Err(FrameError::WrongSize(datagram.len()));
    }
    if crc16(datagram) != 0 {
        return Err(FrameError::Checksum);
    }
    Ok(BinaryReader::new(Bytes::copy_from_slice(datagram)))
}
