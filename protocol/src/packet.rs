// The wire and air format:
//
// | offset | meaning  |
// |--------|----------|
// | 0      | header, always PACKET_HEADER |
// | 1      | command  |
// | 2..6   | data, zero unless forwarded |
// | 6      | XOR of bytes 0..6 |

use core::fmt;

use crate::{
    checksum::{ self, checksum },
    CHECKSUM_INDEX, COMMAND_INDEX, DATA_RANGE, DATA_SIZE, HEADER_INDEX, PACKET_SIZE,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Packet([u8; PACKET_SIZE]);

impl Packet {
    /// Wraps received bytes as they are. Nothing is checked.
    pub const fn from_bytes(bytes: [u8; PACKET_SIZE]) -> Self {
        Packet(bytes)
    }

    pub fn header(&self) -> u8 {
        self.0[HEADER_INDEX]
    }

    pub fn command(&self) -> u8 {
        self.0[COMMAND_INDEX]
    }

    pub fn data(&self) -> [u8; DATA_SIZE] {
        let mut data = [0u8; DATA_SIZE];
        data.copy_from_slice(&self.0[DATA_RANGE]);
        data
    }

    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUM_INDEX]
    }

    pub fn is_well_formed(&self) -> bool {
        checksum::verify(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }
}

impl From<Packet> for [u8; PACKET_SIZE] {
    fn from(packet: Packet) -> Self {
        packet.0
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:#04X}", byte)?;
        }
        f.write_str("]")
    }
}

/// Fills `out` with `header`, `command`, four zero bytes and the checksum.
pub fn build_into(header: u8, command: u8, out: &mut [u8; PACKET_SIZE]) {
    out[HEADER_INDEX] = header;
    out[COMMAND_INDEX] = command;
    for byte in &mut out[DATA_RANGE] {
        *byte = 0;
    }
    out[CHECKSUM_INDEX] = checksum(&out[..CHECKSUM_INDEX]);
}

pub fn build(header: u8, command: u8) -> Packet {
    build_with_data(header, command, [0; DATA_SIZE])
}

/// Like [`build`], but the data bytes are carried instead of zeroed.
pub fn build_with_data(header: u8, command: u8, data: [u8; DATA_SIZE]) -> Packet {
    let mut bytes = [0u8; PACKET_SIZE];
    bytes[HEADER_INDEX] = header;
    bytes[COMMAND_INDEX] = command;
    bytes[DATA_RANGE].copy_from_slice(&data);
    bytes[CHECKSUM_INDEX] = checksum(&bytes[..CHECKSUM_INDEX]);
    Packet(bytes)
}
