// Every packet ends with a single byte, the XOR of all the bytes preceding it.

use crate::{ CHECKSUM_INDEX, PACKET_SIZE };

/// Running XOR, fed one byte at a time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum(u8);

impl Checksum {
    pub fn update(&mut self, value: u8) {
        self.0 ^= value;
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// XOR of every byte in `data`.
///
/// To checksum the first `length` bytes of a buffer pass `&buf[..length]`.
pub fn checksum(data: &[u8]) -> u8 {
    let mut sum = Checksum::default();
    for byte in data {
        sum.update(*byte);
    }
    sum.value()
}

/// True when the last byte is the checksum of the six before it.
pub fn verify(packet: &[u8; PACKET_SIZE]) -> bool {
    checksum(&packet[..CHECKSUM_INDEX]) == packet[CHECKSUM_INDEX]
}
