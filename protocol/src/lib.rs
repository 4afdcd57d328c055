#![cfg_attr(not(feature = "use-std"), no_std)]
//! Serial to radio packet bridge.
//!
//! Bytes arriving on a serial link are framed into fixed 7 byte packets
//! starting with [`PACKET_HEADER`], rebuilt with a fresh XOR checksum and
//! handed to a radio transmitter, one transmit per packet.

pub mod bridge;
pub mod checksum;
pub mod config;
pub mod framer;
pub mod packet;

pub use bridge::{ Bridge, ForwardPolicy, Stats, Transmit };
pub use checksum::{ checksum, Checksum };
pub use config::{ BridgeConfig, ConfigError, RadioConfig };
pub use framer::{ Framer, FramingMode, State };
pub use packet::{ build, build_into, build_with_data, Packet };

/// Number of bytes in every frame, on the wire and over the air.
pub const PACKET_SIZE : usize = 7;
pub const HEADER_INDEX : usize = 0;
pub const COMMAND_INDEX : usize = 1;
pub const CHECKSUM_INDEX : usize = 6;
/// Reserved bytes, zero on transmit unless the payload is forwarded.
pub const DATA_RANGE : core::ops::Range<usize> = 2..CHECKSUM_INDEX;
pub const DATA_SIZE : usize = CHECKSUM_INDEX - 2;

/// Marks the start of a frame.
pub const PACKET_HEADER : u8 = 0xAA;

pub const FREQUENCY : u8 = 76;
pub const TX_ADDRESS : [u8;5] = [ 0xE7, 0xE7, 0xE7, 0xE7, 0xE7 ];

pub const SERIAL_BAUD : u32 = 115_200;

// Time to wait when the serial port has nothing for us.
pub const IDLE_WAIT_MS : u8 = 1;

#[test]
fn reserved_layout() {
    assert_eq!(DATA_RANGE.len(), DATA_SIZE);
    assert_eq!(HEADER_INDEX + 1, COMMAND_INDEX);
    assert_eq!(CHECKSUM_INDEX, PACKET_SIZE - 1);
}
