use core::fmt;

use crate::{ bridge::ForwardPolicy, framer::FramingMode, FREQUENCY, PACKET_SIZE, TX_ADDRESS };

/// Highest channel the nRF24L01 accepts, 2400 + 125 MHz.
pub const MAX_CHANNEL : u8 = 125;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConfigError {
    ChannelOutOfRange { channel: u8 },
    PayloadSizeMismatch { size: u8 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ChannelOutOfRange { channel } =>
                write!(f, "channel {} out of range, should be 0 to {}", channel, MAX_CHANNEL),
            ConfigError::PayloadSizeMismatch { size } =>
                write!(f, "payload size {} does not match packet size {}", size, PACKET_SIZE),
        }
    }
}

/// What the radio is told once at startup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RadioConfig {
    pub channel: u8,
    pub payload_size: u8,
    pub address: [u8; 5],
}

impl RadioConfig {
    pub fn new(channel: u8, address: [u8; 5]) -> Result<Self, ConfigError> {
        let config = RadioConfig { channel, payload_size: PACKET_SIZE as u8, address };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel > MAX_CHANNEL {
            return Err(ConfigError::ChannelOutOfRange { channel: self.channel });
        }
        if self.payload_size as usize != PACKET_SIZE {
            return Err(ConfigError::PayloadSizeMismatch { size: self.payload_size });
        }
        Ok(())
    }

    /// Receive payload widths for the six pipes. Every pipe is fixed at
    /// `payload_size`; leaving one unset turns on dynamic payload length.
    pub fn pipe_lengths(&self) -> [Option<u8>; 6] {
        [Some(self.payload_size); 6]
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig { channel: FREQUENCY, payload_size: PACKET_SIZE as u8, address: TX_ADDRESS }
    }
}

/// How the bridge treats what it receives.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct BridgeConfig {
    pub mode: FramingMode,
    pub policy: ForwardPolicy,
}
