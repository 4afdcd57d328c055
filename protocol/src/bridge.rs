//! Drives the [`Framer`] from a serial port and hands each packet to the radio.
//!
//! The serial port is anything implementing `embedded_hal::serial::Read<u8>`;
//! `WouldBlock` means no byte is waiting. The radio is anything implementing
//! [`Transmit`]. Diagnostics go to a `core::fmt::Write` console and a failure
//! to write them is ignored.

use core::fmt::{ self, Write };

use embedded_hal::{ blocking::delay::DelayMs, serial::Read };

use crate::{
    build, build_with_data, BridgeConfig, Framer, Packet, IDLE_WAIT_MS,
};

/// A radio that can send one packet.
///
/// Blocking and retries are up to the implementation. `Err` means the packet
/// did not get through; the bridge does not try again.
pub trait Transmit {
    type Error: fmt::Debug + fmt::Display;

    fn transmit(&mut self, packet: &Packet) -> Result<(), Self::Error>;
}

/// What to do with the bytes of a received frame beyond header and command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ForwardPolicy {
    /// Send header and command with zeroed data and a fresh checksum. The
    /// received data and checksum are discarded.
    CommandOnly,
    /// Send the received data bytes too, with a fresh checksum.
    ForwardPayload,
}

impl Default for ForwardPolicy {
    fn default() -> Self {
        ForwardPolicy::CommandOnly
    }
}

impl ForwardPolicy {
    pub fn outbound(&self, received: &Packet) -> Packet {
        match self {
            ForwardPolicy::CommandOnly => build(received.header(), received.command()),
            ForwardPolicy::ForwardPayload =>
                build_with_data(received.header(), received.command(), received.data()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub bytes: u32,
    pub frames: u32,
    pub rejected: u32,
    pub transmitted: u32,
    pub failed: u32,
    pub serial_errors: u32,
}

pub struct Bridge<Src, Radio, Console> {
    source: Src,
    radio: Radio,
    console: Console,
    framer: Framer,
    policy: ForwardPolicy,
    stats: Stats,
}

impl<Src, Radio, Console> Bridge<Src, Radio, Console>
where
    Src: Read<u8>,
    Src::Error: fmt::Debug,
    Radio: Transmit,
    Console: Write,
{
    pub fn new(source: Src, radio: Radio, console: Console, config: BridgeConfig) -> Self {
        Self {
            source,
            radio,
            console,
            framer: Framer::new(config.mode),
            policy: config.policy,
            stats: Stats::default(),
        }
    }

    /// Reads until the serial port has nothing more, forwarding every packet
    /// completed on the way. Returns the number of bytes read.
    pub fn poll(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.source.read() {
                Ok(byte) => {
                    count += 1;
                    self.stats.bytes = self.stats.bytes.wrapping_add(1);
                    self.feed(byte);
                }
                Err(nb::Error::WouldBlock) => return count,
                Err(nb::Error::Other(e)) => {
                    self.stats.serial_errors = self.stats.serial_errors.wrapping_add(1);
                    let _ = writeln!(self.console, "Serial error: {:?}", e);
                }
            }
        }
    }

    fn feed(&mut self, byte: u8) {
        let rejected = self.framer.rejected();
        if let Some(frame) = self.framer.feed(byte) {
            self.handle_frame(&frame);
        } else if self.framer.rejected() != rejected {
            self.stats.rejected = self.stats.rejected.wrapping_add(1);
            let _ = writeln!(self.console, "Rejected packet, bad checksum");
        }
    }

    /// Rebuilds `frame` according to the forward policy and transmits it once.
    /// Returns whether the radio took it.
    pub fn handle_frame(&mut self, frame: &Packet) -> bool {
        self.stats.frames = self.stats.frames.wrapping_add(1);
        let b = frame.as_bytes();
        let _ = writeln!(self.console, "packet {}, {}, {}, {}, {}, {}, {}", b[0], b[1], b[2], b[3], b[4], b[5], b[6]);

        let packet = self.policy.outbound(frame);
        match self.radio.transmit(&packet) {
            Ok(()) => {
                self.stats.transmitted = self.stats.transmitted.wrapping_add(1);
                let _ = writeln!(self.console, "Transmitted packet: {}", packet);
                true
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                let _ = writeln!(self.console, "Failed to transmit packet: {}", e);
                false
            }
        }
    }

    /// Polls forever, waiting [`IDLE_WAIT_MS`] whenever the port runs dry.
    pub fn run<D: DelayMs<u8>>(&mut self, delay: &mut D) -> ! {
        loop {
            self.poll();
            delay.delay_ms(IDLE_WAIT_MS);
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn source_mut(&mut self) -> &mut Src {
        &mut self.source
    }

    pub fn radio(&self) -> &Radio {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut Radio {
        &mut self.radio
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn release(self) -> (Src, Radio, Console) {
        (self.source, self.radio, self.console)
    }
}
