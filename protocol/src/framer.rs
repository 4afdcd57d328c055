//! Splits a serial byte stream into packets.
//!
//! Outside a frame every byte other than [`PACKET_HEADER`] is dropped. Once
//! a header is seen the next six bytes are taken as they come, header
//! valued or not, and the seven are handed back as one [`Packet`].
//!
//! In [`FramingMode::Strict`] a completed frame must also carry a good
//! checksum. A bad one is not handed back: its header is dropped and the
//! six bytes behind it are searched again for the next header, so that a
//! byte lost upstream costs one packet rather than every packet until the
//! stream happens to line up again.

use crate::{ checksum, Packet, PACKET_HEADER, PACKET_SIZE };

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FramingMode {
    /// Every completed frame is emitted, the checksum is left to the caller.
    Lenient,
    /// Frames with a bad checksum are rejected and rescanned.
    Strict,
}

impl Default for FramingMode {
    fn default() -> Self {
        FramingMode::Lenient
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Idle,
    /// `position` bytes of the frame, header included, are buffered.
    Accumulating { position: usize },
}

#[derive(Clone, Debug)]
pub struct Framer {
    mode: FramingMode,
    buffer: [u8; PACKET_SIZE],
    // bytes of `buffer` in use, never left at PACKET_SIZE
    position: usize,
    rejected: u32,
}

impl Default for Framer {
    fn default() -> Self {
        Framer::new(FramingMode::default())
    }
}

impl Framer {
    pub fn new(mode: FramingMode) -> Self {
        Self { mode, buffer: [0; PACKET_SIZE], position: 0, rejected: 0 }
    }

    /// Takes one byte from the stream, returning a packet when it completes one.
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        if self.position == 0 && byte != PACKET_HEADER {
            return None;
        }

        self.buffer[self.position] = byte;
        self.position += 1;
        if self.position < PACKET_SIZE {
            return None;
        }

        let frame = self.buffer;
        self.position = 0;

        match self.mode {
            FramingMode::Lenient => Some(Packet::from_bytes(frame)),
            FramingMode::Strict if checksum::verify(&frame) => Some(Packet::from_bytes(frame)),
            FramingMode::Strict => {
                self.rejected = self.rejected.wrapping_add(1);
                self.rescan();
                None
            }
        }
    }

    // Drops the rejected header and keeps everything from the next header on.
    fn rescan(&mut self) {
        if let Some(start) = self.buffer[1..].iter().position(|b| *b == PACKET_HEADER) {
            let start = start + 1;
            self.buffer.copy_within(start.., 0);
            self.position = PACKET_SIZE - start;
        }
    }

    pub fn state(&self) -> State {
        match self.position {
            0 => State::Idle,
            position => State::Accumulating { position },
        }
    }

    /// Bytes of the current frame buffered so far, zero when idle.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Frames thrown away for a bad checksum. Always zero when lenient.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Drops any partial frame.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::{ consts::*, Vec };

    fn feed_all(framer: &mut Framer, bytes: &[u8]) -> Vec<Packet, U8> {
        let mut out = Vec::new();
        for byte in bytes {
            if let Some(packet) = framer.feed(*byte) {
                out.push(packet).unwrap();
            }
        }
        out
    }

    const FRAME : [u8; 7] = [0xAA, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

    #[test]
    fn starts_idle() {
        let framer = Framer::default();
        assert_eq!(framer.state(), State::Idle);
        assert_eq!(framer.position(), 0);
        assert_eq!(framer.mode(), FramingMode::Lenient);
    }

    #[test]
    fn one_exact_frame() {
        let mut framer = Framer::default();
        let packets = feed_all(&mut framer, &FRAME);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &FRAME);
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn leading_garbage_is_dropped() {
        let mut framer = Framer::default();
        let mut input = [0u8; 9];
        input[0] = 0x01;
        input[1] = 0x02;
        input[2..].copy_from_slice(&FRAME);
        let packets = feed_all(&mut framer, &input);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &FRAME);
    }

    #[test]
    fn partial_frame_persists() {
        let mut framer = Framer::default();
        assert!(feed_all(&mut framer, &FRAME[..3]).is_empty());
        assert_eq!(framer.state(), State::Accumulating { position: 3 });

        let packets = feed_all(&mut framer, &FRAME[3..]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &FRAME);
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn header_inside_frame_is_data() {
        let mut framer = Framer::default();
        let frame = [0xAA, 0xAA, 0xAA, 0x00, 0xAA, 0x00, 0xAA];
        let packets = feed_all(&mut framer, &frame);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &frame);
    }

    #[test]
    fn back_to_back_frames() {
        let mut framer = Framer::default();
        let mut input = [0u8; 14];
        input[..7].copy_from_slice(&FRAME);
        input[7..].copy_from_slice(&FRAME);
        assert_eq!(feed_all(&mut framer, &input).len(), 2);
    }

    #[test]
    fn lenient_ignores_checksum() {
        let mut framer = Framer::new(FramingMode::Lenient);
        let packets = feed_all(&mut framer, &FRAME);
        assert!(!packets[0].is_well_formed());
        assert_eq!(framer.rejected(), 0);
    }

    #[test]
    fn reset_drops_partial() {
        let mut framer = Framer::default();
        feed_all(&mut framer, &FRAME[..4]);
        framer.reset();
        assert_eq!(framer.state(), State::Idle);
        assert_eq!(framer.position(), 0);
        assert!(feed_all(&mut framer, &FRAME[4..]).is_empty());

        // a reset framer starts over cleanly
        let packets = feed_all(&mut framer, &FRAME);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &FRAME);
        framer.reset();
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn many_frames_in_a_row() {
        let mut framer = Framer::new(FramingMode::Strict);
        let good = [0xAA, 0x05, 0, 0, 0, 0, 0xAF];
        for _ in 0..100 {
            let packets = feed_all(&mut framer, &good);
            assert_eq!(packets.len(), 1);
            assert_eq!(framer.state(), State::Idle);
        }
    }

    #[test]
    fn strict_recovers_from_any_lost_byte() {
        let good = [0xAA, 0x05, 0, 0, 0, 0, 0xAF];
        for lost in 0..PACKET_SIZE {
            let mut framer = Framer::new(FramingMode::Strict);
            let mut damaged: Vec<u8, U8> = Vec::new();
            for (i, byte) in good.iter().enumerate() {
                if i != lost {
                    damaged.push(*byte).unwrap();
                }
            }
            feed_all(&mut framer, &damaged);
            let mut recovered = 0;
            for _ in 0..3 {
                for packet in feed_all(&mut framer, &good).iter() {
                    assert!(packet.is_well_formed());
                    recovered += 1;
                }
            }
            assert!(recovered >= 2, "lost byte {} recovered {}", lost, recovered);
        }
    }

    #[test]
    fn strict_passes_good_frames() {
        let mut framer = Framer::new(FramingMode::Strict);
        let good = [0xAA, 0x05, 0, 0, 0, 0, 0xAF];
        let packets = feed_all(&mut framer, &good);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &good);
        assert_eq!(framer.rejected(), 0);
    }

    #[test]
    fn strict_rejects_and_rescans() {
        let mut framer = Framer::new(FramingMode::Strict);
        // bad checksum, with a header three bytes in
        let bad = [0xAA, 0x01, 0xAA, 0x05, 0x00, 0x00, 0x00];
        assert!(feed_all(&mut framer, &bad).is_empty());
        assert_eq!(framer.rejected(), 1);
        assert_eq!(framer.state(), State::Accumulating { position: 5 });

        let packets = feed_all(&mut framer, &[0x00, 0xAF]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &[0xAA, 0x05, 0, 0, 0, 0, 0xAF]);
    }

    #[test]
    fn strict_goes_idle_without_another_header() {
        let mut framer = Framer::new(FramingMode::Strict);
        assert!(feed_all(&mut framer, &FRAME).is_empty());
        assert_eq!(framer.rejected(), 1);
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn dropped_byte_costs_one_packet_when_strict() {
        // first packet lost a data byte on the way in
        let input = [
            0xAA, 0x01, 0x00, 0x00, 0x00, 0xAB,
            0xAA, 0x05, 0x00, 0x00, 0x00, 0x00, 0xAF,
        ];

        let mut strict = Framer::new(FramingMode::Strict);
        let packets = feed_all(&mut strict, &input);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &[0xAA, 0x05, 0, 0, 0, 0, 0xAF]);

        let mut lenient = Framer::new(FramingMode::Lenient);
        let packets = feed_all(&mut lenient, &input);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_bytes(), &[0xAA, 0x01, 0, 0, 0, 0xAB, 0xAA]);
        assert_eq!(lenient.state(), State::Idle);
    }
}
