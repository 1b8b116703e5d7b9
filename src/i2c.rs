//! I2C master emulated on the MPSSE pin bank.
//!
//! Line assignment on ADBUS:
//!
//! | bit | signal                     |
//! |-----|----------------------------|
//! | 0   | SCL                        |
//! | 1   | SDA out                    |
//! | 2   | SDA in (always an input)   |
//! | 3-7 | unused, driven low         |
//!
//! Open-drain behaviour is emulated by switching SDA out between output and
//! input. With loopback enabled SDA in observes whatever SDA out drives.

use crate::mpsse::{ClockEdge, CommandBuffer, EncodingError, PinFrame};

/// Number of times each pin state is written during start, stop and the
/// post-ACK restore.
///
/// One `SetLowPins` lasts a single MPSSE step; repeating it stretches the
/// setup and hold times. Tuning constant, not part of I2C.
pub const PIN_HOLD_REPEATS: usize = 3;

const OUTPUTS: u8 = 0b1111_1011;
const OUTPUTS_SDA_RELEASED: u8 = 0b1111_1001;

/// Both lines high: bus idle.
pub const IDLE: PinFrame = PinFrame::new(0b0000_0011, OUTPUTS);
/// SCL high, SDA low.
pub const SDA_LOW: PinFrame = PinFrame::new(0b0000_0001, OUTPUTS);
/// SCL and SDA low.
pub const BOTH_LOW: PinFrame = PinFrame::new(0b0000_0000, OUTPUTS);
/// SCL low, SDA out tri-stated so the slave can drive the ACK.
pub const SDA_RELEASED: PinFrame = PinFrame::new(0b0000_0000, OUTPUTS_SDA_RELEASED);
/// SCL low, SDA driven high again.
pub const SCL_LOW_SDA_HIGH: PinFrame = PinFrame::new(0b0000_0010, OUTPUTS);

const SET_PINS_LEN: usize = 3;

/// Encoded length of [`start`].
pub const START_LEN: usize = 3 * PIN_HOLD_REPEATS * SET_PINS_LEN;
/// Encoded length of [`stop`].
pub const STOP_LEN: usize = 3 * PIN_HOLD_REPEATS * SET_PINS_LEN;
/// Encoded length of [`write_byte_read_ack`].
pub const BYTE_LEN: usize = 4 + SET_PINS_LEN + 2 + 1 + PIN_HOLD_REPEATS * SET_PINS_LEN;

fn hold(buf: &mut CommandBuffer, pins: PinFrame) {
    for _ in 0..PIN_HOLD_REPEATS {
        buf.set_low_pins(pins);
    }
}

/// Start condition: SDA falls while SCL is high, then SCL falls.
pub fn start(buf: &mut CommandBuffer) {
    hold(buf, IDLE);
    hold(buf, SDA_LOW);
    hold(buf, BOTH_LOW);
}

/// Stop condition: SDA rises while SCL is high, leaving the bus idle.
pub fn stop(buf: &mut CommandBuffer) {
    hold(buf, BOTH_LOW);
    hold(buf, SDA_LOW);
    hold(buf, IDLE);
}

/// Sends `byte` and clocks the slave's ACK bit.
///
/// Data changes on the falling edge so it is stable when SCL rises. The ACK is
/// sampled on the rising edge with SDA out released, and the sampled bit is
/// flushed to the host's read buffer. Its value is not inspected here.
pub fn write_byte_read_ack(buf: &mut CommandBuffer, byte: u8) -> Result<(), EncodingError> {
    buf.write_bytes(ClockEdge::Falling, &[byte])?;
    buf.set_low_pins(SDA_RELEASED);
    buf.read_bits(ClockEdge::Rising, 1)?;
    buf.send_immediate();
    hold(buf, SCL_LOW_SDA_HIGH);
    Ok(())
}

/// Encoded length of a write transaction carrying `payload` bytes after the
/// address byte.
pub const fn encoded_len(payload: usize) -> usize {
    START_LEN + (1 + payload) * BYTE_LEN + STOP_LEN
}

/// A write transaction to one device.
///
/// Opened with the start condition and address byte, closed only by
/// [`Transaction::finish`] which appends the stop condition.
#[derive(Debug)]
pub struct Transaction {
    buf: CommandBuffer,
    acks: usize,
}

impl Transaction {
    /// Opens a write transaction to the 7-bit `address`.
    ///
    /// `payload_hint` is the number of bytes that will follow; the buffer is
    /// sized for it up front.
    pub fn write(address: u8, payload_hint: usize) -> Result<Self, EncodingError> {
        if address > 0x7F {
            return Err(EncodingError::Address(address));
        }
        let mut buf = CommandBuffer::with_capacity(encoded_len(payload_hint));
        start(&mut buf);
        write_byte_read_ack(&mut buf, address << 1)?;
        Ok(Self { buf, acks: 1 })
    }

    pub fn byte(&mut self, byte: u8) -> Result<&mut Self, EncodingError> {
        write_byte_read_ack(&mut self.buf, byte)?;
        self.acks += 1;
        Ok(self)
    }

    pub fn bytes(&mut self, data: &[u8]) -> Result<&mut Self, EncodingError> {
        for &byte in data {
            self.byte(byte)?;
        }
        Ok(self)
    }

    /// Number of ACK bytes the bridge will queue for the host once this
    /// transaction has been written.
    pub fn ack_bytes(&self) -> usize {
        self.acks
    }

    /// Appends the stop condition and returns the encoded stream.
    pub fn finish(mut self) -> CommandBuffer {
        stop(&mut self.buf);
        self.buf
    }
}
