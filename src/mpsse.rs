//! MPSSE command encoder.
//!
//! Translates serial bus operations into the opcode stream understood by the
//! FTDI Multi-Protocol Synchronous Serial Engine (see FTDI AN_108). Nothing in
//! here touches a device: every method appends bytes to a [`CommandBuffer`]
//! which is handed to a [`Channel`](crate::interface::Channel) in one write.
//!
//! All data is clocked most significant bit first. The LSB-first opcode
//! variants are deliberately not exposed.

/// Largest transfer a single byte-clocking command can carry.
pub const MAX_BYTES_PER_COMMAND: usize = 65_536;

/// Largest transfer a single bit-clocking command can carry.
pub const MAX_BITS_PER_COMMAND: u8 = 8;

/// MPSSE command opcodes (AN_108).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    WriteBytesRising = 0x10,
    WriteBytesFalling = 0x11,
    WriteBitsRising = 0x12,
    WriteBitsFalling = 0x13,
    ReadBytesRising = 0x20,
    ReadBitsRising = 0x22,
    ReadBytesFalling = 0x24,
    ReadBitsFalling = 0x26,
    SetLowPins = 0x80,
    ReadLowPins = 0x81,
    SetHighPins = 0x82,
    ReadHighPins = 0x83,
    LoopbackOn = 0x84,
    LoopbackOff = 0x85,
    SetClockDivisor = 0x86,
    SendImmediate = 0x87,
    DisableDivideBy5 = 0x8A,
    EnableDivideBy5 = 0x8B,
    EnableThreePhaseClocking = 0x8C,
    DisableThreePhaseClocking = 0x8D,
    EnableAdaptiveClocking = 0x96,
    DisableAdaptiveClocking = 0x97,
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

/// Clock edge on which data is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEdge {
    Rising,
    Falling,
}

/// State of the eight low-byte (ADBUS) lines.
///
/// `value` is the logic level driven on each output, `direction` has a `1`
/// for every line configured as an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFrame {
    pub value: u8,
    pub direction: u8,
}

impl PinFrame {
    pub const fn new(value: u8, direction: u8) -> Self {
        Self { value, direction }
    }
}

/// Invalid operand passed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("byte count {0} outside 1..=65536")]
    ByteCount(usize),
    #[error("bit count {0} outside 1..=8")]
    BitCount(u8),
    #[error("clock frequency {0} Hz not reachable")]
    ClockFrequency(u32),
    #[error("I2C address 0x{0:02x} does not fit in 7 bits")]
    Address(u8),
}

/// Append-only MPSSE command stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn op(&mut self, op: Opcode) -> &mut Self {
        self.bytes.push(op.into());
        self
    }

    fn byte_length(count: usize) -> Result<[u8; 2], EncodingError> {
        if count == 0 || count > MAX_BYTES_PER_COMMAND {
            return Err(EncodingError::ByteCount(count));
        }
        // the engine transfers `field + 1` bytes
        let field = (count - 1) as u16;
        Ok(field.to_le_bytes())
    }

    fn bit_length(count: u8) -> Result<u8, EncodingError> {
        if count == 0 || count > MAX_BITS_PER_COMMAND {
            return Err(EncodingError::BitCount(count));
        }
        Ok(count - 1)
    }

    /// Drives the low pin bank.
    pub fn set_low_pins(&mut self, pins: PinFrame) -> &mut Self {
        self.op(Opcode::SetLowPins);
        self.bytes.extend_from_slice(&[pins.value, pins.direction]);
        self
    }

    /// Drives the high pin bank.
    pub fn set_high_pins(&mut self, pins: PinFrame) -> &mut Self {
        self.op(Opcode::SetHighPins);
        self.bytes.extend_from_slice(&[pins.value, pins.direction]);
        self
    }

    /// Samples the low pin bank; one byte is returned to the host.
    pub fn read_low_pins(&mut self) -> &mut Self {
        self.op(Opcode::ReadLowPins)
    }

    pub fn read_high_pins(&mut self) -> &mut Self {
        self.op(Opcode::ReadHighPins)
    }

    /// Clocks `data` out on TDI/DO.
    pub fn write_bytes(&mut self, edge: ClockEdge, data: &[u8]) -> Result<&mut Self, EncodingError> {
        let op = match edge {
            ClockEdge::Rising => Opcode::WriteBytesRising,
            ClockEdge::Falling => Opcode::WriteBytesFalling,
        };
        let length = Self::byte_length(data.len())?;
        self.op(op).bytes.extend_from_slice(&length);
        self.bytes.extend_from_slice(data);
        Ok(self)
    }

    /// Clocks `count` bytes in from TDO/DI.
    pub fn read_bytes(&mut self, edge: ClockEdge, count: usize) -> Result<&mut Self, EncodingError> {
        let op = match edge {
            ClockEdge::Rising => Opcode::ReadBytesRising,
            ClockEdge::Falling => Opcode::ReadBytesFalling,
        };
        let length = Self::byte_length(count)?;
        self.op(op).bytes.extend_from_slice(&length);
        Ok(self)
    }

    /// Clocks the top `count` bits of `value` out on TDI/DO.
    pub fn write_bits(
        &mut self,
        edge: ClockEdge,
        count: u8,
        value: u8,
    ) -> Result<&mut Self, EncodingError> {
        let op = match edge {
            ClockEdge::Rising => Opcode::WriteBitsRising,
            ClockEdge::Falling => Opcode::WriteBitsFalling,
        };
        let length = Self::bit_length(count)?;
        self.op(op).bytes.extend_from_slice(&[length, value]);
        Ok(self)
    }

    /// Clocks `count` bits in from TDO/DI.
    pub fn read_bits(&mut self, edge: ClockEdge, count: u8) -> Result<&mut Self, EncodingError> {
        let op = match edge {
            ClockEdge::Rising => Opcode::ReadBitsRising,
            ClockEdge::Falling => Opcode::ReadBitsFalling,
        };
        let length = Self::bit_length(count)?;
        self.op(op).bytes.push(length);
        Ok(self)
    }

    pub fn set_clock_divisor(&mut self, divisor: u16) -> &mut Self {
        self.op(Opcode::SetClockDivisor);
        self.bytes.extend_from_slice(&divisor.to_le_bytes());
        self
    }

    pub fn clock_divide_by_5(&mut self, enable: bool) -> &mut Self {
        self.op(if enable {
            Opcode::EnableDivideBy5
        } else {
            Opcode::DisableDivideBy5
        })
    }

    /// Three-phase clocking keeps data valid on both edges, as I2C requires.
    pub fn three_phase_clocking(&mut self, enable: bool) -> &mut Self {
        self.op(if enable {
            Opcode::EnableThreePhaseClocking
        } else {
            Opcode::DisableThreePhaseClocking
        })
    }

    pub fn adaptive_clocking(&mut self, enable: bool) -> &mut Self {
        self.op(if enable {
            Opcode::EnableAdaptiveClocking
        } else {
            Opcode::DisableAdaptiveClocking
        })
    }

    /// Internal TDI/DO to TDO/DI loopback.
    pub fn loopback(&mut self, enable: bool) -> &mut Self {
        self.op(if enable {
            Opcode::LoopbackOn
        } else {
            Opcode::LoopbackOff
        })
    }

    /// Flushes pending read data back to the host.
    pub fn send_immediate(&mut self) -> &mut Self {
        self.op(Opcode::SendImmediate)
    }
}

impl AsRef<[u8]> for CommandBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Computes the divisor that brings the MPSSE clock closest to `freq_hz`.
///
/// The base clock is 12 MHz with divide-by-5 enabled and 60 MHz without it;
/// the bus runs at `base / (2 * (1 + divisor))`.
pub fn clock_divisor_for(freq_hz: u32, divide_by_5: bool) -> Result<u16, EncodingError> {
    let base: u64 = if divide_by_5 { 12_000_000 } else { 60_000_000 };
    if freq_hz == 0 || u64::from(freq_hz) > base / 2 {
        return Err(EncodingError::ClockFrequency(freq_hz));
    }
    let twice = 2 * u64::from(freq_hz);
    // round to nearest
    let steps = (base + twice / 2) / twice;
    if steps == 0 || steps > u64::from(u16::MAX) + 1 {
        return Err(EncodingError::ClockFrequency(freq_hz));
    }
    Ok((steps - 1) as u16)
}
