//! Scoped ownership of an opened bridge.

use core::time::Duration;

use log::{debug, info, warn};

use crate::{
    i2c,
    interface::{BitMode, Channel},
    mpsse::{self, CommandBuffer},
    Error,
};

/// Bring-up parameters for the MPSSE engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Target SCL frequency in Hz.
    pub clock_hz: u32,
    /// Run the engine from the 12 MHz (divided) clock instead of 60 MHz.
    pub divide_by_5: bool,
    pub latency: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            clock_hz: 3_000_000,
            divide_by_5: true,
            latency: Duration::from_millis(2),
            read_timeout: Duration::from_millis(5000),
            write_timeout: Duration::from_millis(5000),
        }
    }
}

impl BridgeConfig {
    /// MPSSE commands that set up I2C emulation: loopback so SDA in follows
    /// SDA out, three-phase clocking, idle bus, clock divisor.
    pub fn setup_commands(&self) -> Result<CommandBuffer, mpsse::EncodingError> {
        let divisor = mpsse::clock_divisor_for(self.clock_hz, self.divide_by_5)?;
        let mut buf = CommandBuffer::with_capacity(12);
        buf.loopback(true)
            .three_phase_clocking(true)
            .adaptive_clocking(false)
            .set_low_pins(i2c::IDLE)
            .clock_divide_by_5(self.divide_by_5)
            .set_clock_divisor(divisor);
        Ok(buf)
    }
}

/// An opened channel that is closed when the session goes out of scope.
///
/// The session is itself a [`Channel`], so a [`Display`](crate::Display) can be
/// built on `&mut Session`.
pub struct Session<C>
where
    C: Channel,
{
    channel: C,
    closed: bool,
}

impl<C> Session<C>
where
    C: Channel,
{
    /// Opens a channel with `open` and puts the bridge into MPSSE mode.
    ///
    /// Failure of `open` is reported as [`Error::DeviceUnavailable`]. Once the
    /// channel exists any later failure still closes it.
    pub fn open<F>(open: F, config: &BridgeConfig) -> Result<Self, Error<C::Error>>
    where
        F: FnOnce() -> Result<C, C::Error>,
    {
        let channel = open().map_err(Error::DeviceUnavailable)?;
        let mut session = Self::new(channel);
        session.configure(config)?;
        info!("bridge open, SCL at {} Hz", config.clock_hz);
        Ok(session)
    }

    /// Takes ownership of an already configured channel.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            closed: false,
        }
    }

    fn configure(&mut self, config: &BridgeConfig) -> Result<(), Error<C::Error>> {
        let setup = config.setup_commands()?;

        debug!("purging and entering MPSSE mode");
        self.channel.purge().map_err(Error::Channel)?;
        self.channel
            .set_bit_mode(0x00, BitMode::Mpsse)
            .map_err(Error::Channel)?;

        let written = self
            .channel
            .write(setup.as_bytes())
            .map_err(Error::Channel)?;
        if written != setup.len() {
            return Err(Error::ShortWrite {
                expected: setup.len(),
                written,
            });
        }

        debug!("latency {:?}, timeouts {:?}/{:?}", config.latency, config.read_timeout, config.write_timeout);
        self.channel
            .set_latency_timer(config.latency)
            .map_err(Error::Channel)?;
        self.channel
            .set_timeouts(config.read_timeout, config.write_timeout)
            .map_err(Error::Channel)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<C> Channel for Session<C>
where
    C: Channel,
{
    type Error = C::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.channel.write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.channel.read(buf)
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> Result<(), Self::Error> {
        self.channel.set_bit_mode(mask, mode)
    }

    fn set_latency_timer(&mut self, latency: Duration) -> Result<(), Self::Error> {
        self.channel.set_latency_timer(latency)
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Self::Error> {
        self.channel.set_timeouts(read, write)
    }

    fn stop_in_task(&mut self) -> Result<(), Self::Error> {
        self.channel.stop_in_task()
    }

    fn restart_in_task(&mut self) -> Result<(), Self::Error> {
        self.channel.restart_in_task()
    }

    fn purge(&mut self) -> Result<(), Self::Error> {
        self.channel.purge()
    }

    /// Closes the channel now; the drop becomes a no-op.
    fn close(&mut self) -> Result<(), Self::Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("closing bridge");
        self.channel.close()
    }
}

impl<C> Drop for Session<C>
where
    C: Channel,
{
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close bridge: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        _mock::{MockChannel, MockError},
        interface::Event,
        Builder,
    };

    #[test]
    fn bring_up_sequence() {
        let channel = MockChannel::new();
        let log = channel.log();
        let session = Session::open(|| Ok(channel), &BridgeConfig::default()).unwrap();
        assert!(!session.is_closed());
        drop(session);

        assert_eq!(
            log.events(),
            vec![
                Event::Purge,
                Event::BitMode(0x00, BitMode::Mpsse),
                Event::Write(vec![
                    0x84, 0x8C, 0x97, 0x80, 0x03, 0xFB, 0x8B, 0x86, 0x01, 0x00
                ]),
                Event::LatencyTimer(Duration::from_millis(2)),
                Event::Timeouts(Duration::from_secs(5), Duration::from_secs(5)),
                Event::Close,
            ]
        );
    }

    #[test]
    fn open_failure_is_device_unavailable() {
        let result = Session::<MockChannel>::open(|| Err(MockError), &BridgeConfig::default());
        assert!(matches!(result, Err(Error::DeviceUnavailable(MockError))));
    }

    #[test]
    fn failed_bring_up_still_closes() {
        let channel = MockChannel::new().fail_write_after(0);
        let log = channel.log();
        let result = Session::open(|| Ok(channel), &BridgeConfig::default());
        assert!(matches!(result, Err(Error::Channel(MockError))));
        assert_eq!(log.events().last(), Some(&Event::Close));
    }

    #[test]
    fn unreachable_clock_is_an_encoding_error() {
        let channel = MockChannel::new();
        let log = channel.log();
        let config = BridgeConfig {
            clock_hz: 40_000_000,
            ..BridgeConfig::default()
        };
        let result = Session::open(|| Ok(channel), &config);
        assert!(matches!(result, Err(Error::Encoding(_))));
        assert_eq!(log.events(), vec![Event::Close]);
    }

    #[test]
    fn explicit_close_happens_once() {
        let channel = MockChannel::new();
        let log = channel.log();
        let mut session = Session::new(channel);
        {
            let mut display = Builder::new(&mut session).init().unwrap();
            display.show(&crate::FrameBuffer::new(128, 64)).unwrap();
        }
        session.close().unwrap();
        assert!(session.is_closed());
        drop(session);
        let closes = log.events().iter().filter(|e| **e == Event::Close).count();
        assert_eq!(closes, 1);
    }
}
