use core::time::Duration;

mod recording;
pub use recording::*;

/// FTDI bit modes used by this crate.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitMode {
    Reset = 0x00,
    Mpsse = 0x02,
}

/// Byte channel to an FTDI bridge.
///
/// Implementations wrap the vendor driver handle of an opened device. All calls
/// are blocking; timeouts are whatever [`Channel::set_timeouts`] configured.
pub trait Channel {
    /// Error type
    type Error: core::fmt::Debug;

    /// Queue `data` for transmission, returning how many bytes were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read bytes the bridge has returned to the host.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> Result<(), Self::Error>;

    fn set_latency_timer(&mut self, latency: Duration) -> Result<(), Self::Error>;

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Self::Error>;

    /// Suspend the driver's IN task.
    fn stop_in_task(&mut self) -> Result<(), Self::Error>;

    /// Resume the driver's IN task.
    fn restart_in_task(&mut self) -> Result<(), Self::Error>;

    /// Discard anything buffered in either direction.
    fn purge(&mut self) -> Result<(), Self::Error>;

    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<T: Channel + ?Sized> Channel for &mut T {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        T::write(self, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read(self, buf)
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> Result<(), Self::Error> {
        T::set_bit_mode(self, mask, mode)
    }

    fn set_latency_timer(&mut self, latency: Duration) -> Result<(), Self::Error> {
        T::set_latency_timer(self, latency)
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Self::Error> {
        T::set_timeouts(self, read, write)
    }

    fn stop_in_task(&mut self) -> Result<(), Self::Error> {
        T::stop_in_task(self)
    }

    fn restart_in_task(&mut self) -> Result<(), Self::Error> {
        T::restart_in_task(self)
    }

    fn purge(&mut self) -> Result<(), Self::Error> {
        T::purge(self)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        T::close(self)
    }
}
