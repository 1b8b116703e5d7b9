use core::convert::Infallible;
use core::time::Duration;

use super::{BitMode, Channel};

/// A call made on a [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    BitMode(u8, BitMode),
    LatencyTimer(Duration),
    Timeouts(Duration, Duration),
    StopInTask,
    RestartInTask,
    Purge,
    Close,
}

/// Channel that keeps every call in memory instead of talking to hardware.
///
/// Useful for dry runs and for inspecting the exact opcode stream a sequence
/// of operations produces. Reads report the ACK bytes a real bridge would have
/// returned, all zero (acknowledged).
#[derive(Debug, Default)]
pub struct RecordingChannel {
    events: Vec<Event>,
    pending_reads: usize,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Payloads of every write, in order.
    pub fn writes(&self) -> impl Iterator<Item = &[u8]> {
        self.events.iter().filter_map(|event| match event {
            Event::Write(data) => Some(data.as_slice()),
            _ => None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.events.last() == Some(&Event::Close)
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.pending_reads = 0;
    }
}

impl Channel for RecordingChannel {
    type Error = Infallible;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        // one byte comes back per SendImmediate flush of a sampled bit
        self.pending_reads += data
            .windows(3)
            .filter(|w| w[0] == 0x22 && w[1] == 0x00 && w[2] == 0x87)
            .count();
        self.events.push(Event::Write(data.to_vec()));
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.pending_reads);
        buf[..n].fill(0);
        self.pending_reads -= n;
        Ok(n)
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> Result<(), Self::Error> {
        self.events.push(Event::BitMode(mask, mode));
        Ok(())
    }

    fn set_latency_timer(&mut self, latency: Duration) -> Result<(), Self::Error> {
        self.events.push(Event::LatencyTimer(latency));
        Ok(())
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Self::Error> {
        self.events.push(Event::Timeouts(read, write));
        Ok(())
    }

    fn stop_in_task(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::StopInTask);
        Ok(())
    }

    fn restart_in_task(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::RestartInTask);
        Ok(())
    }

    fn purge(&mut self) -> Result<(), Self::Error> {
        self.pending_reads = 0;
        self.events.push(Event::Purge);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::Transaction;

    #[test]
    fn acks_are_returned_until_purged() {
        let mut channel = RecordingChannel::new();
        let mut tx = Transaction::write(0x3C, 2).unwrap();
        tx.bytes(&[0x00, 0xAF]).unwrap();
        channel.write(tx.finish().as_bytes()).unwrap();

        let mut acks = [0xFF; 8];
        assert_eq!(channel.read(&mut acks).unwrap(), 3);
        assert_eq!(&acks[..3], &[0, 0, 0]);
        assert_eq!(channel.read(&mut acks).unwrap(), 0);

        channel.write(Transaction::write(0x3C, 0).unwrap().finish().as_bytes()).unwrap();
        channel.purge().unwrap();
        assert_eq!(channel.read(&mut acks).unwrap(), 0);
    }
}
