use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::{
    interface::{BitMode, Channel, Event},
    scheduler::Clock,
};

/// Virtual monotonic time shared between clock, delay and channel.
#[derive(Debug, Clone, Default)]
pub struct MockClock(Rc<Cell<Duration>>);

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Delay that advances a [`MockClock`] instead of sleeping.
#[derive(Debug, Clone)]
pub struct MockDelay(pub MockClock);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(Duration::from_nanos(u64::from(ns)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Shared view of everything a [`MockChannel`] saw, readable after the
/// channel has been moved or dropped.
#[derive(Debug, Clone, Default)]
pub struct MockLog(Rc<RefCell<Vec<(Duration, Event)>>>);

impl MockLog {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Time of every write.
    pub fn write_times(&self) -> Vec<Duration> {
        self.0
            .borrow()
            .iter()
            .filter(|(_, e)| matches!(e, Event::Write(_)))
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.0.borrow().iter().filter(|(_, e)| e == event).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug, Default)]
pub struct MockChannel {
    log: MockLog,
    clock: MockClock,
    writes: usize,
    fail_write_after: Option<usize>,
    short_writes: bool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps events with `clock`.
    pub fn with_clock(mut self, clock: MockClock) -> Self {
        self.clock = clock;
        self
    }

    /// Accept `n` writes, then fail every following one.
    pub fn fail_write_after(mut self, n: usize) -> Self {
        self.fail_write_after = Some(n);
        self
    }

    /// Accept one byte less than offered.
    pub fn short_writes(mut self) -> Self {
        self.short_writes = true;
        self
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    fn record(&self, event: Event) {
        self.log.0.borrow_mut().push((self.clock.now(), event));
    }
}

impl Channel for MockChannel {
    type Error = MockError;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_write_after.is_some_and(|n| self.writes >= n) {
            return Err(MockError);
        }
        self.writes += 1;
        self.record(Event::Write(data.to_vec()));
        if self.short_writes {
            return Ok(data.len().saturating_sub(1));
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        buf.fill(0);
        Ok(buf.len())
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> Result<(), Self::Error> {
        self.record(Event::BitMode(mask, mode));
        Ok(())
    }

    fn set_latency_timer(&mut self, latency: Duration) -> Result<(), Self::Error> {
        self.record(Event::LatencyTimer(latency));
        Ok(())
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Self::Error> {
        self.record(Event::Timeouts(read, write));
        Ok(())
    }

    fn stop_in_task(&mut self) -> Result<(), Self::Error> {
        self.record(Event::StopInTask);
        Ok(())
    }

    fn restart_in_task(&mut self) -> Result<(), Self::Error> {
        self.record(Event::RestartInTask);
        Ok(())
    }

    fn purge(&mut self) -> Result<(), Self::Error> {
        self.record(Event::Purge);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.record(Event::Close);
        Ok(())
    }
}
