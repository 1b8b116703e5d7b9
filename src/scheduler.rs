//! Fixed-rate playback of an [`Animation`].
//!
//! Pacing is best effort: each frame waits until one period has passed since
//! the previous frame was sent. A frame that takes longer than its period is
//! not compensated for, so a slow bridge makes playback fall behind instead of
//! bursting to catch up.

use core::convert::Infallible;
use core::time::Duration;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace, warn};

use crate::{interface::Channel, Animation, ConfigurationError, Display, Error};

/// Fraction of a frame period spent in each resync pause.
const RESYNC_PAUSE_DIVISOR: u32 = 20;

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Blocking delay on [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Sleeps at least `duration`, rounded up to whole microseconds.
fn sleep<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut micros = duration.as_nanos().div_ceil(1_000);
    while micros > 0 {
        let step = micros.min(u128::from(u32::MAX));
        delay.delay_us(step as u32);
        micros -= step;
    }
}

/// Playback rate in frames per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    fps: f64,
    period: Duration,
}

impl FrameRate {
    /// Accepts any positive rate whose period fits in a [`Duration`].
    pub fn new(fps: f64) -> Result<Self, ConfigurationError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ConfigurationError::InvalidFrameRate);
        }
        let period = Duration::try_from_secs_f64(1.0 / fps)
            .map_err(|_| ConfigurationError::InvalidFrameRate)?;
        Ok(Self { fps, period })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Time budget of one frame.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Length of each pause in the resync sequence.
    pub fn resync_pause(&self) -> Duration {
        self.period / RESYNC_PAUSE_DIVISOR
    }
}

/// Paces consecutive events at least one period apart.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    period: Duration,
    last: Duration,
}

impl Deadline {
    /// Starts counting the first period at `start`.
    pub fn new(period: Duration, start: Duration) -> Self {
        Self {
            period,
            last: start,
        }
    }

    /// Start of the current period.
    pub fn last(&self) -> Duration {
        self.last
    }

    /// Budget left before the next event may happen.
    pub fn remaining(&self, now: Duration) -> Duration {
        self.period.saturating_sub(now.saturating_sub(self.last))
    }

    /// Blocks until one period has passed since the previous call, then
    /// restarts the period from the current time.
    ///
    /// Returns how far past the deadline the call already was on entry.
    pub fn wait<C, D>(&mut self, clock: &C, delay: &mut D) -> Duration
    where
        C: Clock,
        D: DelayNs,
    {
        let entered = clock.now();
        let overrun = entered
            .saturating_sub(self.last)
            .saturating_sub(self.period);
        loop {
            let remaining = self.remaining(clock.now());
            if remaining.is_zero() {
                break;
            }
            sleep(delay, remaining);
        }
        self.last = clock.now();
        overrun
    }
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Playing,
}

/// Streams animations to a [`Display`] at a fixed frame rate.
pub struct Scheduler<CLK, DLY>
where
    CLK: Clock,
    DLY: DelayNs,
{
    rate: FrameRate,
    clock: CLK,
    delay: DLY,
    state: State,
    deadline: Deadline,
    loops: u64,
}

impl<CLK, DLY> Scheduler<CLK, DLY>
where
    CLK: Clock,
    DLY: DelayNs,
{
    pub fn new(rate: FrameRate, clock: CLK, delay: DLY) -> Self {
        Self {
            rate,
            clock,
            delay,
            state: State::Idle,
            deadline: Deadline::new(rate.period(), Duration::ZERO),
            loops: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Clock reading taken when the most recent frame was released.
    pub fn last_send(&self) -> Duration {
        self.deadline.last()
    }

    /// Number of completed passes over the animation.
    pub fn loops(&self) -> u64 {
        self.loops
    }

    /// Plays every frame of `animation` once.
    ///
    /// Each pass starts by resynchronizing the channel, which throws away ACK
    /// bytes and any backlog left by the previous pass.
    pub fn play_once<CH>(
        &mut self,
        display: &mut Display<CH>,
        animation: &Animation,
    ) -> Result<(), Error<CH::Error>>
    where
        CH: Channel,
    {
        if self.state == State::Idle {
            info!(
                "playing {} frames at {} fps",
                animation.len(),
                self.rate.fps()
            );
            self.deadline = Deadline::new(self.rate.period(), self.clock.now());
            self.state = State::Playing;
        }

        self.resync(display.channel_mut())?;

        for (index, frame) in animation.iter().enumerate() {
            let overrun = self.deadline.wait(&self.clock, &mut self.delay);
            if !overrun.is_zero() {
                warn!("frame {} late by {:?}", index, overrun);
            }
            trace!("frame {}", index);
            display.show(frame)?;
        }

        self.loops += 1;
        Ok(())
    }

    /// Loops over `animation` until an error ends playback.
    pub fn run<CH>(
        &mut self,
        display: &mut Display<CH>,
        animation: &Animation,
    ) -> Result<Infallible, Error<CH::Error>>
    where
        CH: Channel,
    {
        loop {
            self.play_once(display, animation)?;
        }
    }

    fn resync<CH>(&mut self, channel: &mut CH) -> Result<(), Error<CH::Error>>
    where
        CH: Channel,
    {
        let pause = self.rate.resync_pause();
        debug!("resync, {:?} pauses", pause);
        channel.stop_in_task().map_err(Error::Channel)?;
        sleep(&mut self.delay, pause);
        channel.restart_in_task().map_err(Error::Channel)?;
        sleep(&mut self.delay, pause);
        channel.purge().map_err(Error::Channel)?;
        sleep(&mut self.delay, pause);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        _mock::{MockChannel, MockClock, MockDelay, MockError},
        interface::{Event, RecordingChannel},
        Builder, FrameBuffer,
    };

    fn animation(frames: usize) -> Animation {
        let options = crate::options::DisplayOptions::default();
        Animation::new(vec![FrameBuffer::new(128, 64); frames], &options).unwrap()
    }

    #[test]
    fn frame_rate_validation() {
        assert_eq!(
            FrameRate::new(0.0),
            Err(ConfigurationError::InvalidFrameRate)
        );
        assert_eq!(
            FrameRate::new(f64::NAN),
            Err(ConfigurationError::InvalidFrameRate)
        );
        // period would overflow a Duration
        assert_eq!(
            FrameRate::new(1e-300),
            Err(ConfigurationError::InvalidFrameRate)
        );
        assert_eq!(
            FrameRate::new(f64::INFINITY),
            Err(ConfigurationError::InvalidFrameRate)
        );
        let slow = FrameRate::new(0.5).unwrap();
        assert_eq!(slow.period(), Duration::from_secs(2));
        let rate = FrameRate::new(10.0).unwrap();
        assert_eq!(rate.period(), Duration::from_millis(100));
        assert_eq!(rate.resync_pause(), Duration::from_millis(5));
    }

    #[test]
    fn deadline_does_not_catch_up() {
        let clock = MockClock::new();
        let mut delay = MockDelay(clock.clone());
        let mut deadline = Deadline::new(Duration::from_millis(100), clock.now());

        assert_eq!(deadline.wait(&clock, &mut delay), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_millis(100));

        // a slow frame eats 250 ms
        clock.advance(Duration::from_millis(250));
        assert_eq!(
            deadline.wait(&clock, &mut delay),
            Duration::from_millis(150)
        );
        // no sleep, and the next period starts now
        assert_eq!(clock.now(), Duration::from_millis(350));
        deadline.wait(&clock, &mut delay);
        assert_eq!(clock.now(), Duration::from_millis(450));
    }

    #[test]
    fn frames_are_spaced_by_the_period() {
        let clock = MockClock::new();
        let channel = MockChannel::new().with_clock(clock.clone());
        let log = channel.log();
        let mut display = Builder::new(channel).init().unwrap();
        log.clear();

        let mut scheduler = Scheduler::new(
            FrameRate::new(10.0).unwrap(),
            clock.clone(),
            MockDelay(clock.clone()),
        );
        assert_eq!(scheduler.state(), State::Idle);
        scheduler.play_once(&mut display, &animation(3)).unwrap();
        assert_eq!(scheduler.state(), State::Playing);

        let times = log.write_times();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
        assert_eq!(
            &log.events()[..3],
            &[Event::StopInTask, Event::RestartInTask, Event::Purge]
        );
    }

    #[test]
    fn real_clock_spacing_has_no_negative_drift() {
        let mut channel = RecordingChannel::new();
        let mut display = Builder::new(&mut channel).init().unwrap();
        let clock = StdClock::new();
        let mut scheduler = Scheduler::new(FrameRate::new(10.0).unwrap(), clock, StdDelay);

        let mut sent = Vec::new();
        let frames = animation(1);
        for _ in 0..3 {
            scheduler.play_once(&mut display, &frames).unwrap();
            sent.push(scheduler.last_send());
        }
        drop(display);
        assert_eq!(channel.writes().count(), 2 + 3);
        for pair in sent.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[test]
    fn real_clock_single_pass_of_three_frames() {
        let mut channel = RecordingChannel::new();
        let mut display = Builder::new(&mut channel).init().unwrap();
        let clock = StdClock::new();
        let mut scheduler = Scheduler::new(FrameRate::new(10.0).unwrap(), clock, StdDelay);

        let started = clock.now();
        scheduler.play_once(&mut display, &animation(3)).unwrap();
        let finished = scheduler.last_send();
        drop(display);

        assert_eq!(channel.writes().count(), 2 + 3);
        // every frame waits a full period after the previous one
        assert!(finished - started >= Duration::from_millis(300));
        assert_eq!(scheduler.loops(), 1);
    }

    #[test]
    fn empty_animation_only_resyncs() {
        let clock = MockClock::new();
        let channel = MockChannel::new().with_clock(clock.clone());
        let log = channel.log();
        let mut display = Builder::new(channel).init().unwrap();
        log.clear();

        let mut scheduler = Scheduler::new(
            FrameRate::new(10.0).unwrap(),
            clock.clone(),
            MockDelay(clock),
        );
        let empty = animation(0);
        scheduler.play_once(&mut display, &empty).unwrap();
        scheduler.play_once(&mut display, &empty).unwrap();

        assert_eq!(scheduler.loops(), 2);
        assert_eq!(log.write_times().len(), 0);
        assert_eq!(log.count(&Event::StopInTask), 2);
        assert_eq!(log.count(&Event::RestartInTask), 2);
        assert_eq!(log.count(&Event::Purge), 2);
    }

    #[test]
    fn write_failure_ends_playback() {
        let clock = MockClock::new();
        let channel = MockChannel::new()
            .with_clock(clock.clone())
            .fail_write_after(3);
        let mut display = Builder::new(channel).init().unwrap();

        let mut scheduler = Scheduler::new(
            FrameRate::new(100.0).unwrap(),
            clock.clone(),
            MockDelay(clock),
        );
        let err = scheduler.run(&mut display, &animation(2)).unwrap_err();
        assert!(matches!(err, Error::Channel(MockError)));
        assert_eq!(scheduler.loops(), 0);
    }
}
