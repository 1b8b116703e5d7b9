//! This crate drives an SSD1306 OLED controller over I2C, with the I2C master
//! emulated in software on the MPSSE command processor of an FTDI
//! USB-to-serial bridge (FT232H and friends).
//!
//! Layers, bottom up:
//!
//! * [`mpsse`] encodes pin and clocking operations into MPSSE opcodes.
//! * [`i2c`] builds start/stop conditions and byte transfers from those opcodes.
//! * [`Display`] speaks the SSD1306 protocol over complete I2C transactions.
//! * [`scheduler`] streams an [`Animation`] at a fixed frame rate.
//!
//! The bridge itself is reached through the [`interface::Channel`] trait;
//! [`session::Session`] owns an opened channel and closes it on every exit path.
//!
//! ## Example
//!
//! ```rust, ignore
//! let config = BridgeConfig::default();
//! let mut session = Session::open(|| ftdi::open_first(), &config)?;
//!
//! let mut display = Builder::new(&mut session)
//!     .display_size(128, 64)
//!     .power(PowerSource::Internal)
//!     .init()?;
//!
//! let animation = Animation::new(frames, display.options())?;
//! let mut scheduler = Scheduler::new(FrameRate::new(23.976)?, StdClock::new(), StdDelay);
//! scheduler.run(&mut display, &animation)?;
//! ```

use log::{debug, trace};

pub mod interface;
use interface::Channel;

mod builder;
pub use builder::*;

pub mod command;
mod error;
pub use error::*;
pub mod framebuf;
pub use framebuf::{Animation, FrameBuffer};
pub mod i2c;
pub mod init;
pub mod mpsse;
pub mod options;
pub mod scheduler;
pub mod session;
#[cfg(feature = "gif")]
pub mod source;

#[cfg(test)]
mod _mock;

use command::{Cmd, Control, Flag};
use i2c::Transaction;
use mpsse::{CommandBuffer, EncodingError};

/// SSD1306 display reached over an emulated I2C bus.
pub struct Display<CH>
where
    CH: Channel,
{
    /// The bridge channel.
    channel: CH,
    /// Panel options.
    options: options::DisplayOptions,
    /// Display on/off state.
    on: bool,
}

impl<CH> Display<CH>
where
    CH: Channel,
{
    /// Returns the panel options the display was built with.
    pub fn options(&self) -> &options::DisplayOptions {
        &self.options
    }

    /// Encodes one command transaction: address, command control byte,
    /// `commands`, stop.
    pub fn command_transaction(&self, commands: &[u8]) -> Result<CommandBuffer, EncodingError> {
        let mut tx = Transaction::write(self.options.address, 1 + commands.len())?;
        tx.byte(Control::COMMAND)?.bytes(commands)?;
        Ok(tx.finish())
    }

    /// Encodes the RAM write transaction for one frame.
    ///
    /// The frame must match the panel size.
    pub fn frame_transaction(&self, frame: &FrameBuffer) -> Result<CommandBuffer, Error<CH::Error>> {
        let actual = (frame.width(), frame.height());
        if actual != self.options.display_size {
            return Err(Error::GeometryMismatch(GeometryMismatch {
                frame: 0,
                expected: self.options.display_size,
                actual,
            }));
        }
        let data = frame.as_bytes();
        let mut tx = Transaction::write(self.options.address, 1 + data.len())?;
        tx.byte(Control::DATA)?.bytes(data)?;
        Ok(tx.finish())
    }

    /// Sends the init sequence followed by the full-panel address window.
    pub fn init(&mut self) -> Result<(), Error<CH::Error>> {
        debug!(
            "initializing {}x{} panel at 0x{:02x}",
            self.options.width(),
            self.options.height(),
            self.options.address
        );
        let init = self.command_transaction(&init::init_sequence(&self.options)?)?;
        self.write(&init)?;
        let window = self.command_transaction(&init::address_window_sequence(&self.options)?)?;
        self.write(&window)?;
        self.on = true;
        Ok(())
    }

    /// Writes one frame to display RAM in a single channel write.
    pub fn show(&mut self, frame: &FrameBuffer) -> Result<(), Error<CH::Error>> {
        let tx = self.frame_transaction(frame)?;
        trace!("frame: {} bytes on the wire", tx.len());
        self.write(&tx)
    }

    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), Error<CH::Error>> {
        let tx = self.command_transaction(&[Cmd::SET_CONTRAST, contrast])?;
        self.write(&tx)?;
        self.options.contrast = contrast;
        Ok(())
    }

    /// Returns `true` if the panel is switched on.
    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn set_display_on(&mut self, on: bool) -> Result<(), Error<CH::Error>> {
        let command = if on {
            Cmd::SET_DISP | Flag::DISPLAY_ON
        } else {
            Cmd::SET_DISP
        };
        let tx = self.command_transaction(&[command])?;
        self.write(&tx)?;
        self.on = on;
        Ok(())
    }

    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), Error<CH::Error>> {
        let command = if inverted {
            Cmd::SET_NORM_INV | Flag::INVERTED
        } else {
            Cmd::SET_NORM_INV
        };
        let tx = self.command_transaction(&[command])?;
        self.write(&tx)
    }

    /// Returns a mutable reference to the underlying channel.
    ///
    /// Bytes written here must leave the bus idle, or the next transaction
    /// starts from an undefined line state.
    pub fn channel_mut(&mut self) -> &mut CH {
        &mut self.channel
    }

    /// Releases the channel.
    pub fn release(self) -> CH {
        self.channel
    }

    fn write(&mut self, tx: &CommandBuffer) -> Result<(), Error<CH::Error>> {
        let expected = tx.len();
        let written = self.channel.write(tx.as_bytes()).map_err(Error::Channel)?;
        if written != expected {
            return Err(Error::ShortWrite { expected, written });
        }
        Ok(())
    }
}
