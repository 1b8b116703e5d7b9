//! [super::Display] builder module

use log::info;

use crate::{
    interface::Channel,
    options::{AddressingMode, DisplayOptions, PowerSource},
    Display, Error,
};

/// Builder for [Display] instances.
pub struct Builder<CH>
where
    CH: Channel,
{
    channel: CH,
    options: DisplayOptions,
}

impl<CH> Builder<CH>
where
    CH: Channel,
{
    #[must_use]
    pub fn new(channel: CH) -> Self {
        Self {
            channel,
            options: DisplayOptions::default(),
        }
    }

    #[must_use]
    pub fn display_size(mut self, width: u16, height: u16) -> Self {
        self.options.display_size = (width, height);
        self
    }
    #[must_use]
    pub fn power(mut self, power: PowerSource) -> Self {
        self.options.power = power;
        self
    }
    #[must_use]
    pub fn addressing(mut self, addressing: AddressingMode) -> Self {
        self.options.addressing = addressing;
        self
    }
    #[must_use]
    pub fn address(mut self, address: u8) -> Self {
        self.options.address = address;
        self
    }
    #[must_use]
    pub fn contrast(mut self, contrast: u8) -> Self {
        self.options.contrast = contrast;
        self
    }

    /// Validates the options, then initializes the panel.
    pub fn init(self) -> Result<Display<CH>, Error<CH::Error>> {
        self.options.validate()?;

        let mut display = Display {
            channel: self.channel,
            options: self.options,
            on: false,
        };
        display.init()?;
        info!(
            "display ready: {}x{} {:?} power",
            display.options.width(),
            display.options.height(),
            display.options.power
        );
        Ok(display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{interface::RecordingChannel, ConfigurationError};

    fn init_err(builder: Builder<&mut RecordingChannel>) -> ConfigurationError {
        match builder.init() {
            Err(Error::InvalidConfiguration(e)) => e,
            Err(e) => panic!("unexpected error {e:?}"),
            Ok(_) => panic!("configuration accepted"),
        }
    }

    #[test]
    fn invalid_sizes_are_rejected_without_io() {
        let mut channel = RecordingChannel::new();
        for (w, h) in [(0, 64), (128, 0), (129, 64), (128, 72), (128, 20)] {
            let err = init_err(Builder::new(&mut channel).display_size(w, h));
            assert_eq!(err, ConfigurationError::InvalidDisplaySize);
        }
        let err = init_err(Builder::new(&mut channel).address(0x80));
        assert_eq!(err, ConfigurationError::InvalidAddress);
        assert!(channel.events().is_empty());
    }

    #[test]
    fn options_flow_into_display() {
        let mut channel = RecordingChannel::new();
        let display = Builder::new(&mut channel)
            .display_size(96, 16)
            .power(PowerSource::External)
            .addressing(AddressingMode::Page)
            .contrast(0x40)
            .init()
            .unwrap();
        let options = display.options();
        assert_eq!(options.display_size, (96, 16));
        assert_eq!(options.power, PowerSource::External);
        assert_eq!(options.addressing, AddressingMode::Page);
        assert_eq!(options.frame_len(), 192);
    }
}
