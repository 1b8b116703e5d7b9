//! Panel configuration.

use crate::ConfigurationError;

/// Default 7-bit I2C address of an SSD1306 with SA0 low.
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Largest panel the SSD1306 can drive.
pub const MAX_SIZE: (u16, u16) = (128, 64);

/// Source of the panel drive voltage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowerSource {
    /// On-chip charge pump generates VCC.
    #[default]
    Internal,
    /// VCC is supplied externally; the charge pump stays off.
    External,
}

/// GDDRAM addressing mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressingMode {
    /// Column pointer wraps into the next page.
    #[default]
    Horizontal,
    /// Column pointer wraps within the current page.
    Page,
}

/// Immutable panel options, fixed when the [`Display`](crate::Display) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Width and height in pixels.
    pub display_size: (u16, u16),
    pub power: PowerSource,
    pub addressing: AddressingMode,
    /// 7-bit I2C address.
    pub address: u8,
    pub contrast: u8,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            display_size: MAX_SIZE,
            power: PowerSource::default(),
            addressing: AddressingMode::default(),
            address: DEFAULT_ADDRESS,
            contrast: 0xFF,
        }
    }
}

impl DisplayOptions {
    pub fn width(&self) -> u16 {
        self.display_size.0
    }

    pub fn height(&self) -> u16 {
        self.display_size.1
    }

    /// Number of 8-row pages.
    pub fn pages(&self) -> u16 {
        self.display_size.1 / 8
    }

    /// Size of one packed frame in bytes.
    pub fn frame_len(&self) -> usize {
        usize::from(self.width()) * usize::from(self.pages())
    }

    /// Checks that the panel size and address are something an SSD1306 can
    /// be configured for.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let (width, height) = self.display_size;
        let (max_width, max_height) = MAX_SIZE;

        if width == 0 || height == 0 || width > max_width || height > max_height || height % 8 != 0
        {
            return Err(ConfigurationError::InvalidDisplaySize);
        }
        if self.address > 0x7F {
            return Err(ConfigurationError::InvalidAddress);
        }
        Ok(())
    }
}
