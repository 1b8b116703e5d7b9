//! SSD1306 initialization and addressing command streams.

use crate::{
    command::{Cmd, Flag},
    options::{AddressingMode, DisplayOptions, PowerSource},
    ConfigurationError,
};

/// Length of the stream returned by [`init_sequence`].
pub const INIT_SEQUENCE_LEN: usize = 25;

/// Length of the stream returned by [`address_window_sequence`].
pub const ADDRESS_WINDOW_LEN: usize = 6;

/// COM pin hardware configuration for the panel geometry.
///
/// |   w x h  | value |
/// |----------|-------|
/// | 128 x 64 | 0x12  |
/// | 128 x 32 | 0x02  |
/// |  96 x 16 | 0x02  |
/// |  64 x 48 | 0x12  |
/// |  64 x 32 | 0x12  |
pub fn com_pin_config(width: u16, height: u16) -> u8 {
    if (height == 32 || height == 16) && width != 64 {
        Flag::COM_PINS_SEQUENTIAL
    } else {
        Flag::COM_PINS_ALTERNATIVE
    }
}

pub fn clock_divide(height: u16) -> u8 {
    if height == 16 {
        Flag::CLK_DIV_16_ROWS
    } else {
        Flag::CLK_DIV_DEFAULT
    }
}

/// Command stream that powers the panel up in the configured geometry.
///
/// Sent as a single command transaction. The display is switched off first and
/// back on as the last command. Options an SSD1306 cannot take are rejected
/// rather than folded into register range.
pub fn init_sequence(
    options: &DisplayOptions,
) -> Result<[u8; INIT_SEQUENCE_LEN], ConfigurationError> {
    options.validate()?;
    let (width, height) = options.display_size;
    let external = options.power == PowerSource::External;
    // height is 8..=64 here
    let mux = (height - 1) as u8;

    Ok([
        Cmd::SET_DISP,
        Cmd::SET_MEM_ADDR,
        match options.addressing {
            AddressingMode::Horizontal => Flag::HORIZONTAL_ADDRESSING,
            AddressingMode::Page => Flag::PAGE_ADDRESSING,
        },
        Cmd::SET_DISP_START_LINE,
        // column 127 mapped to SEG0
        Cmd::SET_SEG_REMAP | Flag::SEG_REMAP_127,
        Cmd::SET_MUX_RATIO,
        mux,
        Cmd::SET_COM_OUT_DIR,
        Cmd::SET_DISP_OFFSET,
        0x00,
        Cmd::SET_COM_PIN_CFG,
        com_pin_config(width, height),
        Cmd::SET_DISP_CLK_DIV,
        clock_divide(height),
        Cmd::SET_PRECHARGE,
        if external {
            Flag::PRECHARGE_EXTERNAL
        } else {
            Flag::PRECHARGE_INTERNAL
        },
        Cmd::SET_VCOM_DESEL,
        Flag::VCOM_DESELECT,
        Cmd::SET_CONTRAST,
        options.contrast,
        // output follows RAM
        Cmd::SET_ENTIRE_ON,
        Cmd::SET_NORM_INV,
        Cmd::SET_CHARGE_PUMP,
        if external {
            Flag::CHARGE_PUMP_OFF
        } else {
            Flag::CHARGE_PUMP_ON
        },
        Cmd::SET_DISP | Flag::DISPLAY_ON,
    ])
}

/// Restricts RAM writes to the full panel: columns `0..width`, pages `0..pages`.
pub fn address_window_sequence(
    options: &DisplayOptions,
) -> Result<[u8; ADDRESS_WINDOW_LEN], ConfigurationError> {
    options.validate()?;
    let last_column = (options.width() - 1) as u8;
    let last_page = (options.pages() - 1) as u8;
    Ok([
        Cmd::SET_COL_ADDR,
        0,
        last_column,
        Cmd::SET_PAGE_ADDR,
        0,
        last_page,
    ])
}
