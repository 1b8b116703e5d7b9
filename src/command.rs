/// SSD1306 fundamental, addressing, hardware and timing commands.
pub struct Cmd;
#[allow(dead_code)]
impl Cmd {
    pub const SET_MEM_ADDR: u8 = 0x20;
    pub const SET_COL_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_DISP_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    pub const SET_SEG_REMAP: u8 = 0xA0;
    pub const SET_ENTIRE_ON: u8 = 0xA4;
    pub const SET_NORM_INV: u8 = 0xA6;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_DISP: u8 = 0xAE;
    pub const SET_COM_OUT_DIR: u8 = 0xC0;
    pub const SET_DISP_OFFSET: u8 = 0xD3;
    pub const SET_DISP_CLK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_COM_PIN_CFG: u8 = 0xDA;
    pub const SET_VCOM_DESEL: u8 = 0xDB;
}

/// Control byte that follows the address byte of every transaction.
pub struct Control;
impl Control {
    /// The rest of the transaction is a command stream.
    pub const COMMAND: u8 = 0x00;
    /// The rest of the transaction is written to display RAM.
    pub const DATA: u8 = 0x40;
}

/// Register values that depend on configuration.
pub struct Flag;
#[allow(dead_code)]
impl Flag {
    pub const HORIZONTAL_ADDRESSING: u8 = 0x00;
    pub const PAGE_ADDRESSING: u8 = 0x10;
    pub const SEG_REMAP_127: u8 = 0x01;
    pub const DISPLAY_ON: u8 = 0x01;
    pub const INVERTED: u8 = 0x01;
    pub const COM_PINS_SEQUENTIAL: u8 = 0x02;
    pub const COM_PINS_ALTERNATIVE: u8 = 0x12;
    pub const CLK_DIV_DEFAULT: u8 = 0x80;
    pub const CLK_DIV_16_ROWS: u8 = 0x60;
    pub const PRECHARGE_EXTERNAL: u8 = 0x22;
    pub const PRECHARGE_INTERNAL: u8 = 0xF1;
    /// ~0.83 x Vcc
    pub const VCOM_DESELECT: u8 = 0x50;
    pub const CHARGE_PUMP_OFF: u8 = 0x10;
    pub const CHARGE_PUMP_ON: u8 = 0x14;
}
