//! A monochrome framebuffer stored in SSD1306 page layout, suitable for direct
//! display transmission. It implements `embedded_graphics::DrawTarget` by
//! setting or clearing the packed bit of each drawn pixel.
//!
//! Layout: byte `page * width + column` holds rows `8 * page ..= 8 * page + 7`
//! of that column, with the top row of the page in bit 0.

use core::convert::Infallible;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::BinaryColor,
    primitives::Rectangle,
    Pixel,
};

use crate::{error::GeometryMismatch, options::DisplayOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    width: u16,
    height: u16,
}

impl FrameBuffer {
    /// Creates a blank frame. `height` is rounded up to whole pages.
    pub fn new(width: u16, height: u16) -> Self {
        let pages = usize::from(height.div_ceil(8));
        Self {
            buffer: vec![0; usize::from(width) * pages],
            width,
            height,
        }
    }

    /// Wraps bytes that are already packed in page layout.
    ///
    /// Returns `None` if `bytes` does not hold exactly `width * height / 8` bytes.
    pub fn from_packed(width: u16, height: u16, bytes: Vec<u8>) -> Option<Self> {
        let pages = usize::from(height.div_ceil(8));
        (bytes.len() == usize::from(width) * pages).then_some(Self {
            buffer: bytes,
            width,
            height,
        })
    }

    /// Packs a row-major 8-bit luma bitmap; a pixel is lit when its luma is
    /// above `threshold`.
    ///
    /// Returns `None` for an empty bitmap or one whose length is not
    /// `width * height`.
    ///
    /// With `flip_vertical` the bottom source row becomes panel row 0, which
    /// matches the orientation set up by the init sequence.
    pub fn from_luma(
        width: u16,
        height: u16,
        luma: &[u8],
        threshold: u8,
        flip_vertical: bool,
    ) -> Option<Self> {
        let (w, h) = (usize::from(width), usize::from(height));
        if w == 0 || h == 0 || luma.len() != w * h {
            return None;
        }
        let mut frame = Self::new(width, height);
        for (y, row) in luma.chunks_exact(w).enumerate() {
            let panel_y = if flip_vertical { h - 1 - y } else { y };
            for (x, &value) in row.iter().enumerate() {
                if value > threshold {
                    frame.set_pixel(x as u16, panel_y as u16, true);
                }
            }
        }
        Some(frame)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn index(&self, x: u16, y: u16) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = usize::from(y / 8) * usize::from(self.width) + usize::from(x);
        Some((index, 1 << (y % 8)))
    }

    /// Sets one pixel; coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, on: bool) {
        if let Some((index, bit)) = self.index(x, y) {
            if on {
                self.buffer[index] |= bit;
            } else {
                self.buffer[index] &= !bit;
            }
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<bool> {
        self.index(x, y)
            .map(|(index, bit)| self.buffer[index] & bit != 0)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            if let (Ok(x), Ok(y)) = (u16::try_from(coord.x), u16::try_from(coord.y)) {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        self.buffer.fill(fill);
        // keep bits below the last row dark
        if self.height % 8 != 0 && color.is_on() {
            let last_page = usize::from(self.height / 8);
            let mask = (1u8 << (self.height % 8)) - 1;
            let width = usize::from(self.width);
            for byte in &mut self.buffer[last_page * width..] {
                *byte &= mask;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.is_zero_sized() {
            return Ok(());
        }

        let x0 = drawable_area.top_left.x as u16;
        let y0 = drawable_area.top_left.y as u16;
        for y in y0..y0 + drawable_area.size.height as u16 {
            for x in x0..x0 + drawable_area.size.width as u16 {
                self.set_pixel(x, y, color.is_on());
            }
        }
        Ok(())
    }
}

/// An ordered, restartable sequence of frames that all match one panel.
#[derive(Debug, Clone, Default)]
pub struct Animation {
    frames: Vec<FrameBuffer>,
}

impl Animation {
    /// Checks every frame against the panel geometry before accepting them.
    pub fn new(
        frames: Vec<FrameBuffer>,
        options: &DisplayOptions,
    ) -> Result<Self, GeometryMismatch> {
        for (index, frame) in frames.iter().enumerate() {
            let actual = (frame.width(), frame.height());
            if actual != options.display_size {
                return Err(GeometryMismatch {
                    frame: index,
                    expected: options.display_size,
                    actual,
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameBuffer] {
        &self.frames
    }

    pub fn iter(&self) -> core::slice::Iter<'_, FrameBuffer> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a Animation {
    type Item = &'a FrameBuffer;
    type IntoIter = core::slice::Iter<'a, FrameBuffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
