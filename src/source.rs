//! Animated GIF frame source.

use std::{
    fs::File,
    io::{BufRead, BufReader, Seek},
    path::Path,
};

use image::{codecs::gif::GifDecoder, AnimationDecoder, DynamicImage};
use log::debug;

use crate::{error::GeometryMismatch, options::DisplayOptions, FrameBuffer};

/// Luma above which a pixel is lit.
pub const DEFAULT_THRESHOLD: u8 = 200;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read animation: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode animation: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Geometry(#[from] GeometryMismatch),
}

/// How decoded frames are reduced to one bit per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    pub threshold: u8,
    /// Store the bottom image row in panel row 0. The init sequence scans COM
    /// lines in normal order with remapped segments, so upright images need it.
    pub flip_vertical: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            flip_vertical: true,
        }
    }
}

/// Decodes every frame of the GIF at `path`.
pub fn decode_gif(
    path: impl AsRef<Path>,
    display: &DisplayOptions,
    options: &SourceOptions,
) -> Result<Vec<FrameBuffer>, SourceError> {
    let path = path.as_ref();
    debug!("decoding {}", path.display());
    let file = File::open(path)?;
    decode_gif_reader(BufReader::new(file), display, options)
}

/// Decodes every frame of a GIF stream. Frames must match the panel size.
pub fn decode_gif_reader<R>(
    reader: R,
    display: &DisplayOptions,
    options: &SourceOptions,
) -> Result<Vec<FrameBuffer>, SourceError>
where
    R: BufRead + Seek,
{
    let decoder = GifDecoder::new(reader)?;
    let (width, height) = display.display_size;

    let mut frames = Vec::new();
    for (index, frame) in decoder.into_frames().enumerate() {
        let luma = DynamicImage::ImageRgba8(frame?.into_buffer()).into_luma8();
        let actual = (
            u16::try_from(luma.width()).unwrap_or(u16::MAX),
            u16::try_from(luma.height()).unwrap_or(u16::MAX),
        );
        let packed = (actual == display.display_size)
            .then(|| {
                FrameBuffer::from_luma(
                    width,
                    height,
                    luma.as_raw(),
                    options.threshold,
                    options.flip_vertical,
                )
            })
            .flatten();
        match packed {
            Some(buffer) => frames.push(buffer),
            None => {
                return Err(GeometryMismatch {
                    frame: index,
                    expected: display.display_size,
                    actual,
                }
                .into())
            }
        }
    }
    debug!("decoded {} frames", frames.len());
    Ok(frames)
}
