//! Laying payload bytes out on a pixel grid and reading them back.
//!
//! Bytes go in row-major order, channel by channel within a pixel, exactly as
//! PNG stores 8-bit samples. The unused tail of the last row is zero filled;
//! the real payload length travels separately in the `pnGr` chunk.

use crate::error::{Error, Result};
use crate::raw::{ColourType, Header};
use log::debug;

/// PNG caps both sides at 2^31 - 1.
const MAX_SIDE: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub colour: ColourType,
}

impl Dimensions {
    pub fn bytes_per_pixel(&self) -> usize {
        self.colour.channels()
    }

    /// Bytes in one row, without the filter tag.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub fn canvas_len(&self) -> usize {
        self.row_len() * self.height as usize
    }

    /// Bytes in the filtered stream: every row plus its tag.
    pub fn scanline_stream_len(&self) -> usize {
        (self.row_len() + 1) * self.height as usize
    }
}

impl From<Header> for Dimensions {
    fn from(h: Header) -> Self {
        Self {
            width: h.width,
            height: h.height,
            colour: h.colour,
        }
    }
}

impl From<Dimensions> for Header {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width,
            height: d.height,
            colour: d.colour,
        }
    }
}

fn ceil_div(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

/// Smallest `r` with `r * r >= n`.
fn ceil_sqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r.saturating_mul(r) < n {
        r += 1;
    }
    while r > 1 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

/// Pick the canvas for a payload of `len` bytes.
///
/// The result only depends on the arguments, so the same input always gets
/// the same canvas. Without a fixed width the canvas is as close to square as
/// possible; there is always at least one pixel. Canvases whose scanline
/// stream would exceed `max_stream_bytes` are refused, the same bound the
/// decoder applies to IHDR.
pub fn choose_dimensions(
    len: usize,
    colour: ColourType,
    fixed_width: Option<u32>,
    max_stream_bytes: u64,
) -> Result<Dimensions> {
    let bpp = colour.channels() as u64;
    let pixels = ceil_div(len as u64, bpp).max(1);

    let width = match fixed_width {
        Some(0) => {
            return Err(Error::InvalidOptions("canvas width must be at least 1".into()))
        }
        Some(w) => u64::from(w),
        None => ceil_sqrt(pixels),
    };
    let height = ceil_div(pixels, width);

    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(Error::PayloadTooLarge { len: len as u64 });
    }
    let stream_len = height * (1 + width * bpp);
    if stream_len > max_stream_bytes {
        debug!(
            "{}x{} canvas needs {} bytes, limit is {}",
            width, height, stream_len, max_stream_bytes
        );
        return Err(Error::PayloadTooLarge { len: len as u64 });
    }

    Ok(Dimensions {
        width: width as u32,
        height: height as u32,
        colour,
    })
}

/// Copy `payload` onto a fresh canvas, zero padding the remainder.
pub fn pack(
    payload: &[u8],
    colour: ColourType,
    fixed_width: Option<u32>,
    max_stream_bytes: u64,
) -> Result<(Dimensions, Vec<u8>)> {
    let dims = choose_dimensions(payload.len(), colour, fixed_width, max_stream_bytes)?;

    let mut canvas = Vec::with_capacity(dims.canvas_len());
    canvas.extend_from_slice(payload);
    canvas.resize(dims.canvas_len(), 0);

    debug!(
        "packed {} bytes onto {}x{} canvas ({} padding)",
        payload.len(),
        dims.width,
        dims.height,
        canvas.len() - payload.len()
    );

    Ok((dims, canvas))
}

/// Take the first `declared_len` bytes back off a canvas.
pub fn unpack(mut canvas: Vec<u8>, dims: Dimensions, declared_len: u64) -> Result<Vec<u8>> {
    let capacity = dims.canvas_len().min(canvas.len()) as u64;
    if declared_len > capacity || canvas.len() < dims.canvas_len() {
        return Err(Error::PayloadLengthMismatch {
            declared: declared_len,
            capacity,
        });
    }

    canvas.truncate(declared_len as usize);
    Ok(canvas)
}
