//! Scanline filtering.
//!
//! Each row of the canvas is stored behind a one byte tag naming the filter
//! that was applied to it. The encoder uses [`FilterType::None`] unless told
//! otherwise, but the decoder undoes all five so that PNGs written by other
//! tools can be read too.

use crate::canvas::Dimensions;
use crate::error::{Error, Result, ScanlineFault};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        FilterType::from_u8(tag)
    }
}

impl Default for FilterType {
    fn default() -> Self {
        FilterType::None
    }
}

fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    // ties are broken in this exact order
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// The value `filter` predicts for byte `i` of a row, given the bytes already
/// known to its left (`row`, unfiltered) and the previous unfiltered row.
fn predict(filter: FilterType, row: &[u8], prev: &[u8], i: usize, bpp: usize) -> u8 {
    let a = if i >= bpp { row[i - bpp] } else { 0 };
    let b = prev[i];
    match filter {
        FilterType::None => 0,
        FilterType::Sub => a,
        FilterType::Up => b,
        FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
        FilterType::Paeth => {
            let c = if i >= bpp { prev[i - bpp] } else { 0 };
            paeth_predict(a, b, c)
        }
    }
}

/// Prefix every row of `canvas` with `filter`'s tag and apply the filter.
///
/// `canvas` must hold exactly `dims.canvas_len()` bytes.
pub fn filter_scanlines(canvas: &[u8], dims: Dimensions, filter: FilterType) -> Vec<u8> {
    debug_assert_eq!(canvas.len(), dims.canvas_len());

    let row_len = dims.row_len();
    let bpp = dims.bytes_per_pixel();
    let zeros = vec![0u8; row_len];

    let mut out = Vec::with_capacity(dims.scanline_stream_len());
    let mut prev: &[u8] = &zeros;
    for row in canvas.chunks_exact(row_len) {
        out.push(filter as u8);
        if filter == FilterType::None {
            out.extend_from_slice(row);
        } else {
            out.extend(
                (0..row_len).map(|i| row[i].wrapping_sub(predict(filter, row, prev, i, bpp))),
            );
        }
        prev = row;
    }
    out
}

/// Undo the filtering of a whole scanline stream and drop the tags.
///
/// Fails if the stream is not exactly `height` rows of `1 + row_len` bytes or
/// a row names a filter outside 0..=4.
pub fn unfilter_scanlines(stream: &[u8], dims: Dimensions) -> Result<Vec<u8>> {
    let expected = dims.scanline_stream_len();
    if stream.len() != expected {
        return Err(Error::MalformedScanline(ScanlineFault::StreamLength {
            expected,
            actual: stream.len(),
        }));
    }

    let row_len = dims.row_len();
    let bpp = dims.bytes_per_pixel();
    let zeros = vec![0u8; row_len];

    let mut out = Vec::with_capacity(dims.canvas_len());
    for (row, line) in stream.chunks_exact(row_len + 1).enumerate() {
        let tag = line[0];
        let filter = FilterType::from_tag(tag).ok_or(Error::MalformedScanline(
            ScanlineFault::UnknownFilter {
                row: row as u32,
                tag,
            },
        ))?;

        let start = out.len();
        out.extend_from_slice(&line[1..]);
        let (done, current) = out.split_at_mut(start);
        let prev = if start == 0 { &zeros[..] } else { &done[start - row_len..] };
        unfilter_row(filter, current, prev, bpp);
    }
    Ok(out)
}

fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], bpp: usize) {
    match filter {
        FilterType::None => {}
        FilterType::Up => {
            for (x, b) in row.iter_mut().zip(prev) {
                *x = x.wrapping_add(*b);
            }
        }
        FilterType::Sub | FilterType::Average | FilterType::Paeth => {
            // left to right: predictions read bytes already restored
            for i in 0..row.len() {
                let p = predict(filter, row, prev, i, bpp);
                row[i] = row[i].wrapping_add(p);
            }
        }
    }
}
