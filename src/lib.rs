//! Turn any file into a valid PNG image and back again, bit for bit.
//!
//! Encoding packs the payload onto an 8-bit canvas, prefixes every row with
//! a filter tag, deflates the rows into IDAT chunks and records the exact
//! payload length in a private `pnGr` chunk. Decoding checks every chunk's
//! CRC and the chunk order, then undoes those steps.
//!
//! ```
//! let png = pnger::encode(b"hello", &Default::default()).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! assert_eq!(pnger::decode(&png, &Default::default()).unwrap(), b"hello");
//! ```

pub mod canvas;
pub mod error;
mod file;
pub mod filter;
pub mod legacy;
pub mod options;
pub mod raw;
pub mod zlib;

pub use canvas::Dimensions;
pub use error::{Error, Result, ScanlineFault};
pub use filter::FilterType;
pub use options::{DecodeOptions, EncodeOptions};
pub use raw::ColourType;

use log::{debug, info, warn};
use raw::{Chunk, Dump, Header, RawPng};
use std::borrow::Cow;
use std::convert::TryFrom;
use std::io::Write;
use std::path::Path;

/// A container between the chunk layer and the payload: the header, the
/// declared payload length and the inflated scanline stream, filter tags
/// included.
#[derive(Debug)]
pub struct Png {
    pub header: Header,
    pub payload_len: Option<u64>,
    pub data: Vec<u8>,
}

impl Png {
    pub fn from_payload(payload: &[u8], options: &EncodeOptions) -> Result<Self> {
        options.validate()?;

        let (dims, canvas) = canvas::pack(
            payload,
            options.colour,
            options.width,
            options.max_canvas_bytes,
        )?;
        let data = filter::filter_scanlines(&canvas, dims, options.filter);

        Ok(Png {
            header: dims.into(),
            payload_len: Some(payload.len() as u64),
            data,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.header.into()
    }

    /// Unfilter the rows and cut the canvas down to the declared length. A
    /// file without a length chunk gives back the whole canvas.
    pub fn into_payload(self) -> Result<Vec<u8>> {
        let dims = self.dimensions();
        let canvas = filter::unfilter_scanlines(&self.data, dims)?;

        match self.payload_len {
            Some(len) => canvas::unpack(canvas, dims, len),
            None => {
                warn!(
                    "no {} chunk, returning the whole {} byte canvas",
                    raw::PNGR,
                    canvas.len()
                );
                Ok(canvas)
            }
        }
    }

    pub fn to_raw(&self, options: &EncodeOptions) -> Result<RawPng<'static>> {
        let mut chunks = Vec::new();
        if let Some(len) = self.payload_len {
            chunks.push(Chunk::Length(len));
        }
        for piece in zlib::deflate(&self.data, options.level, options.max_idat_len)? {
            chunks.push(Chunk::Data(Cow::Owned(piece)));
        }

        Ok(RawPng::new(self.header, chunks))
    }
}

impl<'a> TryFrom<RawPng<'a>> for Png {
    type Error = Error;

    fn try_from(raw: RawPng<'a>) -> Result<Self> {
        let dims = Dimensions::from(raw.header);
        let data = zlib::inflate(raw.image_data(), dims.scanline_stream_len())?;

        Ok(Png {
            header: raw.header,
            payload_len: raw.payload_len(),
            data,
        })
    }
}

/// Wrap `payload` in a PNG file held in memory.
pub fn encode(payload: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    let raw = Png::from_payload(payload, options)?.to_raw(options)?;
    Ok(raw.to_bytes())
}

/// Recover the payload from a PNG file held in memory.
pub fn decode(png: &[u8], options: &DecodeOptions) -> Result<Vec<u8>> {
    let raw = RawPng::parse(png, options)?;
    if !raw.trailing.is_empty() {
        warn!("ignoring {} bytes after IEND", raw.trailing.len());
    }
    if options.require_length && raw.payload_len().is_none() {
        return Err(Error::MissingMetadata);
    }

    Png::try_from(raw)?.into_payload()
}

/// Read `input`, wrap it and write the PNG to `output`. `output` is only
/// replaced once the whole image has been written.
pub fn encode_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &EncodeOptions,
) -> Result<Dimensions> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let payload = file::read_input(input)?;
    debug!("read {} bytes from {}", payload.len(), input.display());

    let png = Png::from_payload(&payload, options)?;
    let dims = png.dimensions();
    let raw = png.to_raw(options)?;
    file::write_output(output, |w| raw.dump(w))?;

    info!(
        "{} -> {}: {} bytes in a {}x{} {:?} image",
        input.display(),
        output.display(),
        payload.len(),
        dims.width,
        dims.height,
        dims.colour
    );
    Ok(dims)
}

/// Read the PNG at `input` and write the recovered payload to `output`.
/// Returns the payload length.
pub fn decode_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let png = file::read_input(input)?;
    let payload = decode(&png, options)?;
    file::write_output(output, |w| w.write_all(&payload))?;

    info!(
        "{} -> {}: recovered {} bytes",
        input.display(),
        output.display(),
        payload.len()
    );
    Ok(payload.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_through_raw() {
        let options = EncodeOptions::default();
        let png = Png::from_payload(b"some payload", &options).unwrap();
        let stream = png.data.clone();

        let raw = png.to_raw(&options).unwrap();
        assert_eq!(raw.payload_len(), Some(12));

        let back = Png::try_from(raw).unwrap();
        assert_eq!(back.data, stream);
        assert_eq!(back.into_payload().unwrap(), b"some payload");
    }

    #[test]
    fn dump_matches_to_bytes() {
        let options = EncodeOptions::default().with_max_idat_len(7);
        let raw = Png::from_payload(&[0xAA; 100], &options)
            .unwrap()
            .to_raw(&options)
            .unwrap();

        let mut dumped = Vec::new();
        raw.dump(&mut dumped).unwrap();
        assert_eq!(dumped, raw.to_bytes());
    }

    #[test]
    fn without_length_the_whole_canvas_comes_back() {
        let options = EncodeOptions::default();
        let mut png = Png::from_payload(b"abcd", &options).unwrap();
        png.payload_len = None;
        let bytes = png.to_raw(&options).unwrap().to_bytes();

        // 4 bytes on an RGB canvas: 2x1 pixels
        assert_eq!(
            decode(&bytes, &DecodeOptions::default()).unwrap(),
            b"abcd\0\0"
        );
        assert!(matches!(
            decode(&bytes, &DecodeOptions::default().require_length(true)),
            Err(Error::MissingMetadata)
        ));
    }

    #[test]
    fn declared_length_larger_than_canvas() {
        let options = EncodeOptions::default();
        let mut png = Png::from_payload(b"abc", &options).unwrap();
        png.payload_len = Some(4);
        let bytes = png.to_raw(&options).unwrap().to_bytes();

        assert!(matches!(
            decode(&bytes, &DecodeOptions::default()),
            Err(Error::PayloadLengthMismatch {
                declared: 4,
                capacity: 3
            })
        ));
    }

    #[test]
    fn encoder_refuses_what_the_decoder_would_refuse() {
        let options = EncodeOptions::default()
            .with_colour(ColourType::TrueColourAlpha)
            .with_width(1 << 28);
        assert!(matches!(
            encode(b"x", &options),
            Err(Error::PayloadTooLarge { len: 1 })
        ));

        // 10 RGB bytes on a 2x2 canvas: 2 * (1 + 6) = 14 stream bytes
        let payload = b"0123456789";
        let at_limit = EncodeOptions::default().with_max_canvas_bytes(14);
        let png = encode(payload, &at_limit).unwrap();
        let decode_options = DecodeOptions::default().with_max_canvas_bytes(14);
        assert_eq!(decode(&png, &decode_options).unwrap(), payload);

        let past_limit = EncodeOptions::default().with_max_canvas_bytes(13);
        assert!(matches!(
            encode(payload, &past_limit),
            Err(Error::PayloadTooLarge { len: 10 })
        ));
    }
}
