//! Chunk-level view of a PNG file.
//!
//! Everything here works on framed chunks and knows nothing about pixels or
//! zlib: [`RawPng`] is the ordered list of chunks between the signature and
//! `IEND`, and [`Dump`] writes it back out byte for byte.

mod parse;

pub use parse::{read_chunk, ReaderState};

use crc32fast::Hasher;
use num_derive::FromPrimitive;
use std::borrow::Cow;
use std::fmt;
use std::io::{Result as IoResult, Write};

pub trait Dump {
    fn dump<W: Write>(&self, w: W) -> IoResult<()>;
}

pub const SIGNATURE: &[u8; 8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

pub const IHDR: ChunkName = ChunkName(*b"IHDR");
pub const IDAT: ChunkName = ChunkName(*b"IDAT");
pub const IEND: ChunkName = ChunkName(*b"IEND");
/// Private ancillary chunk holding the original payload length.
pub const PNGR: ChunkName = ChunkName(*b"pnGr");

/// PNG forbids chunk lengths above 2^31 - 1.
pub const MAX_CHUNK_LEN: u32 = i32::MAX as u32;

/// Length, type and CRC fields around the data of every chunk.
pub const CHUNK_OVERHEAD: usize = 12;

const IHDR_LEN: usize = 13;
const BIT_DEPTH: u8 = 8;

/// A four byte chunk type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkName(pub [u8; 4]);

impl ChunkName {
    /// Critical chunks have an uppercase first letter; a decoder that does
    /// not understand one must give up.
    pub fn is_critical(&self) -> bool {
        self.0[0].is_ascii_uppercase()
    }
}

impl fmt::Display for ChunkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum ColourType {
    GreyScale = 0,
    TrueColour = 2,
    GreyScaleAlpha = 4,
    TrueColourAlpha = 6,
}

impl ColourType {
    /// Bytes per pixel at bit depth 8.
    pub fn channels(self) -> usize {
        match self {
            ColourType::GreyScale => 1,
            ColourType::GreyScaleAlpha => 2,
            ColourType::TrueColour => 3,
            ColourType::TrueColourAlpha => 4,
        }
    }
}

impl Default for ColourType {
    fn default() -> Self {
        ColourType::TrueColour
    }
}

/// The parts of IHDR this crate cares about. Bit depth is always 8 and the
/// compression, filter and interlace methods are always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub colour: ColourType,
}

impl Header {
    pub fn to_bytes(&self) -> [u8; IHDR_LEN] {
        let mut out = [0u8; IHDR_LEN];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = BIT_DEPTH;
        out[9] = self.colour as u8;
        // compression, filter method, interlace: all zero
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk<'a> {
    pub name: ChunkName,
    pub data: Cow<'a, [u8]>,
}

impl<'a> RawChunk<'a> {
    pub fn new(name: ChunkName, data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            name,
            data: data.into(),
        }
    }

    pub fn end() -> Self {
        Self {
            name: IEND,
            data: Cow::Borrowed(&[]),
        }
    }

    pub fn crc32(&self) -> u32 {
        crc32(&self.name, &self.data)
    }

    /// Append the framed chunk to `out`.
    pub fn append_to(&self, out: &mut Vec<u8>) {
        out.reserve(CHUNK_OVERHEAD + self.data.len());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.name.0);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc32().to_be_bytes());
    }
}

impl<'a> Dump for RawChunk<'a> {
    fn dump<W: Write>(&self, mut w: W) -> IoResult<()> {
        let size_bytes = (self.data.len() as u32).to_be_bytes();
        let crc = self.crc32().to_be_bytes();

        w.write_all(&size_bytes)?;
        w.write_all(&self.name.0)?;
        w.write_all(&self.data)?;
        w.write_all(&crc)
    }
}

/// Frame `data` as a chunk of type `name`: `length ++ type ++ data ++ crc`.
pub fn write_chunk(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    RawChunk::new(ChunkName(*name), data).append_to(&mut out);
    out
}

/// CRC-32 over a chunk's type and data, as stored after the data.
pub fn crc32(name: &ChunkName, data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&name.0);
    hasher.update(data);
    hasher.finalize()
}

/// A chunk between IHDR and IEND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// `pnGr`: length of the payload before padding.
    Length(u64),
    Data(Cow<'a, [u8]>),
}

impl<'a> Chunk<'a> {
    fn to_raw(&self) -> RawChunk<'_> {
        match self {
            Chunk::Length(len) => RawChunk::new(PNGR, len.to_be_bytes().to_vec()),
            Chunk::Data(data) => RawChunk::new(IDAT, &data[..]),
        }
    }
}

impl<'a> Dump for Chunk<'a> {
    fn dump<W: Write>(&self, w: W) -> IoResult<()> {
        self.to_raw().dump(w)
    }
}

impl Dump for Header {
    fn dump<W: Write>(&self, w: W) -> IoResult<()> {
        RawChunk::new(IHDR, &self.to_bytes()[..]).dump(w)
    }
}

/// A whole PNG file at chunk granularity. `trailing` holds whatever followed
/// IEND in the input; it is never written back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPng<'a> {
    pub header: Header,
    pub chunks: Vec<Chunk<'a>>,
    pub trailing: &'a [u8],
}

impl<'a> RawPng<'a> {
    pub fn new(header: Header, chunks: Vec<Chunk<'a>>) -> Self {
        Self {
            header,
            chunks,
            trailing: &[],
        }
    }

    /// The declared payload length, if the file carries one.
    pub fn payload_len(&self) -> Option<u64> {
        self.chunks.iter().find_map(|c| match c {
            Chunk::Length(len) => Some(*len),
            _ => None,
        })
    }

    /// IDAT payloads in file order.
    pub fn image_data(&self) -> impl Iterator<Item = &[u8]> {
        self.chunks.iter().filter_map(|c| match c {
            Chunk::Data(d) => Some(&d[..]),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = SIGNATURE.to_vec();
        RawChunk::new(IHDR, &self.header.to_bytes()[..]).append_to(&mut out);
        for chunk in &self.chunks {
            chunk.to_raw().append_to(&mut out);
        }
        RawChunk::end().append_to(&mut out);
        out
    }
}

impl<'a> Dump for RawPng<'a> {
    fn dump<W: Write>(&self, mut w: W) -> IoResult<()> {
        w.write_all(SIGNATURE)?;
        self.header.dump(&mut w)?;
        for chunk in &self.chunks {
            chunk.dump(&mut w)?;
        }

        RawChunk::end().dump(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iend_has_the_well_known_crc() {
        let out = write_chunk(b"IEND", &[]);

        assert_eq!(out.len(), CHUNK_OVERHEAD);
        assert_eq!(&out[0..4], &[0, 0, 0, 0]);
        assert_eq!(&out[4..8], b"IEND");
        assert_eq!(&out[8..12], &[0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn chunk_frame_layout() {
        let out = write_chunk(b"tEXt", b"hello");

        assert_eq!(out.len(), 17);
        assert_eq!(&out[0..4], &[0, 0, 0, 5]);
        assert_eq!(&out[4..8], b"tEXt");
        assert_eq!(&out[8..13], b"hello");
        let crc = crc32(&ChunkName(*b"tEXt"), b"hello");
        assert_eq!(&out[13..17], &crc.to_be_bytes());
    }

    #[test]
    fn header_bytes() {
        let header = Header {
            width: 0x0102,
            height: 7,
            colour: ColourType::TrueColourAlpha,
        };
        assert_eq!(
            header.to_bytes(),
            [0, 0, 1, 2, 0, 0, 0, 7, 8, 6, 0, 0, 0]
        );
    }

    #[test]
    fn dump_orders_signature_header_chunks_end() {
        let header = Header {
            width: 1,
            height: 1,
            colour: ColourType::GreyScale,
        };
        let png = RawPng::new(
            header,
            vec![Chunk::Length(1), Chunk::Data(Cow::Borrowed(&[1, 2, 3]))],
        );
        let bytes = png.to_bytes();

        assert_eq!(&bytes[..8], SIGNATURE);
        assert_eq!(&bytes[12..16], b"IHDR");
        // IHDR is 12 + 13 bytes long
        assert_eq!(&bytes[8 + 25 + 4..8 + 25 + 8], b"pnGr");
        assert_eq!(&bytes[bytes.len() - 8..bytes.len() - 4], b"IEND");
    }

    #[test]
    fn chunk_name_display_escapes() {
        assert_eq!(IDAT.to_string(), "IDAT");
        assert_eq!(ChunkName([b'a', 0, b'b', 0xff]).to_string(), "a\\x00b\\xff");
        assert!(IDAT.is_critical());
        assert!(!PNGR.is_critical());
    }
}
