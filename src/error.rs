use crate::raw::ChunkName;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while wrapping or unwrapping a payload.
///
/// None of these are recoverable: the encoder does not retry and the decoder
/// never hands back partial output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read input file {}: {source}", .path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write output file {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a PNG file: signature is {found:02x?}")]
    BadSignature { found: Vec<u8> },

    #[error(
        "checksum mismatch in {chunk} chunk at offset {offset}: \
         stored {stored:#010x}, computed {computed:#010x}"
    )]
    ChecksumMismatch {
        chunk: ChunkName,
        offset: usize,
        stored: u32,
        computed: u32,
    },

    #[error(
        "truncated chunk at offset {offset}: needs {expected} bytes, \
         only {available} left"
    )]
    TruncatedChunk {
        offset: usize,
        expected: usize,
        available: usize,
    },

    #[error("chunk at offset {offset} declares length {length}, limit is {max}")]
    InvalidLength { offset: usize, length: u32, max: u32 },

    #[error("first chunk must be IHDR, found {found}")]
    MissingHeader { found: ChunkName },

    #[error("unsupported IHDR: {reason}")]
    UnsupportedHeader { reason: String },

    #[error("unexpected {chunk} chunk at offset {offset}")]
    UnexpectedChunk { chunk: ChunkName, offset: usize },

    #[error("no IDAT chunk before IEND")]
    MissingImageData,

    #[error("file ends at offset {offset} without an IEND chunk")]
    MissingEnd { offset: usize },

    #[error("invalid payload length chunk: {reason}")]
    InvalidMetadata { reason: String },

    #[error("no payload length chunk in file")]
    MissingMetadata,

    #[error("malformed scanline: {0}")]
    MalformedScanline(ScanlineFault),

    #[error("corrupt image data stream: {0}")]
    CorruptStream(String),

    #[error("compressing image data failed: {0}")]
    Compress(#[source] io::Error),

    #[error("declared payload length {declared} does not fit in {capacity} canvas bytes")]
    PayloadLengthMismatch { declared: u64, capacity: u64 },

    #[error("payload of {len} bytes does not fit a PNG canvas")]
    PayloadTooLarge { len: u64 },

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// The ways a filtered scanline stream can be wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanlineFault {
    #[error("row {row} uses unknown filter type {tag}")]
    UnknownFilter { row: u32, tag: u8 },

    #[error("stream is {actual} bytes, expected {expected}")]
    StreamLength { expected: usize, actual: usize },
}
