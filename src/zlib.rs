//! The zlib wrapper around the scanline stream.

use crate::error::{Error, Result};
use flate2::bufread::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use log::debug;
use std::io::Read;

/// Compress `stream` and cut the result into pieces of at most
/// `max_piece_len` bytes, one per IDAT chunk.
pub fn deflate(stream: &[u8], level: u32, max_piece_len: usize) -> Result<Vec<Vec<u8>>> {
    let mut encoder = ZlibEncoder::new(stream, Compression::new(level));
    let mut pieces = Vec::new();

    loop {
        let mut piece = Vec::with_capacity(max_piece_len.min(1 << 16));
        let read = (&mut encoder)
            .take(max_piece_len as u64)
            .read_to_end(&mut piece)
            .map_err(Error::Compress)?;
        if read == 0 {
            break;
        }
        pieces.push(piece);
    }

    debug!(
        "deflated {} bytes into {} IDAT piece(s), {} bytes total",
        stream.len(),
        pieces.len(),
        encoder.total_out()
    );
    Ok(pieces)
}

/// Join the IDAT pieces in order and inflate them.
///
/// The result must be exactly `expected_len` bytes and the zlib stream must
/// end exactly at the end of the last piece. No more than `expected_len + 1`
/// bytes of output are ever allocated.
pub fn inflate<'a, I>(pieces: I, expected_len: usize) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut compressed = Vec::new();
    for piece in pieces {
        compressed.extend_from_slice(piece);
    }

    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(expected_len + 1);
    let status = inflater
        .decompress_vec(&compressed, &mut out, FlushDecompress::Finish)
        .map_err(|e| Error::CorruptStream(e.to_string()))?;

    if status != Status::StreamEnd {
        return Err(Error::CorruptStream(if out.len() > expected_len {
            format!("inflates to more than {} bytes", expected_len)
        } else {
            format!(
                "stream ends early after {} of {} bytes",
                out.len(),
                expected_len
            )
        }));
    }
    if out.len() != expected_len {
        return Err(Error::CorruptStream(format!(
            "inflated to {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    let consumed = inflater.total_in() as usize;
    if consumed != compressed.len() {
        return Err(Error::CorruptStream(format!(
            "{} bytes left over after end of stream",
            compressed.len() - consumed
        )));
    }

    debug!("inflated {} bytes into {}", compressed.len(), out.len());
    Ok(out)
}
