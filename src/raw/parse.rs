use super::{
    Chunk, ChunkName, ColourType, Header, RawChunk, RawPng, BIT_DEPTH, CHUNK_OVERHEAD, IDAT,
    IEND, IHDR, IHDR_LEN, MAX_CHUNK_LEN, PNGR, SIGNATURE,
};
use crate::error::{Error, Result};
use crate::options::DecodeOptions;
use log::{debug, trace};
use nom::{
    bytes::streaming::{tag, take},
    combinator::all_consuming,
    error::ErrorKind,
    number::complete::{be_u32 as be_u32_complete, be_u64, be_u8},
    number::streaming::be_u32,
    sequence::tuple,
    Err as NomErr, IResult,
};
use num_traits::FromPrimitive;
use std::borrow::Cow;

const PLTE: ChunkName = ChunkName(*b"PLTE");

type Parsed<'a, O> = IResult<&'a [u8], O, (&'a [u8], ErrorKind)>;

fn signature<'a>(input: &'a [u8]) -> Parsed<'a, &'a [u8]> {
    tag(&SIGNATURE[..])(input)
}

fn chunk_length<'a>(input: &'a [u8]) -> Parsed<'a, u32> {
    be_u32(input)
}

fn chunk_name<'a>(input: &'a [u8]) -> Parsed<'a, ChunkName> {
    let (input, name) = take(4usize)(input)?;
    Ok((input, ChunkName([name[0], name[1], name[2], name[3]])))
}

fn chunk_body<'a>(input: &'a [u8], length: u32) -> Parsed<'a, (ChunkName, &'a [u8], u32)> {
    let (input, name) = chunk_name(input)?;
    let (input, data) = take(length as usize)(input)?;
    let (input, crc) = be_u32(input)?;
    Ok((input, (name, data, crc)))
}

fn ihdr_fields<'a>(input: &'a [u8]) -> Parsed<'a, (u32, u32, u8, u8, u8, u8, u8)> {
    all_consuming(tuple((
        be_u32_complete,
        be_u32_complete,
        be_u8,
        be_u8,
        be_u8,
        be_u8,
        be_u8,
    )))(input)
}

fn length_field<'a>(input: &'a [u8]) -> Parsed<'a, u64> {
    all_consuming(be_u64)(input)
}

/// Read one chunk starting at `input`, which sits at `offset` in the file.
///
/// Returns the rest of the input after the chunk's CRC. Chunk data is
/// borrowed, never copied.
pub fn read_chunk<'a>(
    input: &'a [u8],
    offset: usize,
    max_len: u32,
) -> Result<(&'a [u8], RawChunk<'a>)> {
    let truncated = |expected: usize| Error::TruncatedChunk {
        offset,
        expected,
        available: input.len(),
    };

    let (rest, length) = chunk_length(input).map_err(|_| truncated(CHUNK_OVERHEAD))?;
    if length > max_len.min(MAX_CHUNK_LEN) {
        return Err(Error::InvalidLength {
            offset,
            length,
            max: max_len.min(MAX_CHUNK_LEN),
        });
    }

    let (rest, (name, data, stored)) =
        chunk_body(rest, length).map_err(|_| truncated(CHUNK_OVERHEAD + length as usize))?;

    let chunk = RawChunk {
        name,
        data: Cow::Borrowed(data),
    };
    let computed = chunk.crc32();
    if computed != stored {
        return Err(Error::ChecksumMismatch {
            chunk: name,
            offset,
            stored,
            computed,
        });
    }

    Ok((rest, chunk))
}

fn unsupported(reason: String) -> Error {
    Error::UnsupportedHeader { reason }
}

fn parse_header(data: &[u8], options: &DecodeOptions) -> Result<Header> {
    let (_, (width, height, bit_depth, colour, compression, filter, interlace)) =
        ihdr_fields(data).map_err(|_| {
            unsupported(format!("IHDR is {} bytes, expected {}", data.len(), IHDR_LEN))
        })?;

    if width == 0 || height == 0 || width > MAX_CHUNK_LEN || height > MAX_CHUNK_LEN {
        return Err(unsupported(format!("image size {}x{}", width, height)));
    }
    if bit_depth != BIT_DEPTH {
        return Err(unsupported(format!("bit depth {}", bit_depth)));
    }
    let colour = ColourType::from_u8(colour)
        .ok_or_else(|| unsupported(format!("colour type {}", colour)))?;
    if compression != 0 || filter != 0 {
        return Err(unsupported(format!(
            "compression method {}, filter method {}",
            compression, filter
        )));
    }
    if interlace != 0 {
        return Err(unsupported(format!("interlace method {}", interlace)));
    }

    let stream_len = u64::from(height) * (1 + u64::from(width) * colour.channels() as u64);
    if stream_len > options.max_canvas_bytes {
        return Err(unsupported(format!(
            "{}x{} image needs {} bytes, limit is {}",
            width, height, stream_len, options.max_canvas_bytes
        )));
    }

    Ok(Header {
        width,
        height,
        colour,
    })
}

/// Where the reader is in the file. Any chunk that does not fit the current
/// state ends the parse with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    ExpectSignature,
    ExpectHeader,
    /// Between IHDR and the end of the IDAT run.
    AccumulatingImageData { seen_data: bool },
    /// The IDAT run is over; only ancillary chunks and IEND may follow.
    ExpectEnd,
    Done,
}

struct Reader<'a> {
    state: ReaderState,
    header: Option<Header>,
    chunks: Vec<Chunk<'a>>,
}

impl<'a> Reader<'a> {
    fn accept(
        &mut self,
        chunk: RawChunk<'a>,
        offset: usize,
        options: &DecodeOptions,
    ) -> Result<()> {
        use ReaderState::*;

        let name = chunk.name;
        if self.state == (AccumulatingImageData { seen_data: true }) && name != IDAT {
            self.state = ExpectEnd;
        }

        match (self.state, name) {
            (ExpectHeader, IHDR) => {
                let header = parse_header(&chunk.data, options)?;
                debug!(
                    "IHDR: {}x{} {:?}",
                    header.width, header.height, header.colour
                );
                self.header = Some(header);
                self.state = AccumulatingImageData { seen_data: false };
            }
            (ExpectHeader, found) => return Err(Error::MissingHeader { found }),

            (AccumulatingImageData { .. }, IDAT) => {
                self.chunks.push(Chunk::Data(chunk.data));
                self.state = AccumulatingImageData { seen_data: true };
            }
            (AccumulatingImageData { seen_data: false }, IEND) => {
                return Err(Error::MissingImageData)
            }
            (ExpectEnd, IEND) => {
                if !chunk.data.is_empty() {
                    return Err(Error::InvalidLength {
                        offset,
                        length: chunk.data.len() as u32,
                        max: 0,
                    });
                }
                self.state = Done;
            }

            (_, PNGR) => {
                let (_, len) = length_field(&chunk.data).map_err(|_| Error::InvalidMetadata {
                    reason: format!("{} bytes, expected 8", chunk.data.len()),
                })?;
                if self.chunks.iter().any(|c| matches!(c, Chunk::Length(_))) {
                    return Err(Error::InvalidMetadata {
                        reason: format!("second {} chunk at offset {}", PNGR, offset),
                    });
                }
                self.chunks.push(Chunk::Length(len));
            }
            (AccumulatingImageData { seen_data: false }, PLTE) => {
                trace!("skipping suggested palette at offset {}", offset);
            }
            (_, other) if other.is_critical() => {
                return Err(Error::UnexpectedChunk {
                    chunk: other,
                    offset,
                })
            }
            (_, other) => {
                trace!("skipping ancillary {} chunk at offset {}", other, offset);
            }
        }
        Ok(())
    }
}

impl<'a> RawPng<'a> {
    /// Parse a whole file, checking every CRC and the chunk order.
    pub fn parse(input: &'a [u8], options: &DecodeOptions) -> Result<Self> {
        options.validate()?;

        let mut reader = Reader {
            state: ReaderState::ExpectSignature,
            header: None,
            chunks: Vec::new(),
        };
        let mut rest = input;

        loop {
            let offset = input.len() - rest.len();
            match reader.state {
                ReaderState::ExpectSignature => {
                    rest = match signature(input) {
                        Ok((rest, _)) => rest,
                        Err(NomErr::Incomplete(_)) => {
                            return Err(Error::TruncatedChunk {
                                offset: 0,
                                expected: SIGNATURE.len(),
                                available: input.len(),
                            })
                        }
                        Err(_) => {
                            return Err(Error::BadSignature {
                                found: input[..input.len().min(SIGNATURE.len())].to_vec(),
                            })
                        }
                    };
                    reader.state = ReaderState::ExpectHeader;
                }
                ReaderState::Done => break,
                _ => {
                    if rest.is_empty() {
                        return Err(Error::MissingEnd { offset });
                    }
                    let (next, chunk) = read_chunk(rest, offset, options.max_chunk_len)?;
                    rest = next;
                    reader.accept(chunk, offset, options)?;
                }
            }
        }

        let header = reader.header.ok_or(Error::MissingImageData)?;
        Ok(RawPng {
            header,
            chunks: reader.chunks,
            trailing: rest,
        })
    }
}
