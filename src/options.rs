use crate::error::{Error, Result};
use crate::filter::FilterType;
use crate::raw::{ColourType, MAX_CHUNK_LEN};

pub const DEFAULT_IDAT_LEN: usize = 1 << 16;
pub const DEFAULT_MAX_CANVAS_BYTES: u64 = 1 << 30;

/// How the encoder lays out and compresses the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub colour: ColourType,
    /// Fixed canvas width in pixels. `None` picks a near-square canvas.
    pub width: Option<u32>,
    /// zlib level, 0 (store) to 9.
    pub level: u32,
    pub filter: FilterType,
    pub max_idat_len: usize,
    /// Largest scanline stream the canvas may need. Matches
    /// `DecodeOptions::max_canvas_bytes` so every image written can be read
    /// back with the same limit.
    pub max_canvas_bytes: u64,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            colour: ColourType::default(),
            width: None,
            level: 1,
            filter: FilterType::None,
            max_idat_len: DEFAULT_IDAT_LEN,
            max_canvas_bytes: DEFAULT_MAX_CANVAS_BYTES,
        }
    }
}

impl EncodeOptions {
    pub fn with_colour(mut self, colour: ColourType) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_idat_len(mut self, len: usize) -> Self {
        self.max_idat_len = len;
        self
    }

    pub fn with_max_canvas_bytes(mut self, bytes: u64) -> Self {
        self.max_canvas_bytes = bytes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.level > 9 {
            return Err(Error::InvalidOptions(format!(
                "compression level {} is not in 0..=9",
                self.level
            )));
        }
        if self.width == Some(0) {
            return Err(Error::InvalidOptions("canvas width must be at least 1".into()));
        }
        if self.max_idat_len == 0 || self.max_idat_len > MAX_CHUNK_LEN as usize {
            return Err(Error::InvalidOptions(format!(
                "IDAT size {} is not in 1..={}",
                self.max_idat_len, MAX_CHUNK_LEN
            )));
        }
        Ok(())
    }
}

/// Limits applied while reading an untrusted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_chunk_len: u32,
    /// Upper bound on the inflated scanline stream an IHDR may ask for.
    pub max_canvas_bytes: u64,
    /// Fail with `MissingMetadata` instead of returning the whole canvas when
    /// the file has no payload length chunk.
    pub require_length: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_chunk_len: MAX_CHUNK_LEN,
            max_canvas_bytes: DEFAULT_MAX_CANVAS_BYTES,
            require_length: false,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_chunk_len(mut self, len: u32) -> Self {
        self.max_chunk_len = len;
        self
    }

    pub fn with_max_canvas_bytes(mut self, bytes: u64) -> Self {
        self.max_canvas_bytes = bytes;
        self
    }

    pub fn require_length(mut self, require: bool) -> Self {
        self.require_length = require;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_len > MAX_CHUNK_LEN {
            return Err(Error::InvalidOptions(format!(
                "chunk length limit {} exceeds the PNG maximum {}",
                self.max_chunk_len, MAX_CHUNK_LEN
            )));
        }
        Ok(())
    }
}
