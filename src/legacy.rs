//! Reading files made by the first pnger, which did not encode anything: it
//! wrote one fixed, complete PNG and appended the payload after its IEND
//! chunk. Viewers stop at IEND, so the payload rode along unseen.

use crate::error::Result;
use crate::file;
use crate::options::DecodeOptions;
use crate::raw::RawPng;
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// Check the carrier image and return everything after its IEND chunk.
pub fn extract<'a>(png: &'a [u8], options: &DecodeOptions) -> Result<&'a [u8]> {
    let raw = RawPng::parse(png, options)?;
    debug!(
        "carrier image {}x{}, {} bytes appended",
        raw.header.width,
        raw.header.height,
        raw.trailing.len()
    );
    Ok(raw.trailing)
}

pub fn decode_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());

    let png = file::read_input(input)?;
    let payload = extract(&png, options)?;
    file::write_output(output, |w| w.write_all(payload))?;

    info!(
        "{} -> {}: extracted {} appended bytes",
        input.display(),
        output.display(),
        payload.len()
    );
    Ok(payload.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const CARRIER: &[u8] = include_bytes!("../tests/fixtures/original_header.png");

    #[test]
    fn returns_appended_bytes() {
        let mut file = CARRIER.to_vec();
        file.extend_from_slice(b"This is a test file for pnger.\nWith multiple lines.");

        let payload = extract(&file, &DecodeOptions::default()).unwrap();
        assert_eq!(payload, &b"This is a test file for pnger.\nWith multiple lines."[..]);
    }

    #[test]
    fn empty_payload() {
        assert!(extract(CARRIER, &DecodeOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn carrier_must_be_intact() {
        assert!(matches!(
            extract(b"small", &DecodeOptions::default()),
            Err(Error::BadSignature { .. })
        ));

        let mut file = CARRIER.to_vec();
        file[40] ^= 1;
        assert!(matches!(
            extract(&file, &DecodeOptions::default()),
            Err(Error::ChecksumMismatch { .. })
        ));
    }
}
