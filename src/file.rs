use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::InputRead {
        path: path.to_owned(),
        source,
    })
}

/// Write `path` through a temporary file in the same directory, renamed into
/// place only after everything reached the disk. On failure `path` is left as
/// it was and the temporary file is removed.
pub(crate) fn write_output<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let fail = |source: io::Error| Error::OutputWrite {
        path: path.to_owned(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        write(&mut w).map_err(fail)?;
        w.flush().map_err(fail)?;
    }
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
