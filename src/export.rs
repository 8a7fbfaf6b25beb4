// Generic text writer for ad-hoc report exports

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ClinicError, Result};

/// Write each element as one UTF-8 line terminated by `\n`.
///
/// The file is created or truncated; the handle is closed on every path,
/// including a failed write.
pub fn write_text_file<I, S>(path: &Path, lines: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(path).map_err(|e| ClinicError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for line in lines {
        writeln!(writer, "{}", line.as_ref()).map_err(|e| ClinicError::io(path, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| ClinicError::io(path, e))?;

    debug!("Wrote {} lines to {}", written, path.display());
    Ok(written)
}
