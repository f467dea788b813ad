use crate::error::ContractError;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Result of a create-exclusive write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist and now holds the given bytes.
    Created,
    /// The file already held exactly these bytes; nothing was written.
    Reproduced,
}

/// Write `bytes` to `path` exactly once.
///
/// The bytes go to a temporary file in the target directory which is then
/// linked into place without clobbering, so readers never observe a partial
/// file. An existing file with identical content is reported as
/// [`WriteOutcome::Reproduced`]; different content is
/// [`ContractError::Conflict`] and the existing file is left untouched.
pub fn write_once(path: &Path, bytes: &[u8]) -> Result<WriteOutcome, ContractError> {
    let dir = path.parent().ok_or_else(|| {
        ContractError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "target path has no parent directory",
        ))
    })?;
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;

    match staged.persist_noclobber(path) {
        Ok(_) => Ok(WriteOutcome::Created),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            let existing = fs::read(path)?;
            if existing == bytes {
                Ok(WriteOutcome::Reproduced)
            } else {
                Err(ContractError::Conflict {
                    path: path.display().to_string(),
                })
            }
        }
        Err(e) => Err(ContractError::Io(e.error)),
    }
}
