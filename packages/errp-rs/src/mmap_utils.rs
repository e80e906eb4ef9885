use crate::error::{ErrpError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Open a file and map it into memory (read-only)
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    if !path.exists() {
        return Err(ErrpError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path).map_err(ErrpError::IoError)?;
    // The mapping is only read while the file stays open and unmodified by us.
    let mmap = unsafe { Mmap::map(&file).map_err(ErrpError::IoError)? };
    Ok(mmap)
}
