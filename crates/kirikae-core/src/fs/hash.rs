use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{KirikaeError, Result};

/// Read size used while hashing; large media files are never loaded whole.
const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// SHA-256 of the file at `path` as lowercase hex.
///
/// # Errors
///
/// `KirikaeError::Io` if the file cannot be opened or read.
pub fn sha256sum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| KirikaeError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(|e| KirikaeError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether two files hold the same bytes. Sizes are compared before hashing.
///
/// # Errors
///
/// `KirikaeError::Io` if either file cannot be read.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let len_a = a.metadata().map_err(|e| KirikaeError::io(a, e))?.len();
    let len_b = b.metadata().map_err(|e| KirikaeError::io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }
    Ok(sha256sum(a)? == sha256sum(b)?)
}
