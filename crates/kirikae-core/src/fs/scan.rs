use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::hash::sha256sum;
use crate::error::{KirikaeError, Result};
use crate::types::{MediaFile, MediaType};

/// Builds a [`MediaFile`] from what is on disk at `path`: its size and
/// modification time, plus its SHA-256 when `verify_hash` is set.
///
/// Plans built from hashed files let apply verify every move and let undo
/// notice files that changed after they were moved.
///
/// # Errors
///
/// `KirikaeError::Io` if the file cannot be inspected or read.
pub fn describe_file(path: &Path, media_type: MediaType, verify_hash: bool) -> Result<MediaFile> {
    let metadata = path.metadata().map_err(|e| KirikaeError::io(path, e))?;
    let mut file = MediaFile::new(path, media_type);
    file.size = metadata.len();
    if let Ok(modified) = metadata.modified() {
        file.modified_date = DateTime::<Utc>::from(modified);
    }
    if verify_hash {
        let hash = sha256sum(path)?;
        debug!(file = %path.display(), %hash, "hashed");
        file.hash = Some(hash);
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    #[test]
    fn reads_size_and_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Show - S01E01 - Pilot.mkv");
        fs::write(&path, b"abc").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let file = describe_file(&path, MediaType::Tv, false).unwrap();
        assert_eq!(file.size, 3);
        assert_eq!(file.modified_date.timestamp(), 1_700_000_000);
        assert_eq!(file.media_type, MediaType::Tv);
        assert!(file.hash.is_none());
    }

    #[test]
    fn hashes_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mkv");
        fs::write(&path, b"abc").unwrap();

        let file = describe_file(&path, MediaType::Tv, true).unwrap();
        assert_eq!(
            file.hash.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = describe_file(&dir.path().join("gone.mkv"), MediaType::Tv, true).unwrap_err();
        assert!(matches!(err, KirikaeError::Io { .. }));
    }
}
