use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::hash::files_identical;
use crate::error::{KirikaeError, Result};

/// Longest path Windows accepts without the extended-length prefix.
const MAX_PATH_LEN: usize = 259;

const EXTENDED_PREFIX: &str = r"\\?\";

/// Behaviour switches for [`atomic_move`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOptions {
    /// Replace an existing, different destination file.
    pub overwrite: bool,
    /// Check preconditions only; touch nothing.
    pub dry_run: bool,
}

impl MoveOptions {
    /// Refuses existing destinations and performs the move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows replacing an existing destination.
    #[must_use]
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Only checks preconditions.
    #[must_use]
    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// What [`atomic_move`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Renamed in place on the same filesystem.
    Renamed,
    /// Copied across filesystems, then the source was removed.
    Copied,
    /// The destination already held the same bytes; the source was removed.
    AlreadyIdentical,
    /// Dry run: the move would have gone ahead.
    DryRun,
}

/// Moves `src` to `dst`, creating parent directories as needed.
///
/// A destination with identical content turns the move into a removal of
/// `src`. A rename that crosses devices falls back to copy plus unlink.
///
/// # Errors
///
/// - `KirikaeError::SourceMissing` if `src` does not exist.
/// - `KirikaeError::DestinationExists` if `dst` exists with different
///   content and `overwrite` is off.
/// - `KirikaeError::Io` for any filesystem failure.
pub fn atomic_move(src: &Path, dst: &Path, options: MoveOptions) -> Result<MoveOutcome> {
    let src = long_path(src);
    let dst = long_path(dst);

    if !src.exists() {
        return Err(KirikaeError::SourceMissing(src.into_owned()));
    }
    if src == dst {
        return Ok(MoveOutcome::AlreadyIdentical);
    }

    if dst.exists() {
        if files_identical(&src, &dst)? {
            debug!(src = %src.display(), dst = %dst.display(), "destination already identical");
            if !options.dry_run {
                fs::remove_file(&src).map_err(|e| KirikaeError::io(&*src, e))?;
            }
            return Ok(MoveOutcome::AlreadyIdentical);
        }
        if !options.overwrite {
            return Err(KirikaeError::DestinationExists(dst.into_owned()));
        }
    }

    if options.dry_run {
        debug!(src = %src.display(), dst = %dst.display(), "dry run move");
        return Ok(MoveOutcome::DryRun);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| KirikaeError::io(parent, e))?;
    }

    match fs::rename(&src, &dst) {
        Ok(()) => Ok(MoveOutcome::Renamed),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            debug!(src = %src.display(), dst = %dst.display(), "cross-device move; copying");
            fs::copy(&src, &dst).map_err(|e| KirikaeError::io(&*dst, e))?;
            fs::remove_file(&src).map_err(|e| KirikaeError::io(&*src, e))?;
            Ok(MoveOutcome::Copied)
        }
        Err(err) => Err(KirikaeError::io(&*src, err)),
    }
}

/// Adds the `\\?\` prefix to over-long paths on Windows; a no-op elsewhere.
#[must_use]
pub fn long_path(path: &Path) -> Cow<'_, Path> {
    extended_length(path, cfg!(windows))
}

fn extended_length(path: &Path, enabled: bool) -> Cow<'_, Path> {
    let raw = path.to_string_lossy();
    if enabled && raw.len() > MAX_PATH_LEN && !raw.starts_with(EXTENDED_PREFIX) {
        Cow::Owned(PathBuf::from(format!("{EXTENDED_PREFIX}{raw}")))
    } else {
        Cow::Borrowed(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_into_new_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.mkv");
        let dst = dir.path().join("TV Shows/Show/Season 01/a.mkv");
        fs::write(&src, b"data").unwrap();

        let outcome = atomic_move(&src, &dst, MoveOptions::new()).unwrap();
        assert_eq!(outcome, MoveOutcome::Renamed);
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"data");
    }

    #[test]
    fn refuses_existing_destination_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        let err = atomic_move(&src, &dst, MoveOptions::new()).unwrap_err();
        assert!(matches!(err, KirikaeError::DestinationExists(_)));
        assert!(src.exists());

        atomic_move(&src, &dst, MoveOptions::new().with_overwrite(true)).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
    }

    #[test]
    fn identical_destination_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"same").unwrap();
        fs::write(&dst, b"same").unwrap();

        let outcome = atomic_move(&src, &dst, MoveOptions::new()).unwrap();
        assert_eq!(outcome, MoveOutcome::AlreadyIdentical);
        assert!(!src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("sub/b");
        fs::write(&src, b"x").unwrap();

        let outcome = atomic_move(&src, &dst, MoveOptions::new().with_dry_run(true)).unwrap();
        assert_eq!(outcome, MoveOutcome::DryRun);
        assert!(src.exists());
        assert!(!dir.path().join("sub").exists());
    }

    #[test]
    fn missing_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = atomic_move(&dir.path().join("nope"), &dir.path().join("b"), MoveOptions::new())
            .unwrap_err();
        assert!(matches!(err, KirikaeError::SourceMissing(_)));
    }

    #[test]
    fn extended_length_prefix_only_when_long() {
        let short = Path::new("C:/media/a.mkv");
        assert_eq!(extended_length(short, true), Cow::Borrowed(short));

        let long = PathBuf::from(format!("C:/{}", "x".repeat(300)));
        let prefixed = extended_length(&long, true);
        assert!(prefixed.to_string_lossy().starts_with(EXTENDED_PREFIX));
        assert_eq!(extended_length(&prefixed, true), prefixed);
        assert_eq!(extended_length(&long, false), Cow::Borrowed(long.as_path()));
    }
}
