//! Scratch directories for metadata patch passes.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every scratch directory name.
pub const SCRATCH_PREFIX: &str = ".renderforge-patch-";

/// Scratch directory owned by one patch pass over one output file.
///
/// The directory is created next to the output (same filesystem, so the
/// final swap is a rename) under an invocation-unique name. It is removed
/// together with everything inside it when the `ScratchDir` is dropped,
/// whether the patch succeeded or not.
///
/// # Example
///
/// ```no_run
/// use renderforge_av::ScratchDir;
///
/// let scratch = ScratchDir::beside("/music/song.mp3")?;
/// let patched = scratch.patched_copy();
/// // ... write the patched file to `patched` ...
/// scratch.swap_into_place(&patched)?;
/// # Ok::<(), renderforge_av::Error>(())
/// ```
pub struct ScratchDir {
    temp_dir: TempDir,
    target: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory in the parent directory of `target`.
    pub fn beside<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if target.file_name().is_none() {
            return Err(Error::Workspace(format!(
                "Invalid output file path: {:?}",
                target
            )));
        }

        let temp_dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&parent)
            .map_err(|e| Error::Workspace(format!("failed to create scratch dir: {e}")))?;

        tracing::trace!("Created scratch dir {:?}", temp_dir.path());

        Ok(Self {
            temp_dir,
            target: target.to_path_buf(),
        })
    }

    /// The file this scratch directory patches.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path to the scratch directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named temporary file inside the scratch directory.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Path for the patched copy of the target (same file name, inside the
    /// scratch directory).
    pub fn patched_copy(&self) -> PathBuf {
        let file_name = self
            .target
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("output"));
        self.temp_dir.path().join(file_name)
    }

    /// Replace the target with `patched`.
    ///
    /// On Unix this is a single rename over the target. Elsewhere the target
    /// is first moved into the scratch directory and restored if the second
    /// rename fails, so the target is never lost.
    ///
    /// # Errors
    ///
    /// Returns an error if `patched` does not exist or a rename fails.
    pub fn swap_into_place(&self, patched: &Path) -> Result<()> {
        if !patched.exists() {
            return Err(Error::Workspace(format!(
                "Patched file does not exist: {:?}",
                patched
            )));
        }

        #[cfg(unix)]
        {
            std::fs::rename(patched, &self.target).map_err(|e| {
                Error::Workspace(format!("Failed to move patched file into place: {}", e))
            })?;
        }

        #[cfg(not(unix))]
        self.swap_with_backup(patched)?;

        tracing::debug!("Swapped patched copy into {:?}", self.target);
        Ok(())
    }

    /// Swap for hosts where a rename cannot replace an existing file: the
    /// target is set aside in its own subdirectory of the scratch directory
    /// and put back if the patched file cannot take its place.
    #[cfg_attr(unix, allow(dead_code))]
    fn swap_with_backup(&self, patched: &Path) -> Result<()> {
        let holding = tempfile::Builder::new()
            .prefix(".unpatched-")
            .tempdir_in(self.temp_dir.path())
            .map_err(|e| Error::Workspace(format!("Failed to create backup dir: {}", e)))?;
        let file_name = self
            .target
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("output"));
        let backup = holding.path().join(file_name);

        std::fs::rename(&self.target, &backup).map_err(|e| {
            Error::Workspace(format!("Failed to set aside unpatched file: {}", e))
        })?;
        if let Err(e) = std::fs::rename(patched, &self.target) {
            let _ = std::fs::rename(&backup, &self.target);
            return Err(Error::Workspace(format!(
                "Failed to move patched file into place: {}",
                e
            )));
        }
        Ok(())
    }

    /// Remove the scratch directory now, reporting failures.
    ///
    /// Dropping the `ScratchDir` removes it as well but ignores errors.
    pub fn close(self) -> Result<()> {
        self.temp_dir
            .close()
            .map_err(|e| Error::Workspace(format!("failed to remove scratch dir: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scratch_paths() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mp3");
        let scratch = ScratchDir::beside(&target).unwrap();

        assert_eq!(scratch.target(), target);
        assert!(scratch.path().starts_with(dir.path()));
        assert!(scratch
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
        assert!(scratch.patched_copy().starts_with(scratch.path()));
        assert_eq!(scratch.patched_copy().file_name().unwrap(), "song.mp3");
        assert_eq!(scratch.temp_file("song.jpg").file_name().unwrap(), "song.jpg");
    }

    #[test]
    fn test_scratch_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mp3");
        let a = ScratchDir::beside(&target).unwrap();
        let b = ScratchDir::beside(&target).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_swap_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mp3");
        fs::write(&target, b"unpatched").unwrap();

        let scratch = ScratchDir::beside(&target).unwrap();
        let patched = scratch.patched_copy();
        fs::write(&patched, b"patched").unwrap();

        scratch.swap_into_place(&patched).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "patched");
        assert!(!patched.exists());
    }

    #[test]
    fn test_swap_without_patched_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mp3");
        fs::write(&target, b"unpatched").unwrap();

        let scratch = ScratchDir::beside(&target).unwrap();
        assert!(scratch.swap_into_place(&scratch.patched_copy()).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "unpatched");
    }

    #[test]
    fn test_backup_swap_with_colliding_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("unpatched.bak");
        fs::write(&target, b"original").unwrap();

        let scratch = ScratchDir::beside(&target).unwrap();
        let patched = scratch.patched_copy();
        fs::write(&patched, b"patched").unwrap();

        scratch.swap_with_backup(&patched).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"patched");
        assert!(!patched.exists());
    }

    #[test]
    fn test_backup_swap_restores_target_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mp3");
        fs::write(&target, b"original").unwrap();

        let scratch = ScratchDir::beside(&target).unwrap();
        let missing = scratch.temp_file("never-written.mp3");
        assert!(scratch.swap_with_backup(&missing).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"original");
    }

    #[test]
    fn test_drop_removes_dir_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::beside(dir.path().join("song.mp3")).unwrap();
        let path = scratch.path().to_path_buf();
        fs::write(scratch.temp_file("cover.jpg"), b"jpg").unwrap();

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_close_removes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::beside(dir.path().join("song.mp3")).unwrap();
        let path = scratch.path().to_path_buf();
        scratch.close().unwrap();
        assert!(!path.exists());
    }
}
