use std::path::{Path, PathBuf};

use tempfile::TempPath;

/// A compressed voice clip on local disk.
///
/// Downloaded clips own their temp file: dropping the clip deletes it,
/// so cleanup holds on every exit path, including errors and task
/// cancellation. Clips wrapping a caller-supplied path are borrowed and
/// left in place.
#[derive(Debug)]
pub struct VoiceClip {
    location: ClipLocation,
}

#[derive(Debug)]
enum ClipLocation {
    /// Per-invocation temp file, deleted on drop.
    Owned(TempPath),
    /// Caller-managed file, never deleted by us.
    Borrowed(PathBuf),
}

impl VoiceClip {
    /// Wrap a temp file created for this invocation. The clip takes
    /// ownership; the file disappears when the clip is dropped.
    pub fn owned(path: TempPath) -> Self {
        Self {
            location: ClipLocation::Owned(path),
        }
    }

    /// Wrap an existing file without taking ownership.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            location: ClipLocation::Borrowed(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            ClipLocation::Owned(p) => p,
            ClipLocation::Borrowed(p) => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn owned_clip_deletes_file_on_drop() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"OggS").unwrap();
        let path = file.path().to_path_buf();

        let clip = VoiceClip::owned(file.into_temp_path());
        assert!(path.exists());
        drop(clip);
        assert!(!path.exists());
    }

    #[test]
    fn borrowed_clip_leaves_file_alone() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let clip = VoiceClip::from_path(&path);
        assert_eq!(clip.path(), path.as_path());
        drop(clip);
        assert!(path.exists());
    }
}
