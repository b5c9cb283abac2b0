//! Path helpers for turn audio artifacts.
//!
//! Captured input and synthesized output live under
//! `~/.local/share/voxloop/audio/` and are overwritten every turn.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding the per-turn audio artifacts.
pub fn audio_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxloop")
        .join("audio")
}

/// Create the audio artifact directory if it doesn't exist.
pub fn create_audio_dir() -> io::Result<PathBuf> {
    let dir = audio_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Force a `.wav` extension on a capture destination.
pub fn normalize_wav_extension(path: &Path) -> PathBuf {
    path.with_extension("wav")
}

/// Best-effort, idempotent file deletion.
///
/// Deleting a file that is already gone is not an error; any other failure
/// is logged and swallowed so cleanup can never fail a turn.
pub fn delete_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Deleted audio file: {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to delete {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_replaces_and_adds_extension() {
        assert_eq!(
            normalize_wav_extension(Path::new("/tmp/input.mp3")),
            PathBuf::from("/tmp/input.wav")
        );
        assert_eq!(
            normalize_wav_extension(Path::new("/tmp/input")),
            PathBuf::from("/tmp/input.wav")
        );
        assert_eq!(
            normalize_wav_extension(Path::new("/tmp/input.wav")),
            PathBuf::from("/tmp/input.wav")
        );
    }

    #[test]
    fn delete_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"riff").unwrap();

        delete_file(&path);
        assert!(!path.exists());

        // Second delete and a never-existed path must not panic.
        delete_file(&path);
        delete_file(&dir.path().join("never-created.wav"));
    }

    #[test]
    fn audio_dir_is_under_voxloop() {
        let dir = audio_dir();
        assert!(dir.to_string_lossy().contains("voxloop"));
        assert!(dir.to_string_lossy().contains("audio"));
    }
}
