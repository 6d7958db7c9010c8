//! Save without a chosen destination: the download directory, browser style.

use anyhow::Context;
use std::path::{Path, PathBuf};

use super::SaveError;
use crate::downloader::MediaPayload;
use crate::storage::{unique_path, StorageWriter};
use crate::url_model::sanitize_filename;

/// Writes `payload` into `dir` under the sanitized suggested name, picking
/// `name (1).ext`, `name (2).ext`, ... if the name is taken.
pub fn save_ephemeral(
    payload: &MediaPayload,
    suggested_filename: &str,
    dir: &Path,
) -> Result<PathBuf, SaveError> {
    let mut name = sanitize_filename(suggested_filename);
    if name.is_empty() {
        name = payload.kind.default_filename();
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating download directory {}", dir.display()))?;

    let path = unique_path(dir, &name);
    let mut writer = StorageWriter::create(&path)?;
    writer.write_all(&payload.bytes)?;
    writer.commit()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    fn audio(bytes: &[u8]) -> MediaPayload {
        MediaPayload {
            bytes: bytes.to_vec(),
            kind: MediaKind::Audio,
        }
    }

    #[test]
    fn does_not_overwrite_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_ephemeral(&audio(b"1"), "song.mp3", dir.path()).unwrap();
        let second = save_ephemeral(&audio(b"2"), "song.mp3", dir.path()).unwrap();
        assert_eq!(first, dir.path().join("song.mp3"));
        assert_eq!(second, dir.path().join("song (1).mp3"));
        assert_eq!(std::fs::read(first).unwrap(), b"1");
        assert_eq!(std::fs::read(second).unwrap(), b"2");
    }

    #[test]
    fn hostile_name_stays_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_ephemeral(&audio(b"x"), "../../escape.mp3", dir.path()).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(path.file_name().unwrap(), "escape.mp3");
    }

    #[test]
    fn blank_name_uses_kind_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_ephemeral(&audio(b"x"), " .. ", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("download.mp3"));
    }

    #[test]
    fn creates_missing_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = save_ephemeral(&audio(b"x"), "s.mp3", &nested).unwrap();
        assert_eq!(path, nested.join("s.mp3"));
    }

    #[test]
    fn overlong_name_saves_twice_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let name = format!("{}.mp4", "a".repeat(300));
        let first = save_ephemeral(&audio(b"1"), &name, dir.path()).unwrap();
        let second = save_ephemeral(&audio(b"2"), &name, dir.path()).unwrap();
        assert_ne!(first, second);
        for path in [&first, &second] {
            let file_name = path.file_name().unwrap().to_str().unwrap();
            assert!(file_name.ends_with(".mp4"));
            assert!(file_name.len() + crate::storage::TEMP_SUFFIX.len() <= 255);
        }
        assert!(second.file_name().unwrap().to_str().unwrap().ends_with(" (1).mp4"));
        assert_eq!(std::fs::read(second).unwrap(), b"2");
    }
}
