//! Disk I/O for saved media.
//!
//! Payloads are written to a `.part` temp file next to the destination,
//! synced, then atomically renamed. A writer dropped before commit removes
//! its temp file, so failed saves leave nothing behind.

mod writer;

pub use writer::StorageWriter;

use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `clip.mp4` → `clip.mp4.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// First free path for `filename` in `dir`: `name.ext`, then `name (1).ext`, `name (2).ext`, ...
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match filename.rfind('.') {
        Some(i) if i > 0 => (&filename[..i], &filename[i..]),
        _ => (filename, ""),
    };
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("clip.mp4"));
        assert_eq!(p.to_string_lossy(), "clip.mp4.part");
        let p2 = temp_path(Path::new("/tmp/song.mp3"));
        assert_eq!(p2.to_string_lossy(), "/tmp/song.mp3.part");
    }

    #[test]
    fn unique_path_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_path(dir.path(), "a.mp4"), dir.path().join("a.mp4"));
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        assert_eq!(unique_path(dir.path(), "a.mp4"), dir.path().join("a (1).mp4"));
        std::fs::write(dir.path().join("a (1).mp4"), b"x").unwrap();
        assert_eq!(unique_path(dir.path(), "a.mp4"), dir.path().join("a (2).mp4"));
    }

    #[test]
    fn unique_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("noext"), b"x").unwrap();
        assert_eq!(unique_path(dir.path(), "noext"), dir.path().join("noext (1)"));
    }

    #[test]
    fn write_commit_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.mp3");
        let tp = temp_path(&final_path);

        let mut writer = StorageWriter::create(&final_path).unwrap();
        assert!(tp.exists());
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        let written = writer.commit().unwrap();

        assert_eq!(written, 11);
        assert!(!tp.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn dropped_writer_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("out.mp4");
        {
            let mut writer = StorageWriter::create(&final_path).unwrap();
            writer.write_all(b"partial").unwrap();
        }
        assert!(!temp_path(&final_path).exists());
        assert!(!final_path.exists());
    }
}
