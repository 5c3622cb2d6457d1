//! Temp-file bridge for upload APIs that only accept file paths.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::Result;

/// Media bytes written to a uniquely named temp file.
///
/// The file lives as long as this value and is removed on drop, so two sends
/// never share a staging file.
#[derive(Debug)]
pub struct StagedMedia {
    file: NamedTempFile,
}

impl StagedMedia {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Write `data` to a fresh temp file under `dir`.
pub fn stage_media(dir: &Path, data: &[u8]) -> Result<StagedMedia> {
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::Builder::new()
        .prefix("bokkichat-")
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(StagedMedia { file })
}

pub fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_file_holds_bytes_and_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage_media(dir.path(), b"\x89PNG data").unwrap();
        let path = staged.path().to_path_buf();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG data");
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_stages_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = stage_media(dir.path(), b"a").unwrap();
        let b = stage_media(dir.path(), b"b").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
