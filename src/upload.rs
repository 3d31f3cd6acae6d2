use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::debug;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Extension used when the uploaded filename has none.
pub const FALLBACK_SUFFIX: &str = ".mp4";

const TEMP_PREFIX: &str = "clipscribe-";

/// Suffix for the temp file: the upload's own extension, or [`FALLBACK_SUFFIX`].
///
/// The extension runs from the last dot of the final path component to the
/// end, so `"trailing."` keeps `"."`. Leading dots belong to the name, which
/// leaves `".hidden"` without an extension.
pub fn suffix_for(filename: &str) -> String {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    let stem = name.trim_start_matches('.');
    match stem.rfind('.') {
        Some(dot) => stem[dot..].to_string(),
        None => FALLBACK_SUFFIX.to_string(),
    }
}

/// An upload spooled to disk for the lifetime of one request.
///
/// The file lives in the system temp dir and is removed when this value is
/// dropped. Removal errors are ignored. Writes go through `tokio::fs` so
/// they run on the blocking pool rather than the calling async worker.
pub struct StagedUpload {
    file: NamedTempFile,
    writer: File,
    original_name: String,
    written: u64,
    max_bytes: u64,
}

impl StagedUpload {
    pub fn create(original_name: &str, max_bytes: u64) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix_for(original_name))
            .tempfile()
            .context("Failed to create temporary file")?;

        let writer = file
            .as_file()
            .try_clone()
            .map(File::from_std)
            .context("Failed to open temporary file for writing")?;

        debug!("Staging upload {original_name} at {}", file.path().display());

        Ok(Self {
            file,
            writer,
            original_name: original_name.to_string(),
            written: 0,
            max_bytes,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.written += chunk.len() as u64;
        if self.written > self.max_bytes {
            bail!("Upload exceeds the {} byte limit", self.max_bytes);
        }
        self.writer
            .write_all(chunk)
            .await
            .context("Failed to write upload to temporary file")
    }

    /// Waits for every pending write to reach the file.
    pub async fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .context("Failed to flush temporary file")
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_extension() {
        assert_eq!(suffix_for("talk.wav"), ".wav");
        assert_eq!(suffix_for("clip.MOV"), ".MOV");
        assert_eq!(suffix_for("archive.tar.gz"), ".gz");
        assert_eq!(suffix_for("..dotted.srt"), ".srt");
    }

    #[test]
    fn falls_back_when_extension_missing() {
        assert_eq!(suffix_for("noext"), ".mp4");
        assert_eq!(suffix_for(".hidden"), ".mp4");
        assert_eq!(suffix_for("..."), ".mp4");
        assert_eq!(suffix_for("dir.d/noext"), ".mp4");
    }

    #[test]
    fn trailing_dot_is_kept_as_the_suffix() {
        assert_eq!(suffix_for("trailing."), ".");
        assert_eq!(suffix_for("take.2."), ".");
    }

    #[actix_web::test]
    async fn staged_file_uses_suffix_and_is_removed_on_drop() {
        let path = {
            let mut upload = StagedUpload::create("voice.ogg", 1024).unwrap();
            upload.write_chunk(b"OggS").await.unwrap();
            upload.finish().await.unwrap();

            let path = upload.to_path_buf();
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), "ogg");
            assert_eq!(std::fs::read(&path).unwrap(), b"OggS");
            assert_eq!(upload.bytes_written(), 4);
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn each_upload_gets_a_unique_path() {
        let a = StagedUpload::create("same.mp3", 16).unwrap();
        let b = StagedUpload::create("same.mp3", 16).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[actix_web::test]
    async fn chunks_are_appended_in_order() {
        let mut upload = StagedUpload::create("parts.mp3", 64).unwrap();
        for chunk in [&b"ID3"[..], b"-", b"frames"] {
            upload.write_chunk(chunk).await.unwrap();
        }
        upload.finish().await.unwrap();
        assert_eq!(std::fs::read(upload.path()).unwrap(), b"ID3-frames");
        assert_eq!(upload.bytes_written(), 10);
    }

    #[actix_web::test]
    async fn rejects_writes_past_limit() {
        let mut upload = StagedUpload::create("big.wav", 4).unwrap();
        upload.write_chunk(b"1234").await.unwrap();
        let err = upload.write_chunk(b"5").await.unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }
}
