//! File-backed source

use super::{RecordIter, Source};
use crate::decode::{decoder_for, DecoderFormat, RecordDecoder};
use crate::error::{Error, Result, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Source that re-reads a file on every scan
///
/// Line-delimited formats are streamed one line at a time; document formats
/// are read whole.
pub struct FileSource {
    path: PathBuf,
    decoder: Box<dyn RecordDecoder>,
}

impl FileSource {
    /// Create a file source for a format
    pub fn new(path: impl AsRef<Path>, format: DecoderFormat) -> Self {
        Self::with_decoder(path, decoder_for(format))
    }

    /// Create a file source with a custom decoder
    pub fn with_decoder(path: impl AsRef<Path>, decoder: Box<dyn RecordDecoder>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            decoder,
        }
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_exists(&self) -> Result<()> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(Error::FileNotFound {
                path: self.path.display().to_string(),
            })
        }
    }

    fn scan_lines(&self) -> Result<RecordIter<'_>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open '{}'", self.path.display()))?;
        let reader = BufReader::new(file);
        let decoder = self.decoder.as_ref();
        let path = self.path.display().to_string();

        let records = reader
            .lines()
            .enumerate()
            .flat_map(move |(idx, line)| match line {
                Err(e) => vec![Err(Error::Io(e))],
                Ok(line) if line.trim().is_empty() => vec![],
                Ok(line) => match decoder.decode(&line) {
                    Ok(records) => records.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(Error::decode(format!("{path}:{}: {e}", idx + 1)))],
                },
            });

        Ok(Box::new(records))
    }

    fn scan_document(&self) -> Result<RecordIter<'_>> {
        let body = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read '{}'", self.path.display()))?;
        let records = self.decoder.decode(&body)?;
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

impl Source for FileSource {
    fn scan(&self) -> Result<RecordIter<'_>> {
        self.check_exists()?;
        tracing::debug!("Scanning {}", self.path.display());

        if self.decoder.is_line_delimited() {
            self.scan_lines()
        } else {
            self.scan_document()
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
