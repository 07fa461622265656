//! Transient file-list artifact handed to the retrieval command.
//!
//! One path per line, no escaping. The backing temp file is deleted when
//! the artifact is dropped, which covers success, command failure, deadline
//! and task cancellation alike.

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

#[derive(Debug)]
pub struct FileListArtifact {
    file: NamedTempFile,
    lines: usize,
}

impl FileListArtifact {
    /// Write `files` for reader `worker` into a new temp file.
    ///
    /// `dir` selects where the file is created (system temp dir otherwise).
    /// Paths containing a newline cannot be represented and are rejected.
    pub fn write(worker: usize, files: &[String], dir: Option<&Path>) -> DispatchResult<Self> {
        let io_err = |source| DispatchError::ArtifactIo { worker, source };

        if let Some(bad) = files.iter().find(|f| f.contains('\n')) {
            return Err(io_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("file path contains a newline: {bad:?}"),
            )));
        }

        let prefix = format!("tapestage-reader{worker}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".list");
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(io_err)?;

        {
            let mut out = BufWriter::new(file.as_file_mut());
            for f in files {
                writeln!(out, "{f}").map_err(io_err)?;
            }
            out.flush().map_err(io_err)?;
        }
        file.as_file().sync_all().map_err(io_err)?;

        debug!(worker, path = %file.path().display(), lines = files.len(), "file list written");
        Ok(Self {
            file,
            lines: files.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn lines(&self) -> usize {
        self.lines
    }
}
