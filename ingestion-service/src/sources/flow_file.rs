use std::{
    io,
    path::PathBuf,
};

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::Mutex,
};

use crate::pipeline::{Envelope, EnvelopeStream, ImportError, Source};

/// Reads a flow file from disk one line at a time.
///
/// The file is opened eagerly so that a missing or unreadable file is
/// reported before any import transaction starts.
pub struct FlowFileSource {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FlowFileSource {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ImportError> {
        let path = path.into();
        let open_err = |source| ImportError::Open {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).await.map_err(open_err)?;
        let meta = file.metadata().await.map_err(open_err)?;
        if meta.is_dir() {
            return Err(open_err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory")));
        }

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    /// Base name recorded on the flow file row.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[async_trait::async_trait]
impl Source<String> for FlowFileSource {
    async fn stream(&self) -> EnvelopeStream<String> {
        let file = self.file.lock().await.take();

        let s = async_stream::try_stream! {
            let file = file.ok_or(ImportError::SourceConsumed)?;
            let mut lines = BufReader::new(file).lines();
            let mut line_number = 0usize;

            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|source| ImportError::Read { line: line_number + 1, source })?
            {
                line_number += 1;
                yield Envelope { payload: line, line_number };
            }
        };

        Box::pin(s)
    }
}
