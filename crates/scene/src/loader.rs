//! Asynchronous image loading
//!
//! File reads and decodes run on the tokio runtime; completions come back on
//! an unbounded channel that the editor drains from its own loop. Each
//! request carries the [`SurfaceHandle`] it was made for, so a completion
//! whose surface has been disposed in the meantime can be dropped.

use std::path::{Path, PathBuf};

use drawing::{ImageSource, ImportError, decode, mime_for_path, read_image_file, validate};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::registry::SurfaceHandle;

/// Where a pending import should land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTicket {
    pub handle: SurfaceHandle,
    /// File name or caller-supplied label, for messages
    pub source: String,
}

/// Finished import, successful or not
#[derive(Debug)]
pub struct ImportCompletion {
    pub ticket: ImportTicket,
    pub result: Result<ImageSource, ImportError>,
}

/// Runs image imports off the editor loop
#[derive(Debug)]
pub struct ImageLoader {
    runtime: Option<Handle>,
    tx: mpsc::UnboundedSender<ImportCompletion>,
    rx: mpsc::UnboundedReceiver<ImportCompletion>,
    pending: usize,
    max_bytes: u64,
}

impl ImageLoader {
    /// Create a loader bound to the current tokio runtime, if there is one
    ///
    /// Outside a runtime, loads complete synchronously but are still
    /// delivered through the channel.
    pub fn new(max_bytes: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            debug!("No tokio runtime, image imports will load synchronously");
        }
        Self {
            runtime,
            tx,
            rx,
            pending: 0,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Number of requests whose completion has not been received yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Read, validate and decode an image file
    pub fn load_file(&mut self, ticket: ImportTicket, path: PathBuf) {
        self.pending += 1;
        let tx = self.tx.clone();
        let max_bytes = self.max_bytes;
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(async move {
                    let result = read_file(&path, max_bytes).await;
                    deliver(&tx, ImportCompletion { ticket, result });
                });
            }
            None => {
                let result = read_image_file(&path, max_bytes);
                deliver(&tx, ImportCompletion { ticket, result });
            }
        }
    }

    /// Decode bytes that already passed validation
    pub fn decode_bytes(&mut self, ticket: ImportTicket, bytes: Vec<u8>) {
        self.pending += 1;
        let tx = self.tx.clone();
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(async move {
                    let result = decode_blocking(bytes).await;
                    deliver(&tx, ImportCompletion { ticket, result });
                });
            }
            None => deliver(&tx, ImportCompletion {
                ticket,
                result: decode(bytes),
            }),
        }
    }

    /// Take a finished import without waiting
    pub fn try_recv(&mut self) -> Option<ImportCompletion> {
        let completion = self.rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(completion)
    }

    /// Wait for the next finished import; None when nothing is in flight
    pub async fn recv(&mut self) -> Option<ImportCompletion> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        self.pending = self.pending.saturating_sub(1);
        Some(completion)
    }
}

fn deliver(tx: &mpsc::UnboundedSender<ImportCompletion>, completion: ImportCompletion) {
    if tx.send(completion).is_err() {
        warn!("Image loader dropped before import completed");
    }
}

async fn read_file(path: &Path, max_bytes: u64) -> Result<ImageSource, ImportError> {
    let size = tokio::fs::metadata(path).await?.len();
    validate(&mime_for_path(path), size, max_bytes)?;
    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_blocking(bytes).await
}

async fn decode_blocking(bytes: Vec<u8>) -> Result<ImageSource, ImportError> {
    tokio::task::spawn_blocking(move || decode(bytes))
        .await
        .map_err(|e| ImportError::Runtime(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawing::encode_png;
    use foldcard_ipc::Face;
    use image::RgbaImage;

    fn ticket() -> ImportTicket {
        ImportTicket {
            handle: SurfaceHandle {
                face: Face::FrontLeft,
                generation: 0,
            },
            source: "test.png".to_string(),
        }
    }

    fn png_bytes() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(8, 6, image::Rgba([10, 20, 30, 255]))).unwrap()
    }

    #[test]
    fn test_synchronous_without_runtime() {
        let mut loader = ImageLoader::new(1024 * 1024);
        loader.decode_bytes(ticket(), png_bytes());
        assert_eq!(loader.pending(), 1);

        let completion = loader.try_recv().unwrap();
        assert_eq!(completion.ticket, ticket());
        assert_eq!(completion.result.unwrap().width(), 8);
        assert_eq!(loader.pending(), 0);
        assert!(loader.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_load_file_on_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let mut loader = ImageLoader::new(1024 * 1024);
        loader.load_file(ticket(), path);
        let completion = loader.recv().await.unwrap();
        assert_eq!(completion.result.unwrap().height(), 6);
        assert!(loader.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_file_is_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let mut loader = ImageLoader::new(1024);
        loader.load_file(ticket(), path);
        let completion = loader.recv().await.unwrap();
        assert!(matches!(
            completion.result,
            Err(ImportError::TooLarge { size: 2048, max: 1024 })
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut loader = ImageLoader::new(1024);
        loader.load_file(ticket(), PathBuf::from("/nonexistent/photo.png"));
        let completion = loader.recv().await.unwrap();
        assert!(matches!(completion.result, Err(ImportError::Read(_))));
    }

    #[tokio::test]
    async fn test_undecodable_bytes() {
        let mut loader = ImageLoader::new(1024);
        loader.decode_bytes(ticket(), b"not really a png".to_vec());
        let completion = loader.recv().await.unwrap();
        assert!(matches!(completion.result, Err(ImportError::Decode(_))));
    }
}
