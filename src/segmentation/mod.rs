mod onnx;
mod preprocess;
pub mod types;

pub use onnx::{OnnxSegmenter, DEFAULT_INPUT_SIZE, DEFAULT_THRESHOLD};
pub use preprocess::Preprocessor;
pub use types::{Matte, SegmentationProvider};

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

/// Provider handed across the loader thread.
pub type BoxedProvider = Box<dyn SegmentationProvider + Send>;

/// Create the default ONNX-backed provider
pub fn create_default_provider(
    model_path: impl Into<PathBuf>,
    input_size: u32,
    threshold: f32,
) -> Result<BoxedProvider> {
    let model = OnnxSegmenter::new(model_path.into(), input_size, threshold)?;
    Ok(Box::new(model))
}

/// One-shot asynchronous model initialisation.
///
/// The load runs on its own thread; its result is delivered exactly once,
/// either polled with [`ModelLoader::try_ready`] or awaited with
/// [`ModelLoader::wait`].
pub struct ModelLoader {
    receiver: Receiver<Result<BoxedProvider>>,
    handle: Option<JoinHandle<()>>,
}

impl ModelLoader {
    pub fn spawn<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<BoxedProvider> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            // Receiver may already be gone if the session ended early.
            let _ = sender.send(load());
        });
        Self {
            receiver,
            handle: Some(handle),
        }
    }

    /// Load the default provider from `model_path` in the background.
    pub fn spawn_default(model_path: PathBuf, input_size: u32, threshold: f32) -> Self {
        Self::spawn(move || create_default_provider(model_path, input_size, threshold))
    }

    /// Non-blocking poll. `None` while the model is still loading.
    pub fn try_ready(&mut self) -> Option<Result<BoxedProvider>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(anyhow!("model loader exited without a result")))
            }
        }
    }

    /// Block until the model has loaded or failed.
    pub fn wait(mut self) -> Result<BoxedProvider> {
        let result = self
            .receiver
            .recv()
            .unwrap_or_else(|_| Err(anyhow!("model loader exited without a result")));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Model loader thread panicked");
            }
        }
    }
}
