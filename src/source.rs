use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::TVError;
use crate::record::{VehicleCode, parse_records};

pub const DEFAULT_DATA_PATH: &str = "assets/data.json";

/// Where vehicle records come from. The whole set is delivered at once.
pub trait RecordSource: Send + Sync {
    fn fetch_vehicles(&self) -> Result<Vec<VehicleCode>, TVError>;

    fn describe(&self) -> String;
}

/// A static JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Expands `~` and environment variables before building the source.
    pub fn from_user_path(raw: &str) -> Result<Self, TVError> {
        let expanded = shellexpand::full(raw)
            .map_err(|e| TVError::LoadingFailed(format!("cannot expand {raw}: {e}")))?;
        Ok(Self::new(expanded.into_owned()))
    }

    #[cfg(test)]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl RecordSource for JsonFileSource {
    fn fetch_vehicles(&self) -> Result<Vec<VehicleCode>, TVError> {
        let metadata = fs::metadata(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TVError::FileNotFound,
            ErrorKind::PermissionDenied => TVError::PermissionDenied,
            _ => TVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(TVError::LoadingFailed("Not a file!".into()));
        }
        debug!("Reading {} ({} bytes)", self.path.display(), metadata.len());

        let raw = fs::read_to_string(&self.path)?;
        let records = parse_records(&raw)?;
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    Loaded {
        records: Vec<VehicleCode>,
        millis: u128,
    },
    Failed(TVError),
}

/// Handle on one in-flight fetch running on a background thread.
///
/// Dropping the handle releases the subscription: the result of a fetch
/// that is still running is discarded when it arrives.
pub struct Loader {
    receiver: Option<Receiver<LoadEvent>>,
}

impl Loader {
    pub fn spawn(source: Arc<dyn RecordSource>) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let start_time = Instant::now();
            let event = match source.fetch_vehicles() {
                Ok(records) => {
                    let millis = start_time.elapsed().as_millis();
                    info!("Loading {} records took {millis}ms", records.len());
                    LoadEvent::Loaded { records, millis }
                }
                Err(e) => {
                    warn!("Loading {} failed: {e}", source.describe());
                    LoadEvent::Failed(e)
                }
            };
            if sender.send(event).is_err() {
                debug!("Loader result dropped, view already disposed");
            }
        });
        Self {
            receiver: Some(receiver),
        }
    }

    /// Non blocking check for the fetch result. Yields at most one event.
    pub fn poll(&mut self) -> Option<LoadEvent> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(event) => {
                self.receiver = None;
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(LoadEvent::Failed(TVError::LoaderDisconnected))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn release(&mut self) {
        self.receiver = None;
    }
}
