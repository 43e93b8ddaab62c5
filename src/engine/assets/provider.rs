// Background character loading

use super::{load_character, AssetError, CharacterModel, ModelDescriptor};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// What a provider reports when polled
#[derive(Debug)]
pub enum LoadStatus {
    /// Nothing requested, or the last result was already collected
    Idle,
    Loading { fraction: f32 },
    Ready(Box<CharacterModel>),
    Failed(AssetError),
}

/// Source of character models. Loads run asynchronously; results are
/// collected by polling once per frame.
pub trait AssetProvider {
    /// Start loading; supersedes any load still in flight
    fn begin_load(&mut self, descriptor: &ModelDescriptor);

    /// Report progress. `Ready` and `Failed` are returned exactly once per load.
    fn poll(&mut self) -> LoadStatus;
}

struct InFlight {
    descriptor: ModelDescriptor,
    receiver: Receiver<Result<CharacterModel, AssetError>>,
    /// Fraction loaded, stored as `f32` bits
    progress: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
}

/// Loads manifests and sprite sheets from disk on a worker thread
#[derive(Default)]
pub struct FileAssetProvider {
    in_flight: Option<InFlight>,
}

impl FileAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn cancel_in_flight(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            debug!("Superseding load of {}", previous.descriptor);
            previous.cancelled.store(true, Ordering::Relaxed);
        }
    }
}

impl AssetProvider for FileAssetProvider {
    fn begin_load(&mut self, descriptor: &ModelDescriptor) {
        self.cancel_in_flight();
        info!("Loading character {}", descriptor);

        let (sender, receiver) = mpsc::channel();
        let progress = Arc::new(AtomicU32::new(0.0f32.to_bits()));
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_descriptor = descriptor.clone();
        let worker_progress = Arc::clone(&progress);
        let worker_cancelled = Arc::clone(&cancelled);
        let spawned = thread::Builder::new().name("asset-loader".into()).spawn(move || {
            let result = if worker_cancelled.load(Ordering::Relaxed) {
                Err(AssetError::Cancelled)
            } else {
                load_character(&worker_descriptor, &|fraction| {
                    worker_progress.store(fraction.to_bits(), Ordering::Relaxed)
                })
            };
            // The receiver is gone when this load was superseded
            let _ = sender.send(result);
        });

        match spawned {
            Ok(_) => {
                self.in_flight = Some(InFlight {
                    descriptor: descriptor.clone(),
                    receiver,
                    progress,
                    cancelled,
                });
            }
            Err(e) => {
                // No worker: report the failure on the next poll
                warn!("Failed to spawn asset loader: {}", e);
                let (sender, receiver) = mpsc::channel();
                let _ = sender.send(Err(AssetError::Io(e)));
                self.in_flight = Some(InFlight {
                    descriptor: descriptor.clone(),
                    receiver,
                    progress,
                    cancelled,
                });
            }
        }
    }

    fn poll(&mut self) -> LoadStatus {
        let Some(in_flight) = &self.in_flight else {
            return LoadStatus::Idle;
        };

        let status = match in_flight.receiver.try_recv() {
            Ok(Ok(model)) => {
                info!("Loaded character '{}' from {}", model.name, in_flight.descriptor);
                LoadStatus::Ready(Box::new(model))
            }
            Ok(Err(e)) => LoadStatus::Failed(e),
            Err(TryRecvError::Empty) => {
                let fraction = f32::from_bits(in_flight.progress.load(Ordering::Relaxed));
                return LoadStatus::Loading { fraction };
            }
            Err(TryRecvError::Disconnected) => LoadStatus::Failed(AssetError::Cancelled),
        };

        self.in_flight = None;
        status
    }
}

impl Drop for FileAssetProvider {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::loader::tests::write_character;
    use std::time::{Duration, Instant};

    fn wait(provider: &mut FileAssetProvider) -> LoadStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match provider.poll() {
                LoadStatus::Loading { fraction } => {
                    assert!((0.0..=1.0).contains(&fraction));
                    assert!(Instant::now() < deadline, "load timed out");
                    thread::sleep(Duration::from_millis(5));
                }
                status => return status,
            }
        }
    }

    #[test]
    fn test_idle_until_requested() {
        let mut provider = FileAssetProvider::new();
        assert!(matches!(provider.poll(), LoadStatus::Idle));
        assert!(!provider.is_loading());
    }

    #[test]
    fn test_load_ready_once() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write_character(dir.path(), &[("Relax", 0, 4)]);

        let mut provider = FileAssetProvider::new();
        provider.begin_load(&descriptor);
        assert!(provider.is_loading());

        match wait(&mut provider) {
            LoadStatus::Ready(model) => assert_eq!(model.descriptor, descriptor),
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(matches!(provider.poll(), LoadStatus::Idle));
    }

    #[test]
    fn test_load_failure_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FileAssetProvider::new();
        provider.begin_load(&ModelDescriptor::new(dir.path().join("missing.json")));

        assert!(matches!(wait(&mut provider), LoadStatus::Failed(AssetError::NotFound(_))));
    }

    #[test]
    fn test_newer_load_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let first = tempfile::tempdir().unwrap();
        let stale = write_character(first.path(), &[("Relax", 0, 4)]);
        let fresh = write_character(dir.path(), &[("Relax", 0, 4), ("Move", 1, 2)]);

        let mut provider = FileAssetProvider::new();
        provider.begin_load(&stale);
        provider.begin_load(&fresh);

        match wait(&mut provider) {
            LoadStatus::Ready(model) => {
                assert_eq!(model.descriptor, fresh);
                assert_eq!(model.animations.len(), 2);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(matches!(provider.poll(), LoadStatus::Idle));
    }
}
