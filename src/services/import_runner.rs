use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::{error, info, warn};
use tracing_unwrap::ResultExt;

use crate::models::Record;
use crate::services::config_loader::ArenaConfig;
use crate::services::image_import;
use crate::services::import_error::ImportError;
use crate::services::tabular_import;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Spreadsheet,
    Image,
}

impl ImportKind {
    pub fn for_path(path: &Path) -> Self {
        if image_import::is_image_path(path) {
            ImportKind::Image
        } else {
            ImportKind::Spreadsheet
        }
    }
}

#[derive(Debug)]
pub enum ImportEvent {
    Finished { seq: u64, records: Vec<Record> },
    Failed { seq: u64, error: ImportError },
}

impl ImportEvent {
    fn seq(&self) -> u64 {
        match self {
            ImportEvent::Finished { seq, .. } | ImportEvent::Failed { seq, .. } => *seq,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ImportOutcome {
    Imported(Vec<Record>),
    Failed(ImportError),
}

/// Runs imports on worker threads. Every request gets a sequence number and
/// only the answer to the newest request is handed back; older answers that
/// arrive late are dropped.
pub struct ImportRunner {
    tx: Sender<ImportEvent>,
    rx: Receiver<ImportEvent>,
    next_seq: u64,
    pending: Option<(u64, ImportKind)>,
}

impl Default for ImportRunner {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            next_seq: 0,
            pending: None,
        }
    }
}

impl ImportRunner {
    pub fn pending_kind(&self) -> Option<ImportKind> {
        self.pending.map(|(_, kind)| kind)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start(&mut self, path: PathBuf, config: &ArenaConfig) -> u64 {
        let kind = ImportKind::for_path(&path);
        info!("Starting {:?} import from {}", kind, path.display());
        match kind {
            ImportKind::Spreadsheet => {
                let import_config = config.import.clone();
                self.spawn(kind, move || {
                    let grid = tabular_import::read_grid(&path)?;
                    tabular_import::normalize_grid(&grid, &import_config)
                })
            }
            ImportKind::Image => {
                let vision_config = config.vision.clone();
                self.spawn(kind, move || {
                    let runtime = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .map_err(|err| {
                            ImportError::ExtractionFailed(format!(
                                "failed to initialize import runtime: {err}"
                            ))
                        })?;
                    runtime.block_on(image_import::import_image(&path, &vision_config))
                })
            }
        }
    }

    fn spawn<F>(&mut self, kind: ImportKind, job: F) -> u64
    where
        F: FnOnce() -> Result<Vec<Record>, ImportError> + Send + 'static,
    {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending = Some((seq, kind));
        let tx = self.tx.clone();

        std::thread::Builder::new()
            .name(format!("arena-import-{seq}"))
            .spawn(move || {
                let event = match job() {
                    Ok(records) => ImportEvent::Finished { seq, records },
                    Err(error) => ImportEvent::Failed { seq, error },
                };
                let _ = tx.send(event);
            })
            .expect_or_log("Failed to spawn import thread");

        seq
    }

    /// Drains finished work. Returns the outcome of the newest request once
    /// it lands.
    pub fn poll(&mut self) -> Option<ImportOutcome> {
        loop {
            let event = match self.rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            };

            let Some((pending_seq, _)) = self.pending else {
                warn!("Dropping import result #{} with nothing pending", event.seq());
                continue;
            };
            if event.seq() != pending_seq {
                warn!(
                    "Dropping stale import result #{} (waiting for #{})",
                    event.seq(),
                    pending_seq
                );
                continue;
            }

            self.pending = None;
            return Some(match event {
                ImportEvent::Finished { seq, records } => {
                    info!("Import #{} produced {} records", seq, records.len());
                    ImportOutcome::Imported(records)
                }
                ImportEvent::Failed { seq, error } => {
                    error!("Import #{} failed: {}", seq, error);
                    ImportOutcome::Failed(error)
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(runner: &mut ImportRunner) -> Option<ImportOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(outcome) = runner.poll() {
                return Some(outcome);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    fn one_record(name: &str) -> Vec<Record> {
        vec![Record::new(name.to_string(), name.to_string(), [1.0], 500.0)]
    }

    #[test]
    fn result_is_delivered_once() {
        let mut runner = ImportRunner::default();
        runner.spawn(ImportKind::Spreadsheet, || Ok(one_record("a")));
        assert!(runner.is_busy());

        assert_eq!(wait_for(&mut runner), Some(ImportOutcome::Imported(one_record("a"))));
        assert!(!runner.is_busy());
        assert_eq!(runner.poll(), None);
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut runner = ImportRunner::default();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        runner.spawn(ImportKind::Image, move || {
            let _ = release_rx.recv();
            let _ = done_tx.send(());
            Ok(one_record("old"))
        });
        runner.spawn(ImportKind::Spreadsheet, || Err(ImportError::NoValidRows));
        assert_eq!(runner.pending_kind(), Some(ImportKind::Spreadsheet));

        assert_eq!(
            wait_for(&mut runner),
            Some(ImportOutcome::Failed(ImportError::NoValidRows))
        );

        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(runner.poll(), None);
    }

    #[test]
    fn csv_import_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shift.csv");
        std::fs::write(&path, "Contestant,Target,Hour 1\nAlice,600,55\n").unwrap();

        let mut runner = ImportRunner::default();
        runner.start(path, &ArenaConfig::default());
        match wait_for(&mut runner) {
            Some(ImportOutcome::Imported(records)) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].target, 600.0);
                assert_eq!(records[0].total(), 55.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn kind_follows_extension() {
        assert_eq!(ImportKind::for_path(Path::new("a.jpg")), ImportKind::Image);
        assert_eq!(ImportKind::for_path(Path::new("a.xlsx")), ImportKind::Spreadsheet);
        assert_eq!(ImportKind::for_path(Path::new("a.csv")), ImportKind::Spreadsheet);
    }
}
