use crate::ledger::Ledger;
use crate::operation::OperationSpec;
use crate::pipeline::{evaluate, Pipeline};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Called from the worker thread with the generation of a finished batch.
pub type Notifier = Arc<dyn Fn(u64) + Send + Sync>;

/// What happened when the controller collected preview results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Nothing requested, or the last request was cancelled.
    Idle,
    /// A batch is still being computed.
    Pending,
    /// The latest batch was written into the ledger.
    Applied { generation: u64, changed: usize },
    /// A batch arrived but no longer matches the ledger and was dropped.
    Stale { generation: u64 },
}

struct Batch {
    generation: u64,
    revision: u64,
    names: Vec<String>,
}

struct Job {
    generation: u64,
    revision: u64,
    files: Vec<(usize, String)>,
    steps: Arc<[Option<OperationSpec>]>,
    cancel: Arc<AtomicBool>,
    sender: Sender<Batch>,
    notifier: Option<Notifier>,
}

struct InFlight {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Computes preview names for a whole ledger in the background.
///
/// Only one batch runs at a time. Each [`request`](Self::request) cancels and joins the
/// previous batch before starting a new one, and bumps a generation counter so that
/// anything computed for an older request is thrown away. Results are only ever written
/// into the ledger on the caller's thread, from [`poll`](Self::poll) or
/// [`wait`](Self::wait).
pub struct PreviewEngine {
    generation: u64,
    in_flight: Option<InFlight>,
    sender: Sender<Batch>,
    receiver: Receiver<Batch>,
    notifier: Option<Notifier>,
}

impl Default for PreviewEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewEngine {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            generation: 0,
            in_flight: None,
            sender,
            receiver,
            notifier: None,
        }
    }

    /// Install a callback fired once per completed batch, e.g. to wake an event loop.
    #[must_use]
    pub fn with_notifier<F>(mut self, notifier: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| !in_flight.handle.is_finished())
    }

    /// Start computing previews for every file in `ledger`.
    ///
    /// Returns the new generation, or `None` if the ledger is empty and nothing started.
    pub fn request(&mut self, ledger: &Ledger, pipeline: &Pipeline) -> Option<u64> {
        self.cancel();
        self.generation += 1;

        if ledger.is_empty() {
            return None;
        }

        let generation = self.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        let job = self.job(ledger, pipeline, &cancel);

        let spawned = thread::Builder::new()
            .name(format!("preview-{generation}"))
            .spawn(move || run_batch(job));

        match spawned {
            Ok(handle) => self.in_flight = Some(InFlight { cancel, handle }),
            Err(e) => {
                eprintln!("Warning: could not start preview worker ({e}), computing inline");
                run_batch(self.job(ledger, pipeline, &cancel));
            },
        }

        Some(generation)
    }

    fn job(&self, ledger: &Ledger, pipeline: &Pipeline, cancel: &Arc<AtomicBool>) -> Job {
        Job {
            generation: self.generation,
            revision: ledger.revision(),
            files: ledger.snapshot_names(),
            steps: pipeline.snapshot(),
            cancel: Arc::clone(cancel),
            sender: self.sender.clone(),
            notifier: self.notifier.clone(),
        }
    }

    /// Stop the running batch, if any, and wait for its thread to exit.
    ///
    /// Results that were already queued are dropped.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.cancel.store(true, Ordering::SeqCst);
        }
        self.join_in_flight();
        while self.receiver.try_recv().is_ok() {}
    }

    /// Collect a finished batch without blocking.
    pub fn poll(&mut self, ledger: &mut Ledger) -> PreviewOutcome {
        match self.receiver.try_recv() {
            Ok(batch) => {
                // A worker exits right after sending, so this join is short.
                self.join_in_flight();
                self.reconcile(batch, ledger)
            },
            Err(_) if self.is_running() => PreviewOutcome::Pending,
            Err(_) => self.finish(ledger),
        }
    }

    /// Block until the current batch finishes, then collect it.
    pub fn wait(&mut self, ledger: &mut Ledger) -> PreviewOutcome {
        self.finish(ledger)
    }

    fn join_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            if in_flight.handle.join().is_err() {
                eprintln!("Warning: preview worker panicked");
            }
        }
    }

    fn finish(&mut self, ledger: &mut Ledger) -> PreviewOutcome {
        self.join_in_flight();

        let mut outcome = PreviewOutcome::Idle;
        while let Ok(batch) = self.receiver.try_recv() {
            outcome = self.reconcile(batch, ledger);
        }
        outcome
    }

    fn reconcile(&self, batch: Batch, ledger: &mut Ledger) -> PreviewOutcome {
        let generation = batch.generation;
        let stale = generation != self.generation
            || batch.revision != ledger.revision()
            || batch.names.len() != ledger.len();

        if stale {
            if std::env::var("REGEX_RENAME_DEBUG_PREVIEW").is_ok() {
                eprintln!(
                    "PREVIEW: discarding batch {generation} ({} names, ledger has {}, latest {})",
                    batch.names.len(),
                    ledger.len(),
                    self.generation
                );
            }
            return PreviewOutcome::Stale { generation };
        }

        ledger.apply_preview(batch.names);
        PreviewOutcome::Applied {
            generation,
            changed: ledger.changed_count(),
        }
    }
}

impl Drop for PreviewEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_batch(job: Job) {
    let Job {
        generation,
        revision,
        files,
        steps,
        cancel,
        sender,
        notifier,
    } = job;

    let names = files
        .par_iter()
        .map(|(index, name)| {
            if cancel.load(Ordering::Relaxed) {
                None
            } else {
                Some(evaluate(name, *index, &steps))
            }
        })
        .collect::<Option<Vec<_>>>();

    // A cancelled batch reports nothing.
    let Some(names) = names else {
        return;
    };
    if cancel.load(Ordering::Relaxed) {
        return;
    }

    let batch = Batch {
        generation,
        revision,
        names,
    };
    if sender.send(batch).is_ok() {
        if let Some(notify) = notifier {
            (*notify)(generation);
        }
    }
}
