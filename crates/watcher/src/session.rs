//! One active watch session
//!
//! A session owns the debounce machine, a timer task that sleeps until the
//! armed deadline, and a worker task that drains a single-slot trigger
//! queue. The single slot means requests arriving while a backup runs
//! coalesce into at most one follow-up, and only one backup ever executes
//! per session.

use crate::debounce::{Debouncer, FireOutcome};
use crate::event::ChangeEvent;
use crate::filter::EventFilter;
use crate::notifier::ChangeNotifier;
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use vigil_core::{BackupOptions, BackupRunner};

/// Quiet period after the last change before a backup runs.
pub const DEFAULT_WAIT_AFTER_CHANGES: Duration = Duration::from_secs(5);

/// Floor between completed backup runs.
pub const DEFAULT_MIN_BACKUP_INTERVAL: Duration = Duration::from_secs(10);

/// Settings for one watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory tree under observation
    pub source: PathBuf,
    /// Logical backup name
    pub name: String,
    /// Watch subdirectories too
    pub recursive: bool,
    /// Quiet period required after the last change
    pub wait_after_changes: Duration,
    /// Minimum interval between completed runs
    pub min_backup_interval: Duration,
    /// Directory name patterns that never trigger
    pub exclude_dirs: Vec<String>,
    /// File name patterns that never trigger
    pub exclude_files: Vec<String>,
    /// Options forwarded to the backup runner
    pub options: BackupOptions,
}

impl WatchConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        name: impl Into<String>,
        options: BackupOptions,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            recursive: true,
            wait_after_changes: DEFAULT_WAIT_AFTER_CHANGES,
            min_backup_interval: DEFAULT_MIN_BACKUP_INTERVAL,
            exclude_dirs: Vec::new(),
            exclude_files: Vec::new(),
            options,
        }
    }
}

/// One directory being watched and backed up.
pub struct WatchSession {
    config: WatchConfig,
    filter: EventFilter,
    machine: Mutex<Debouncer>,
    runner: Arc<dyn BackupRunner>,
    notifier: Arc<dyn ChangeNotifier>,
    /// Deadline the timer task should sleep until
    deadline_tx: watch::Sender<Option<Instant>>,
    /// Cooperative stop flag
    stop_tx: watch::Sender<bool>,
    /// Single-slot trigger queue
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: Mutex<Option<mpsc::Receiver<()>>>,
    started: AtomicBool,
}

impl WatchSession {
    pub fn new(
        config: WatchConfig,
        notifier: Arc<dyn ChangeNotifier>,
        runner: Arc<dyn BackupRunner>,
    ) -> Result<Self> {
        let filter = EventFilter::new(
            &config.source,
            &config.exclude_dirs,
            &config.exclude_files,
        )?;
        let machine = Debouncer::new(config.wait_after_changes, config.min_backup_interval);
        let (deadline_tx, _) = watch::channel(None);
        let (stop_tx, _) = watch::channel(false);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        Ok(Self {
            config,
            filter,
            machine: Mutex::new(machine),
            runner,
            notifier,
            deadline_tx,
            stop_tx,
            trigger_tx,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            started: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn source(&self) -> &Path {
        &self.config.source
    }

    /// Run the session until it is stopped or the notifier dies.
    ///
    /// Starts the notifier (fatal if unavailable), performs one
    /// unconditional baseline backup, then consumes events until the end of
    /// the session. Blocks the calling task for the session's lifetime.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            bail!("Watch session for '{}' already started", self.config.name);
        }

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let watch_handle = self
            .notifier
            .start_watch(&self.config.source, self.config.recursive, event_tx)
            .await
            .with_context(|| {
                format!("Failed to start watching {}", self.config.source.display())
            })?;

        info!(
            "Watching {} (backup '{}')",
            self.config.source.display(),
            self.config.name
        );

        // Baseline run so a backup exists even if nothing ever changes.
        // A failure here is logged like any other attempt; the session
        // keeps watching.
        self.machine.lock().begin_unconditional();
        self.run_backup_once().await;

        let trigger_rx = self
            .trigger_rx
            .lock()
            .take()
            .context("Trigger queue already taken")?;
        let worker = tokio::spawn(Self::run_worker(
            self.clone(),
            trigger_rx,
            self.stop_tx.subscribe(),
        ));
        let timer = tokio::spawn(Self::run_timer(
            self.clone(),
            self.deadline_tx.subscribe(),
            self.stop_tx.subscribe(),
        ));

        let mut stop_rx = self.stop_tx.subscribe();
        let result = loop {
            if *stop_rx.borrow() {
                break Ok(());
            }
            tokio::select! {
                _ = stop_rx.changed() => {}
                event = event_rx.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        break Err(anyhow!(
                            "Change notifier for {} terminated",
                            self.config.source.display()
                        ));
                    }
                },
            }
        };

        // Wind down: disarm the timer, release the backend, let an
        // in-flight run finish.
        self.stop();
        drop(watch_handle);
        let _ = timer.await;
        let _ = worker.await;

        debug!("Watch session for '{}' ended", self.config.name);
        result
    }

    /// Stop the session. Idempotent and safe to call concurrently with an
    /// in-flight run; that run finishes but nothing new fires afterwards.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let mut machine = self.machine.lock();
        machine.stop();
        let _ = self.deadline_tx.send(machine.armed_deadline());
    }

    fn on_event(&self, event: ChangeEvent) {
        if self.filter.should_skip(&event) {
            return;
        }

        debug!(
            "Change in '{}': {:?} {}",
            self.config.name,
            event.kind,
            event.path.display()
        );

        let mut machine = self.machine.lock();
        machine.record_change(Instant::now());
        let _ = self.deadline_tx.send(machine.armed_deadline());
    }

    fn on_deadline_fired(&self, fired: Instant) {
        let outcome = {
            let mut machine = self.machine.lock();
            let outcome = machine.debounce_fired(fired, Instant::now());
            let _ = self.deadline_tx.send(machine.armed_deadline());
            outcome
        };

        match outcome {
            FireOutcome::Trigger => {
                // A full slot already holds a pending request
                let _ = self.trigger_tx.try_send(());
            }
            FireOutcome::Throttled => {
                debug!(
                    "Trigger for '{}' throttled; waiting for a new change",
                    self.config.name
                );
            }
            FireOutcome::Stale => {}
        }
    }

    /// Runs one backup attempt. The machine must already be in its
    /// executing phase.
    async fn run_backup_once(&self) {
        let started = Instant::now();
        let result = self
            .runner
            .run_backup(&self.config.source, &self.config.name, &self.config.options)
            .await;

        let success = result.is_ok();
        match &result {
            Ok(()) => info!(
                "Backup '{}' completed in {:.1}s",
                self.config.name,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => warn!("Backup '{}' failed: {:#}", self.config.name, e),
        }

        let mut machine = self.machine.lock();
        machine.finish_trigger(Instant::now(), success);
        let _ = self.deadline_tx.send(machine.armed_deadline());
    }

    /// Sleeps until the armed deadline and reports firings. Re-reads the
    /// deadline whenever it changes so a slid window restarts the sleep.
    async fn run_timer(
        session: Arc<Self>,
        mut deadline_rx: watch::Receiver<Option<Instant>>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        loop {
            if *stop_rx.borrow() {
                break;
            }

            let armed = *deadline_rx.borrow_and_update();
            match armed {
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                            session.on_deadline_fired(deadline);
                        }
                        changed = deadline_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = stop_rx.changed() => {}
                    }
                }
                None => {
                    tokio::select! {
                        changed = deadline_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = stop_rx.changed() => {}
                    }
                }
            }
        }
    }

    /// Drains the trigger queue one request at a time.
    async fn run_worker(
        session: Arc<Self>,
        mut trigger_rx: mpsc::Receiver<()>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        loop {
            if *stop_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = stop_rx.changed() => {}
                request = trigger_rx.recv() => match request {
                    Some(()) => {
                        // A stop racing with a queued request wins: only a
                        // run already started may continue past stop.
                        if *stop_rx.borrow() {
                            break;
                        }
                        let should_run = {
                            let mut machine = session.machine.lock();
                            let run = machine.begin_trigger();
                            if run {
                                let _ = session.deadline_tx.send(machine.armed_deadline());
                            }
                            run
                        };
                        if should_run {
                            session.run_backup_once().await;
                        }
                    }
                    None => break,
                },
            }
        }
    }
}
