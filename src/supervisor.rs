//! The Supervisor (§4.1): the main scheduling loop over idle workers, the
//! per-request pipeline (explore -> prompt -> generate -> test ->
//! record/diagnose), and the three staggered auxiliary loops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::backend::Backend;
use crate::browser::BrowserDriver;
use crate::config::Config;
use crate::diagnosis::diagnose_and_submit;
use crate::domain::{CityId, DevelopmentRequest, WorkerId, WorkerState};
use crate::explore::explore;
use crate::loops::{ContactLoop, DirectoryLoop, DiscoveryLoop, PeriodicLoop};
use crate::prompt::build_prompt;
use crate::scratchpad::Scratchpad;
use crate::testing::TestOutcome;

/// Owns worker state and drives the claim -> pipeline -> idle cycle plus
/// the three auxiliary loops, mirroring the teacher's `DaemonManager`
/// pattern of one long-lived owner holding every handle the process needs
/// to shut down cleanly.
pub struct Supervisor {
    backend: Arc<dyn Backend>,
    driver: Arc<dyn BrowserDriver>,
    config: Config,
    city_id: Option<CityId>,
    workers: Mutex<HashMap<WorkerId, WorkerState>>,
    worker_tasks: Mutex<JoinSet<()>>,
    notify: Notify,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
    /// `driver` is already connected (a [`crate::browser::ThirtyfourDriver`]
    /// in production, a mock in tests) -- connecting to the headless-browser
    /// service is async and fallible, so it happens in `main` before the
    /// Supervisor is constructed, not inside this constructor.
    pub fn new(backend: Arc<dyn Backend>, driver: Arc<dyn BrowserDriver>, config: Config, city_id: Option<CityId>) -> Self {
        let worker_count = config.scheduler.workers as usize;
        let workers = (0..worker_count)
            .map(|i| {
                let id = WorkerId::for_index(i);
                (id.clone(), WorkerState::idle(id))
            })
            .collect();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            backend,
            driver,
            config,
            city_id,
            workers: Mutex::new(workers),
            worker_tasks: Mutex::new(JoinSet::new()),
            notify: Notify::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Run the supervisor until `shutdown()` is called: the scheduling
    /// loop plus the three periodic loops, all on one shutdown signal.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let scratchpad = Scratchpad::from_config(&self.config.scratchpad);
        scratchpad.ensure_dir().context("Failed to create scratchpad directory")?;

        let directory_loop = DirectoryLoop::new(
            self.backend.clone(),
            self.driver.clone(),
            Duration::from_millis(self.config.browser.navigation_timeout_ms),
        );
        let contact_loop = ContactLoop::new(
            self.backend.clone(),
            self.driver.clone(),
            Duration::from_millis(self.config.browser.navigation_timeout_ms),
        );
        let discovery_loop = DiscoveryLoop::new(
            self.backend.clone(),
            self.driver.clone(),
            Duration::from_millis(self.config.browser.navigation_timeout_ms),
            discovery_session_id(),
        );

        let mut handles = JoinSet::new();
        handles.spawn({
            let rx = self.shutdown_rx.clone();
            async move { directory_loop.run(rx).await }
        });
        handles.spawn({
            let rx = self.shutdown_rx.clone();
            async move { contact_loop.run(rx).await }
        });
        handles.spawn({
            let rx = self.shutdown_rx.clone();
            async move { discovery_loop.run(rx).await }
        });

        handles.spawn({
            let supervisor = self.clone();
            async move { supervisor.scheduling_loop().await }
        });

        // These four tasks only return once `shutdown()` has fired.
        while handles.join_next().await.is_some() {}

        self.await_in_flight_workers().await;
        Ok(())
    }

    /// Give in-flight worker pipelines a bounded grace period to finish on
    /// their own (§6's "exit within ~1 s" shutdown behavior); anything
    /// still running past the grace period is aborted, which drops its
    /// agent subprocess and kills it via `kill_on_drop` rather than
    /// orphaning it.
    async fn await_in_flight_workers(&self) {
        let mut tasks = self.worker_tasks.lock().await;
        if tasks.is_empty() {
            return;
        }

        let drain = async {
            while tasks.join_next().await.is_some() {}
        };
        if tokio::time::timeout(Duration::from_millis(900), drain).await.is_err() {
            warn!("Supervisor::await_in_flight_workers: grace period elapsed, aborting in-flight workers");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
    }

    /// Poll every `poll_interval_ms` for an idle worker and, if one is
    /// free, claim a request for it and spawn its pipeline. Never runs
    /// more than `workers` pipelines concurrently (§5's scheduling model).
    async fn scheduling_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown_rx.clone();
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.scheduler.poll_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.clone().fill_idle_workers().await;
                }
                _ = self.notify.notified() => {
                    self.clone().fill_idle_workers().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("Supervisor::scheduling_loop: shutting down");
                        return;
                    }
                }
            }
        }
    }

    async fn fill_idle_workers(self: Arc<Self>) {
        let idle_ids: Vec<WorkerId> = {
            let workers = self.workers.lock().await;
            workers.values().filter(|w| !w.busy).map(|w| w.id.clone()).collect()
        };

        for worker_id in idle_ids {
            let request = match self.backend.get_next_and_claim(&worker_id, self.city_id.as_ref()).await {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Supervisor::fill_idle_workers: claim failed");
                    continue;
                }
            };

            {
                let mut workers = self.workers.lock().await;
                if let Some(worker) = workers.get_mut(&worker_id) {
                    worker.mark_busy(request.id.clone());
                }
            }

            let supervisor = self.clone();
            let mut tasks = self.worker_tasks.lock().await;
            tasks.spawn(async move {
                supervisor.run_pipeline(worker_id.clone(), request).await;
                let mut workers = supervisor.workers.lock().await;
                if let Some(worker) = workers.get_mut(&worker_id) {
                    worker.mark_idle();
                }
                drop(workers);
                supervisor.notify.notify_one();
            });
        }
    }

    /// The per-request pipeline (§4.1-§4.6): explore, build the prompt, run
    /// the code-generation agent, extract code, test it, and either record
    /// success or diagnose-and-resubmit on failure. Every fallible step is
    /// caught at this boundary -- a `Result::Err` anywhere inside logs and
    /// falls through to the worker returning to idle, mirroring the
    /// teacher's description of a `tokio::spawn` wrapper that always runs
    /// its cleanup regardless of the inner result.
    async fn run_pipeline(&self, worker_id: WorkerId, mut request: DevelopmentRequest) {
        info!(request_id = %request.id, worker = %worker_id, "Supervisor::run_pipeline: claimed request");

        if let Err(e) = self.run_pipeline_inner(&mut request).await {
            error!(request_id = %request.id, error = %e, "Supervisor::run_pipeline: failed");
        }
    }

    async fn run_pipeline_inner(&self, request: &mut DevelopmentRequest) -> Result<()> {
        let scratchpad = Scratchpad::from_config(&self.config.scratchpad);

        if let Some(outcome) = explore(request, self.driver.clone(), Duration::from_millis(self.config.browser.navigation_timeout_ms)).await? {
            self.backend.save_exploration(&request.id, &outcome.exploration).await?;
            request.site_exploration = Some(outcome.exploration);

            if request.site_exploration.as_ref().and_then(|e| e.is_directory).unwrap_or(false) {
                let links_found = outcome.directory_links.len();
                let mut requests_created = 0usize;
                for link in &outcome.directory_links {
                    match self
                        .backend
                        .request_scraper_development(
                            &link.name,
                            &link.url,
                            request.city_id.as_ref(),
                            "discovered via directory fan-out",
                            "directory-exploration",
                        )
                        .await
                    {
                        Ok(_) => requests_created += 1,
                        Err(e) => warn!(url = %link.url, error = %e, "Supervisor::run_pipeline_inner: failed to create fanned-out request"),
                    }
                }

                self.backend
                    .mark_directory_processed(&request.id, "exploration found a directory page", links_found, requests_created)
                    .await?;
                info!(
                    request_id = %request.id,
                    links_found,
                    requests_created,
                    "Supervisor::run_pipeline_inner: directory, not a single source"
                );
                return Ok(());
            }
        }

        let output_file = scratchpad.scraper_path(&request.id);
        let prompt = build_prompt(request, request.site_exploration.as_ref(), &output_file, None);

        let prompt_path = scratchpad.prompt_path(&request.id);
        std::fs::write(&prompt_path, &prompt).with_context(|| format!("Failed to write prompt file {}", prompt_path.display()))?;

        let mut transcript = crate::agent::TranscriptWriter::open(scratchpad.dir(), &request.id)?;
        let run_result = crate::agent::run_agent(&self.config.agent, &prompt, &output_file, &mut transcript).await?;

        if run_result.timed_out {
            warn!(request_id = %request.id, "Supervisor::run_pipeline_inner: agent timed out");
            diagnose_and_submit(
                self.backend.as_ref(),
                &request.id,
                &request.source_url,
                request.generated_scraper_code.as_deref().unwrap_or_default(),
                Some("code-generation agent timed out"),
            )
            .await?;
            return Ok(());
        }

        let Some(code) = crate::agent::extract_code(&output_file, &run_result.stdout) else {
            warn!(request_id = %request.id, "Supervisor::run_pipeline_inner: no code extracted");
            diagnose_and_submit(
                self.backend.as_ref(),
                &request.id,
                &request.source_url,
                "",
                Some("code-generation agent produced no extractable code"),
            )
            .await?;
            return Ok(());
        };

        self.backend.update_scraper_code(&request.id, &code).await?;
        request.bump_scraper_code(code.clone());

        let strategy = crate::testing::TestStrategy::classify(&code);
        let scratch_dir = scratchpad.request_scratch_dir(&request.id);
        let outcome = strategy
            .run(&self.config.testing, &code, &request.source_url, &scratch_dir, Some(self.driver.clone()))
            .await?;

        match outcome {
            TestOutcome::Success { sessions_found, sample_data } => {
                info!(request_id = %request.id, sessions_found, "Supervisor::run_pipeline_inner: test succeeded");
                self.backend
                    .record_test_results(&request.id, sessions_found, Some(sample_data), None)
                    .await?;
            }
            TestOutcome::ZeroSessionsValid { note } => {
                info!(request_id = %request.id, %note, "Supervisor::run_pipeline_inner: zero sessions accepted as valid");
                self.backend.record_test_results(&request.id, 0, None, None).await?;
            }
            TestOutcome::Failure { error } => {
                warn!(request_id = %request.id, ?error, "Supervisor::run_pipeline_inner: test failed, diagnosing");
                self.backend
                    .record_test_results(&request.id, 0, None, error.clone())
                    .await?;
                diagnose_and_submit(self.backend.as_ref(), &request.id, &request.source_url, &code, error.as_deref()).await?;
            }
        }

        Ok(())
    }

    /// Signal every loop (scheduling + the three auxiliary loops) to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn shutdown_signal(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }
}

/// One id per daemon process lifetime, used to mark which process claimed
/// a discovery task (§4.9) so a crashed worker's claim can be told apart
/// from a live one by an operator inspecting the backend directly.
fn discovery_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
