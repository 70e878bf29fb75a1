use super::load_settings;
use super::sync::build_orchestrator;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use shelf_sync_config::{default_scheduler_config, PathManager, SchedulerConfig};
use shelf_sync_core::SyncOrchestrator;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Runs the orchestrator on a cron schedule, one run at a time
pub struct Scheduler {
    scheduler: JobScheduler,
    orchestrator: Arc<SyncOrchestrator>,
    running: Arc<Mutex<()>>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(orchestrator: SyncOrchestrator, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            orchestrator: Arc::new(orchestrator),
            running: Arc::new(Mutex::new(())),
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        if self.config.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            run_once(self.orchestrator.clone(), self.running.clone()).await;
        }

        let orchestrator = self.orchestrator.clone();
        let running = self.running.clone();
        let job = Job::new_async(self.config.schedule.as_str(), move |_id, _lock| {
            let orchestrator = orchestrator.clone();
            let running = running.clone();
            Box::pin(async move {
                run_once(orchestrator, running).await;
            })
        })
        .map_err(|e| eyre!("Invalid schedule '{}': {}", self.config.schedule, e))?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        info!(
            operation = "scheduler_started",
            schedule = %self.config.schedule,
            "Scheduler started"
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

/// One scheduled run. A tick that finds the previous run still going is skipped.
async fn run_once(orchestrator: Arc<SyncOrchestrator>, running: Arc<Mutex<()>>) {
    let Ok(_guard) = running.try_lock() else {
        warn!(operation = "scheduled_sync_skipped", "Previous sync still running, skipping this tick");
        return;
    };

    info!(operation = "scheduled_sync_start", "Starting scheduled sync");
    match orchestrator.sync().await {
        Ok(result) if result.has_source_failures() => {
            warn!(
                operation = "scheduled_sync_complete",
                items_synced = result.items_synced(),
                failed_sources = result.failed_sources.len(),
                duration_ms = result.duration.as_millis() as u64,
                "Scheduled sync finished with unreachable sources"
            );
        }
        Ok(result) => {
            info!(
                operation = "scheduled_sync_complete",
                items_synced = result.items_synced(),
                failed = result.failed,
                duration_ms = result.duration.as_millis() as u64,
                "Scheduled sync completed"
            );
        }
        Err(e) => {
            error!(operation = "scheduled_sync_error", error = %e, "Scheduled sync failed");
        }
    }
}

pub async fn run_daemon(schedule_override: Option<String>, no_startup_sync: bool, output: &Output) -> Result<()> {
    let (config, credentials) = load_settings()?;

    let mut scheduler_config = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    if let Some(schedule) = schedule_override {
        scheduler_config.schedule = schedule;
    }
    if no_startup_sync {
        scheduler_config.run_on_startup = false;
    }

    let orchestrator = build_orchestrator(&config, &credentials, None).await?;
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;

    output.info(format!(
        "Daemon started with schedule '{}'. Logs: {}",
        scheduler_config.schedule,
        path_manager.daemon_log_file().display()
    ));

    let mut scheduler = Scheduler::new(orchestrator, scheduler_config).await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for shutdown signal: {}", e))?;
    info!(operation = "scheduler_stop", "Shutdown signal received");
    scheduler.shutdown().await?;
    output.success("Daemon stopped");
    Ok(())
}
