//! C9: the scheduler — ticks every `MAIN_LOOP_INTERVAL`, selects due
//! tasks, runs them in staggered bounded-concurrency waves, and performs
//! periodic maintenance (spec §4.1, §5).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::config::constants::{CLEANUP_EVERY_N_TICKS, IDLE_LOG_EVERY_N_TICKS, WAITING_LOG_EVERY_N_TICKS};
use crate::config::Config;
use crate::health::HealthState;
use crate::processor::TaskProcessor;
use crate::store::BackingStore;

pub struct Scheduler {
    store: Arc<dyn BackingStore>,
    processor: Arc<TaskProcessor>,
    running: Mutex<HashSet<String>>,
    health: Arc<Mutex<HealthState>>,
    tick_interval: Duration,
    max_concurrent_tasks: usize,
    stagger_delay: Duration,
    shutdown_grace: Duration,
}

impl Scheduler {
    pub fn new(
        config: &Config,
        store: Arc<dyn BackingStore>,
        processor: Arc<TaskProcessor>,
        health: Arc<Mutex<HealthState>>,
    ) -> Self {
        Self {
            store,
            processor,
            running: Mutex::new(HashSet::new()),
            health,
            tick_interval: config.main_loop_interval,
            max_concurrent_tasks: config.max_concurrent_tasks,
            stagger_delay: config.stagger_delay,
            shutdown_grace: config.shutdown_grace,
        }
    }

    /// Runs ticks forever (or exactly once, for `--once`) until a shutdown
    /// signal arrives.
    pub async fn run(self: Arc<Self>, once: bool) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick_count: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tick_count += 1;
                    self.run_tick(tick_count).await;
                    if once {
                        break;
                    }
                }
                _ = shutdown_signal() => {
                    log::info!("shutdown signal received, draining");
                    break;
                }
            }
        }

        {
            let mut health = self.health.lock().await;
            health.shutting_down = true;
        }
        tokio::time::sleep(self.shutdown_grace).await;
        log::info!("scheduler shut down");
    }

    async fn run_tick(&self, tick_count: u64) {
        if tick_count % CLEANUP_EVERY_N_TICKS == 0 {
            match self.store.cleanup_expired(Utc::now()).await {
                Ok((cache_deleted, rejections_deleted)) => {
                    log::debug!("cleanup: removed {cache_deleted} cache rows, {rejections_deleted} rejection rows");
                }
                Err(e) => log::warn!("cleanup sweep failed: {e}"),
            }
        }

        let tasks = match self.store.load_active_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                log::warn!("failed to load active tasks: {e}");
                self.set_poll_status(format!("error: {e}")).await;
                return;
            }
        };

        if tasks.is_empty() {
            if tick_count % IDLE_LOG_EVERY_N_TICKS == 0 {
                log::info!("no active tasks");
            }
            self.set_poll_status("success".to_string()).await;
            return;
        }

        let now = Utc::now();
        let due: Vec<_> = {
            let running = self.running.lock().await;
            tasks
                .into_iter()
                .filter(|t| t.is_due(now) && !running.contains(&t.id))
                .collect()
        };

        if due.is_empty() {
            if tick_count % WAITING_LOG_EVERY_N_TICKS == 0 {
                log::info!("no due tasks this tick");
            }
            self.set_poll_status("success".to_string()).await;
            return;
        }

        for wave in due.chunks(self.max_concurrent_tasks) {
            let mut handles = Vec::with_capacity(wave.len());
            for (k, task) in wave.iter().enumerate() {
                {
                    let mut running = self.running.lock().await;
                    running.insert(task.id.clone());
                }
                let processor = Arc::clone(&self.processor);
                let task = task.clone();
                let stagger = self.stagger_delay * k as u32;
                handles.push(tokio::spawn(async move {
                    tokio::time::sleep(stagger).await;
                    let result = processor.process(&task).await;
                    (task.id, result)
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok((task_id, Ok(()))) => {
                        let mut running = self.running.lock().await;
                        running.remove(&task_id);
                    }
                    Ok((task_id, Err(e))) => {
                        log::warn!("task {task_id} failed: {e}");
                        let mut running = self.running.lock().await;
                        running.remove(&task_id);
                    }
                    Err(join_err) => {
                        log::error!("task join error: {join_err}");
                    }
                }
            }
        }

        self.set_poll_status("success".to_string()).await;
    }

    async fn set_poll_status(&self, status: String) {
        let (calls_today, calls_remaining) = self.processor.api_usage().await;
        let mut health = self.health.lock().await;
        health.last_poll = Some(Utc::now());
        health.last_poll_status = status;
        health.api_calls_today = calls_today;
        health.api_calls_remaining = calls_remaining;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
