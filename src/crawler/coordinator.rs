//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier with the start URL and additional paths
//! - Applying the fetch filter and robots.txt before queueing
//! - Running fetches concurrently on a `JoinSet`
//! - Feeding every fetch outcome into the audit, one at a time
//! - Producing the final report once the frontier is exhausted
//!
//! Fetch tasks never touch audit state. They return their outcome through the
//! `JoinSet` and this loop, the only consumer, applies it.

use crate::audit::{AuditContext, FailureKind, FetchFailure};
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchOutcome};
use crate::crawler::parser::HtmlInspector;
use crate::crawler::scheduler::Scheduler;
use crate::output::Report;
use crate::robots::RobotsCache;
use crate::state::QueueItemState;
use crate::url::normalize_url;
use crate::AuditError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    seed: Url,
    scheduler: Scheduler,
    client: Client,
    robots: RobotsCache,
    audit: AuditContext,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `seed` - The URL the crawl starts from; its root URL scopes the policies
    /// * `config` - The audit configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(AuditError)` - Invalid seed URL or HTTP client construction failure
    pub fn new(seed: &str, config: Config) -> Result<Self, AuditError> {
        let seed = normalize_url(seed).map_err(|e| AuditError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        let client = build_http_client(&config.crawler)?;
        let scheduler = Scheduler::new(config.crawler.max_concurrency as usize);
        let audit = AuditContext::new(seed.clone(), &config, Box::new(HtmlInspector::new()));

        Ok(Self {
            config: Arc::new(config),
            seed,
            scheduler,
            client,
            robots: RobotsCache::new(),
            audit,
        })
    }

    pub fn root_url(&self) -> &str {
        self.audit.root_url()
    }

    /// Runs the crawl to completion and returns the report
    ///
    /// The loop dispatches queued URLs while fetch slots are free, then waits for
    /// the next fetch to finish and applies its outcome. It ends when no fetch is in
    /// flight and the frontier is empty.
    pub async fn run(mut self) -> Result<Report, AuditError> {
        tracing::info!(
            "Starting audit of {} (root URL {})",
            self.seed,
            self.audit.root_url()
        );

        self.seed_frontier().await;

        let interval = Duration::from_millis(self.config.crawler.interval_ms);
        let max_resource_size = self.config.crawler.max_resource_size;
        let start_time = Instant::now();
        let mut completed: usize = 0;
        let mut tasks: JoinSet<(Url, FetchOutcome)> = JoinSet::new();

        loop {
            while let Some(scheduled) = self.scheduler.next_url()? {
                let client = self.client.clone();
                tracing::debug!("Fetching {}", scheduled.url);

                tasks.spawn(async move {
                    let permit = scheduled.permit;
                    let outcome = fetch_url(&client, &scheduled.url, max_resource_size).await;
                    drop(permit);
                    (scheduled.url, outcome)
                });

                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            match joined {
                Ok((url, outcome)) => self.handle_outcome(url, outcome).await?,
                Err(e) => tracing::error!("Fetch task failed: {}", e),
            }

            completed += 1;
            if completed % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = completed as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} URLs fetched, {} queued, {} in flight, {:.2} URLs/sec",
                    completed,
                    self.scheduler.frontier_size(),
                    self.scheduler.in_flight(),
                    rate
                );
            }
        }

        let counts = self.scheduler.state_counts();
        tracing::info!(
            "Frontier exhausted after {} fetches in {:.1}s ({} ignored, {} disallowed, {} robots.txt origins)",
            completed,
            start_time.elapsed().as_secs_f64(),
            counts.get(&QueueItemState::Ignored).copied().unwrap_or(0),
            counts.get(&QueueItemState::Disallowed).copied().unwrap_or(0),
            self.robots.origin_count()
        );

        Ok(self.audit.finish())
    }

    /// Queues the seed URL and every additional path
    async fn seed_frontier(&mut self) {
        self.enqueue(self.seed.clone()).await;

        let additional_paths = self.config.crawler.additional_paths.clone();
        for path in additional_paths {
            match self.seed.join(&path).map(|mut url| {
                url.set_fragment(None);
                url
            }) {
                Ok(url) => self.enqueue(url).await,
                Err(e) => self.audit.queue_error(&path, &e.to_string()),
            }
        }
    }

    /// Queues a URL unless it was seen before, is filtered out or is disallowed
    async fn enqueue(&mut self, url: Url) {
        let key = url.as_str().to_string();
        if self.scheduler.is_seen(&key) {
            return;
        }

        if !self.audit.fetch_allowed(&key) {
            self.scheduler.mark_skipped(&key, QueueItemState::Ignored);
            return;
        }

        if self.config.crawler.respect_robots_txt {
            let allowed = self
                .robots
                .is_allowed(&self.client, &url, &self.config.crawler.user_agent)
                .await;
            if !allowed {
                self.audit.record_disallowed(&key);
                self.scheduler.mark_skipped(&key, QueueItemState::Disallowed);
                return;
            }
        }

        self.scheduler.enqueue(url);
    }

    /// Applies one fetch outcome to the scheduler and the audit
    async fn handle_outcome(&mut self, url: Url, outcome: FetchOutcome) -> Result<(), AuditError> {
        let key = url.as_str();

        match outcome {
            FetchOutcome::Fetched {
                status,
                content_type,
                body,
            } => {
                self.scheduler.transition(key, QueueItemState::Fetched)?;
                let resources = self.audit.page_fetched(&url, &content_type, status, &body);
                self.audit.resources_discovered(key, &resources);

                for resource in resources {
                    match normalize_url(&resource) {
                        Ok(resource_url) => self.enqueue(resource_url).await,
                        Err(e) => self.audit.queue_error(&resource, &e.to_string()),
                    }
                }
            }
            FetchOutcome::Redirect { status, location } => {
                self.scheduler.transition(key, QueueItemState::Redirected)?;
                match normalize_url(&location) {
                    Ok(target) => {
                        tracing::debug!("{} redirected ({}) to {}", key, status, target);
                        self.audit.redirect_followed(key, target.as_str());
                        self.enqueue(target).await;
                    }
                    Err(e) => self.audit.client_rejected(
                        key,
                        &format!("Cannot follow redirect to {}: {}", location, e),
                    ),
                }
            }
            FetchOutcome::HttpStatus {
                status,
                content_type,
            } => {
                self.scheduler.transition(key, QueueItemState::Failed)?;
                self.audit
                    .fetch_failed(key, &FetchFailure::status(status), content_type.as_deref());
            }
            FetchOutcome::Failed(failure) => {
                let state = if failure.kind == FailureKind::Timeout {
                    QueueItemState::TimedOut
                } else {
                    QueueItemState::Failed
                };
                self.scheduler.transition(key, state)?;
                self.audit.fetch_failed(key, &failure, None);
            }
            FetchOutcome::Rejected { message } => {
                self.scheduler.transition(key, QueueItemState::Failed)?;
                self.audit.client_rejected(key, &message);
            }
        }

        Ok(())
    }
}

/// Runs a complete audit starting from `seed`
///
/// # Example
///
/// ```no_run
/// use spider_audit::config::Config;
/// use spider_audit::crawler::run_audit;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_audit("https://example.com/", Config::default()).await?;
/// println!("{} errors", report.errors.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_audit(seed: &str, config: Config) -> Result<Report, AuditError> {
    let coordinator = Coordinator::new(seed, config)?;
    coordinator.run().await
}
