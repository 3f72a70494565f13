//! Crawl orchestrator - plans the run, then downloads entry by entry

use crate::crawler::config::{CrawlerConfig, OutputLayout};
use crate::crawler::error::CrawlError;
use crate::crawler::fetch::Downloader;
use crate::crawler::partition::monthly_windows;
use crate::crawler::plan::{build_plan, DownloadPlan, PlanRequest};
use crate::crawler::scan::scan_existing_files;
use crate::crawler::session::PortalSession;
use crate::crawler::types::{CrawlReport, CrawlState, CrawlStats, DateRange, DownloadOutcome};
use tracing::{debug, error, info, warn};

/// One invocation's parameters
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub range: DateRange,
    pub plan: PlanRequest,
}

pub struct Crawler {
    config: CrawlerConfig,
    state: CrawlState,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Crawler {
            config,
            state: CrawlState::Initializing,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Compute the plan without touching the network
    pub fn plan(&self, request: &CrawlRequest) -> DownloadPlan {
        let windows = monthly_windows(&request.range);
        let existing = scan_existing_files(
            &self.config.output.dirs(),
            self.config.portal.min_file_bytes,
        );
        build_plan(&request.plan, &windows, &self.config.output, &existing)
    }

    /// Run the crawl.
    ///
    /// Only a failed session bootstrap is an error. A quota halt returns a
    /// report in the `QuotaHalted` state with partial stats.
    pub async fn run(&mut self, request: &CrawlRequest) -> Result<CrawlReport, CrawlError> {
        self.state = CrawlState::Initializing;

        let plan = self.plan(request);
        self.log_plan(request, &plan);

        let mut report = CrawlReport {
            state: CrawlState::Initializing,
            stats: CrawlStats::default(),
            already_done: plan.already_done,
            remaining: 0,
            quota_message: None,
        };

        if plan.is_empty() {
            info!("All files are already downloaded");
            self.state = CrawlState::Completed;
            report.state = self.state;
            return Ok(report);
        }

        let session = match PortalSession::bootstrap(&self.config.portal).await {
            Ok(s) => s,
            Err(e) => {
                error!("Session initialization failed: {}", e);
                return Err(e);
            }
        };

        self.transition(CrawlState::Running);
        let portal = self.config.portal.clone();
        let downloader =
            Downloader::new(&session, &portal).with_request_cap(self.config.daily_request_cap);
        let total = plan.entries.len();
        let mut current_group = None;

        for (idx, entry) in plan.entries.iter().enumerate() {
            let count = idx + 1;

            let group = (entry.property_type, entry.kind);
            if current_group != Some(group) {
                info!("▶ {} - {}", entry.property_type, entry.kind);
                current_group = Some(group);
            }
            info!("  [{}/{}] {} ({})", count, total, entry.file_name(), entry.window);

            match downloader.download(entry).await {
                Ok(outcome) => report.stats.record(&outcome),
                // Portal quota, or the configured request cap
                Err(CrawlError::QuotaExceeded { message }) => {
                    report.quota_message = Some(message);
                    report.remaining = total - idx;
                    self.transition(CrawlState::QuotaHalted);
                    break;
                }
                Err(e) => {
                    // Anything else is unexpected from the downloader; count and move on
                    warn!("  {} failed: {}", entry.file_name(), e);
                    report.stats.record(&DownloadOutcome::Failed(e.to_string()));
                }
            }

            if count < total && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        if self.state == CrawlState::Running {
            self.transition(CrawlState::Completed);
        }
        debug!("Download requests issued: {}", downloader.requests_issued());
        report.state = self.state;
        log_summary(&report);

        Ok(report)
    }

    fn transition(&mut self, next: CrawlState) {
        debug!("Crawler state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn log_plan(&self, request: &CrawlRequest, plan: &DownloadPlan) {
        let targets: Vec<&str> = request
            .plan
            .selected_types()
            .iter()
            .map(|t| t.display_name())
            .collect();

        info!("=== Transaction Crawler ===");
        info!("Period: {}", request.range);
        info!("Monthly windows: {}", plan.months);
        info!("Targets: {}", targets.join(", "));
        info!("Include rentals: {}", request.plan.include_rentals);
        if plan.already_done > 0 {
            info!(
                "New downloads: {} (skipping {} existing)",
                plan.entries.len(),
                plan.already_done
            );
        } else {
            info!("Total downloads: {}", plan.entries.len());
        }
        match &self.config.output {
            OutputLayout::Single(dir) => info!("Output: {:?}", dir),
            OutputLayout::Split { sale, rental } => {
                info!("Output: {:?} (sale), {:?} (rental)", sale, rental)
            }
        }
    }
}

fn log_summary(report: &CrawlReport) {
    if report.quota_halted() {
        warn!(
            "Daily download limit reached: {}",
            report.quota_message.as_deref().unwrap_or("")
        );
        warn!(
            "{} entries remain; run again later, downloaded files are skipped automatically",
            report.remaining
        );
    }
    info!("=== Crawl finished: {} ===", report.stats);
}
