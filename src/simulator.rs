//! The scripted interaction loop: bootstrap a browser, authenticate from the
//! cookie store, run a time-boxed watch session, persist refreshed cookies,
//! and sleep until the next cycle. Everything inside a cycle is contained;
//! only browser launch failure terminates the daemon.

use crate::browser::{BrowserSession, PageSurface};
use crate::config::Config;
use crate::cookies::CRITICAL_THRESHOLD;
use crate::errors::Result;
use crate::login;
use crate::random::RandomSource;
use crate::store;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// States of the outer loop. `Bootstrap` and `Authenticate` always follow
/// each other; the authentication gate decides between a session and a short
/// retry cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Bootstrap,
    Authenticate,
    ActiveSession,
    Cooldown(CooldownKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownKind {
    /// Fixed short delay after a failed authentication.
    Retry,
    /// Randomized long sleep between daily sessions.
    Daily,
}

/// The authentication gate: a session starts only when the cookie load met
/// the critical threshold AND the strict login check passed.
pub fn phase_after_auth(cookies_ok: bool, login_ok: bool) -> Phase {
    if cookies_ok && login_ok {
        Phase::ActiveSession
    } else {
        Phase::Cooldown(CooldownKind::Retry)
    }
}

/// Time-box for one active session. Checked at iteration boundaries only; an
/// in-progress pause is never interrupted.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
    budget: Duration,
}

impl SessionClock {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

enum CycleOutcome {
    AuthFailed,
    Completed { videos: u32 },
    Faulted,
}

pub struct Simulator {
    config: Config,
    random: Box<dyn RandomSource>,
}

impl Simulator {
    pub fn new(config: Config, random: Box<dyn RandomSource>) -> Self {
        Self { config, random }
    }

    /// Runs cycles forever. Returns only on a fatal bootstrap error (browser
    /// or driver unavailable), which the caller turns into a non-zero exit.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let outcome = self.run_cycle().await?;

            match outcome {
                CycleOutcome::AuthFailed => {
                    let cooldown = self.config.timings.retry_cooldown;
                    info!("retrying in {} min", cooldown.as_secs() / 60);
                    tokio::time::sleep(cooldown).await;
                }
                CycleOutcome::Completed { videos } => {
                    info!("session finished ({} videos)", videos);
                    self.daily_cooldown().await;
                }
                CycleOutcome::Faulted => {
                    self.daily_cooldown().await;
                }
            }
        }
    }

    async fn daily_cooldown(&mut self) {
        let pause = self.random.duration_in(self.config.timings.daily_cooldown);
        info!(
            "sleeping {:.1} h until the next session",
            pause.as_secs_f64() / 3600.0
        );
        tokio::time::sleep(pause).await;
    }

    /// One bootstrap-to-teardown cycle. The browser instance lives exactly as
    /// long as this call; every exit path drops it and with it the Chrome
    /// process.
    async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let cycle_id = Uuid::new_v4();
        info!(%cycle_id, "launching browser");
        let browser = BrowserSession::launch(self.config.browser.clone()).await?;

        let cookies_ok = self.load_and_inject(&browser).await;
        let login_ok = cookies_ok && login::strict_check(&browser, &self.config).await;

        match phase_after_auth(cookies_ok, login_ok) {
            Phase::ActiveSession => {}
            _ => {
                warn!("not logged in - check the stored cookies");
                return Ok(CycleOutcome::AuthFailed);
            }
        }

        match self.active_session(&browser).await {
            Ok(videos) => Ok(CycleOutcome::Completed { videos }),
            Err(e) => {
                warn!("session error: {}", e);
                Ok(CycleOutcome::Faulted)
            }
        }
    }

    /// Loads the persisted collection and injects it. True only when the
    /// injected cookies meet the critical threshold.
    async fn load_and_inject(&mut self, browser: &BrowserSession) -> bool {
        let cookies = match store::load(&self.config.cookie_store) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("{} - re-import required", e);
                return false;
            }
        };
        info!("{} cookies in the store", cookies.len());

        if let Err(e) = browser.navigate(&self.config.target.base_url).await {
            warn!("navigation failed: {}", e.truncated(80));
            return false;
        }
        tokio::time::sleep(self.config.timings.page_settle).await;

        let report = browser.inject_cookies(&cookies).await;
        let critical = report.critical_names(&self.config.target.critical_names);
        info!(
            "{}/{} cookies loaded, critical: {:?}",
            report.injected_count(),
            report.attempted,
            critical
        );

        if let Err(e) = browser.refresh().await {
            warn!("refresh failed: {}", e.truncated(80));
            return false;
        }
        tokio::time::sleep(self.config.timings.reload_settle).await;

        if report.injected_count() == 0 {
            return false;
        }
        if critical.len() < CRITICAL_THRESHOLD {
            warn!(
                "only {} critical cookies loaded (need {})",
                critical.len(),
                CRITICAL_THRESHOLD
            );
            return false;
        }
        true
    }

    /// The inner per-video loop, bounded by the session budget.
    async fn active_session(&mut self, browser: &BrowserSession) -> Result<u32> {
        if self.config.queries.is_empty() {
            return Err(crate::errors::SessionError::ConfigurationError(
                "no search queries configured".to_string(),
            ));
        }

        let clock = SessionClock::new(self.config.timings.session_budget);
        info!(
            "session started - {} min budget",
            self.config.timings.session_budget.as_secs() / 60
        );

        let mut videos = 0u32;
        while !clock.expired() {
            videos += 1;
            info!("video {} ({}s left)", videos, clock.remaining().as_secs());

            let query = {
                let index = self.random.pick_index(self.config.queries.len());
                self.config.queries[index].clone()
            };
            self.search(browser, &query).await;
            self.watch_one(browser).await?;

            let pause = self.random.duration_in(self.config.timings.pause);
            debug!("pausing {:.0}s", pause.as_secs_f64());
            tokio::time::sleep(pause).await;
        }

        let refreshed = browser.export_cookies().await?;
        store::save(&self.config.cookie_store, &refreshed)?;
        info!("cookies refreshed ({} records)", refreshed.len());

        Ok(videos)
    }

    /// Issues a search via the results URL and waits out the client-side
    /// rendering. Timeouts here are logged and tolerated; the watch step will
    /// see whatever actually rendered.
    async fn search(&mut self, page: &dyn PageSurface, query: &str) {
        let url = self.config.target.search_url(query);
        info!("searching '{}'", query);

        if let Err(e) = page.navigate(&url).await {
            warn!("search navigation failed: {}", e.truncated(80));
            return;
        }

        let timings = &self.config.timings;
        match page
            .wait_for_element(&self.config.selectors.results_grid, timings.results_wait)
            .await
        {
            Ok(()) => debug!("results page loaded"),
            Err(e) => warn!("results grid timeout: {}", e.truncated(80)),
        }
        match page
            .wait_for_element(&self.config.selectors.video_renderer, timings.results_wait)
            .await
        {
            Ok(()) => debug!("video tiles detected"),
            Err(e) => warn!("video tile timeout: {}", e.truncated(80)),
        }

        // The grid keeps hydrating well after the elements first appear.
        tokio::time::sleep(timings.render_grace).await;
    }

    /// Picks one of the first candidates, clicks it, and holds for a random
    /// watch duration. Zero candidates dumps the page markup for offline
    /// diagnosis and skips the iteration.
    async fn watch_one(&mut self, page: &dyn PageSurface) -> Result<()> {
        let selector = self.config.selectors.video_title.clone();
        let candidates = page.count_elements(&selector).await.unwrap_or(0);
        debug!("{} candidate videos", candidates);

        if candidates == 0 {
            warn!("no videos found - saving page markup for debugging");
            self.dump_page(page).await;
            return Ok(());
        }

        let index = self.random.pick_index(candidates.min(8));
        let title = page
            .attribute_of_nth(&selector, index, "title")
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "untitled video".to_string());
        info!("watching: {}", truncate_title(&title, 70));

        if let Err(e) = page.scroll_nth_into_view(&selector, index).await {
            warn!("scroll failed: {}", e.truncated(80));
        }
        tokio::time::sleep(self.config.timings.scroll_settle).await;

        if let Err(e) = page.click_nth(&selector, index).await {
            warn!("click failed: {}", e.truncated(80));
            return Ok(());
        }
        tokio::time::sleep(self.config.timings.click_settle).await;

        let watch = self.random.duration_in(self.config.timings.watch);
        tokio::time::sleep(watch).await;
        info!("{:.1}s watched", watch.as_secs_f64());

        Ok(())
    }

    async fn dump_page(&self, page: &dyn PageSurface) {
        match page.page_source().await {
            Ok(html) => {
                if let Some(parent) = self.config.debug_page_path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                match std::fs::write(&self.config.debug_page_path, html) {
                    Ok(()) => info!(
                        "page snapshot written to {}",
                        self.config.debug_page_path.display()
                    ),
                    Err(e) => warn!("snapshot write failed: {}", e),
                }
            }
            Err(e) => warn!("page source unavailable: {}", e.truncated(80)),
        }
    }
}

pub fn truncate_title(title: &str, max_chars: usize) -> String {
    title.chars().take(max_chars).collect()
}
