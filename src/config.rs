use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Desktop user agent presented to the site regardless of the real browser build.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) \
Gecko/20100101 Firefox/120.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub target: TargetConfig,
    pub selectors: Selectors,
    pub timings: Timings,
    /// Fixed pool of search queries the simulator draws from.
    pub queries: Vec<String>,
    pub cookie_store: PathBuf,
    pub debug_page_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub viewport: Viewport,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub base_url: String,
    pub history_url: String,
    pub results_url: String,
    /// Canonical cookie domain forced onto stray authentication cookies.
    pub cookie_domain: String,
    /// Domain suffixes considered "ours"; anything else is foreign.
    pub domain_family: Vec<String>,
    /// Name substrings marking a cookie as authentication-related.
    pub auth_tokens: Vec<String>,
    /// Name substrings marking a cookie as critical to a live session.
    pub critical_names: Vec<String>,
    /// URL fragments that mean we were bounced to a login page.
    pub login_redirect_markers: Vec<String>,
}

impl TargetConfig {
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.results_url, urlencoding::encode(query))
    }
}

/// All selectors the login heuristics and the watch loop depend on. The site
/// owns this markup; treat these as versioned data, not a stable contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selectors {
    pub avatar: Vec<String>,
    pub channel_link: String,
    pub history_markers: Vec<String>,
    pub results_grid: String,
    pub video_renderer: String,
    pub video_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    /// Settle after first navigation to the target origin.
    pub page_settle: Duration,
    /// Settle after refreshing with freshly injected cookies.
    pub reload_settle: Duration,
    /// Per-probe wait in the quick login check.
    pub probe_wait: Duration,
    /// Polling interval inside bounded waits.
    pub probe_poll: Duration,
    /// Avatar / history-marker waits in the strict login check.
    pub strict_wait: Duration,
    /// Settle after opening the history page.
    pub history_settle: Duration,
    /// Extended wait for the search results grid.
    pub results_wait: Duration,
    /// Flat extra delay for client-side rendering of result tiles.
    pub render_grace: Duration,
    /// Settle between scroll-into-view and click.
    pub scroll_settle: Duration,
    /// Settle after clicking a video.
    pub click_settle: Duration,
    /// Randomized watch time per video.
    pub watch: DurationRange,
    /// Randomized pause between videos.
    pub pause: DurationRange,
    /// Total active-session budget.
    pub session_budget: Duration,
    /// Retry delay after a failed authentication.
    pub retry_cooldown: Duration,
    /// Randomized sleep between daily sessions.
    pub daily_cooldown: DurationRange,
}

/// Inclusive bounds for a randomized delay, in whole seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DurationRange {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            target: TargetConfig::default(),
            selectors: Selectors::default(),
            timings: Timings::default(),
            queries: vec![
                "python programming".to_string(),
                "machine learning tutorial".to_string(),
                "web development 2025".to_string(),
                "data science projects".to_string(),
                "artificial intelligence news".to_string(),
            ],
            cookie_store: PathBuf::from("cookies/youtube_cookies.json"),
            debug_page_path: PathBuf::from("cookies/debug_no_videos.html"),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: headless_from_env(),
            user_agent: Some(USER_AGENT.to_string()),
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            args: vec![],
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            history_url: "https://www.youtube.com/feed/history".to_string(),
            results_url: "https://www.youtube.com/results?search_query=".to_string(),
            cookie_domain: ".youtube.com".to_string(),
            domain_family: vec!["youtube.com".to_string(), "google.com".to_string()],
            auth_tokens: vec![
                "login".to_string(),
                "auth".to_string(),
                "session".to_string(),
                "sapisid".to_string(),
                "hsid".to_string(),
                "sid".to_string(),
            ],
            critical_names: vec![
                "sapisid".to_string(),
                "apisid".to_string(),
                "hsid".to_string(),
                "ssid".to_string(),
                "sid".to_string(),
                "login_info".to_string(),
            ],
            login_redirect_markers: vec!["accounts.google.com".to_string(), "signin".to_string()],
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            avatar: vec![
                "ytd-masthead #avatar-btn img#img".to_string(),
                "button#avatar-btn img".to_string(),
                "#avatar img".to_string(),
                "img[alt*='photo']".to_string(),
            ],
            channel_link: "[href*='/channel/'], [href*='/@']".to_string(),
            history_markers: vec![
                "#contents ytd-video-renderer".to_string(),
                "[data-content-type='history']".to_string(),
                "ytd-browse[page-subtype='history']".to_string(),
            ],
            results_grid: "#contents".to_string(),
            video_renderer: "ytd-video-renderer".to_string(),
            video_title: "ytd-video-renderer a#video-title".to_string(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_secs(3),
            reload_settle: Duration::from_secs(6),
            probe_wait: Duration::from_secs(5),
            probe_poll: Duration::from_millis(100),
            strict_wait: Duration::from_secs(10),
            history_settle: Duration::from_secs(5),
            results_wait: Duration::from_secs(20),
            render_grace: Duration::from_secs(8),
            scroll_settle: Duration::from_secs(1),
            click_settle: Duration::from_secs(2),
            watch: DurationRange::new(10.0, 25.0),
            pause: DurationRange::new(15.0, 30.0),
            session_budget: Duration::from_secs(15 * 60),
            retry_cooldown: Duration::from_secs(10 * 60),
            daily_cooldown: DurationRange::new(24.0 * 3600.0, 24.0 * 3600.0),
        }
    }
}

/// `HEADLESS` env toggle; anything other than (case-insensitive) "true" turns
/// the browser window back on. Unset means headless.
pub fn headless_from_env() -> bool {
    match std::env::var("HEADLESS") {
        Ok(v) => parse_bool_flag(&v),
        Err(_) => true,
    }
}

fn parse_bool_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
