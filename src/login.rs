//! Login-state heuristics. Both checks read indirect DOM signals that only
//! render when authenticated; there is no API-level session validation to
//! fall back on, so a timeout always means "not logged in", never an error.

use crate::browser::PageSurface;
use crate::config::Config;
use crate::probes::{Probe, ProbeSet};
use tracing::{debug, info, warn};
use url::Url;

/// Lenient check used by the importer: refresh so the injected cookies apply,
/// then look for any avatar rendering, then for profile/channel link patterns.
pub async fn quick_check(page: &dyn PageSurface, config: &Config) -> bool {
    let timings = &config.timings;

    if let Err(e) = page.refresh().await {
        warn!("refresh before login check failed: {}", e.truncated(80));
        return false;
    }
    tokio::time::sleep(timings.reload_settle).await;

    let avatars = ProbeSet::from_selectors("avatar", &config.selectors.avatar);
    if let Some(name) = avatars
        .wait_any(page, timings.probe_wait, timings.probe_poll)
        .await
    {
        info!("login detected ({})", name);
        return true;
    }

    let fallback = ProbeSet::new(vec![Probe::new(
        "channel-link",
        config.selectors.channel_link.clone(),
    )]);
    if let Some(name) = fallback
        .wait_any(page, timings.probe_wait, timings.probe_poll)
        .await
    {
        info!("login detected via fallback ({})", name);
        return true;
    }

    info!("login not detected");
    false
}

/// Strict check used by the simulator: beyond the avatar signal it forces the
/// account-gated history page and requires history-specific markers, failing
/// immediately on a redirect to the login domain.
pub async fn strict_check(page: &dyn PageSurface, config: &Config) -> bool {
    let timings = &config.timings;

    if let Err(e) = page.navigate(&config.target.base_url).await {
        warn!("navigation to {} failed: {}", config.target.base_url, e.truncated(80));
        return false;
    }
    tokio::time::sleep(timings.history_settle).await;

    let avatars = ProbeSet::from_selectors("avatar", &config.selectors.avatar);
    match avatars
        .wait_any(page, timings.strict_wait, timings.probe_poll)
        .await
    {
        Some(name) => debug!("avatar present ({})", name),
        None => debug!("no avatar on the home page"),
    }

    if let Err(e) = page.navigate(&config.target.history_url).await {
        warn!("navigation to history failed: {}", e.truncated(80));
        return false;
    }
    tokio::time::sleep(timings.history_settle).await;

    let current = page.current_url();
    if is_login_redirect(&current, &config.target.login_redirect_markers) {
        warn!("redirected to login ({}) - not logged in", current);
        return false;
    }

    let markers = ProbeSet::from_selectors("history", &config.selectors.history_markers);
    match markers
        .wait_any(page, timings.strict_wait, timings.probe_poll)
        .await
    {
        Some(name) => {
            info!("history page accessible ({}) - login confirmed", name);
            true
        }
        None => {
            warn!("history page inaccessible - not logged in");
            false
        }
    }
}

/// True when the current URL shows we were bounced to an accounts/sign-in
/// page instead of the requested one.
pub fn is_login_redirect(current_url: &str, markers: &[String]) -> bool {
    let host = Url::parse(current_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    markers.iter().any(|marker| {
        host.as_deref()
            .map(|h| h.contains(marker.as_str()))
            .unwrap_or(false)
            || current_url.contains(marker.as_str())
    })
}
