use crate::browser::PageSurface;
use std::time::{Duration, Instant};
use tracing::debug;

/// One named DOM condition used to infer application state. The selector is
/// site-owned markup; the name is ours and stable for logging.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    pub selector: String,
}

impl Probe {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }
}

/// A set of alternative probes evaluated until first success or collective
/// timeout. Per-probe lookup failures are logged and skipped; only the window
/// bounds the wait.
#[derive(Debug, Clone, Default)]
pub struct ProbeSet {
    probes: Vec<Probe>,
}

impl ProbeSet {
    pub fn new(probes: Vec<Probe>) -> Self {
        Self { probes }
    }

    pub fn from_selectors(name: &str, selectors: &[String]) -> Self {
        let probes = selectors
            .iter()
            .enumerate()
            .map(|(i, selector)| Probe::new(format!("{}[{}]", name, i), selector.clone()))
            .collect();
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Returns the name of the first probe that matched, or `None` once the
    /// window closes. Never an error: a timeout is a presumed-false outcome.
    pub async fn wait_any(
        &self,
        page: &dyn PageSurface,
        window: Duration,
        poll: Duration,
    ) -> Option<String> {
        if self.probes.is_empty() {
            return None;
        }

        let deadline = Instant::now() + window;
        loop {
            for probe in &self.probes {
                match page.selector_exists(&probe.selector).await {
                    Ok(true) => return Some(probe.name.clone()),
                    Ok(false) => {}
                    Err(e) => {
                        debug!("probe '{}' lookup failed: {}", probe.name, e.truncated(80));
                    }
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;

    #[test]
    fn from_selectors_names_probes_in_order() {
        let set = ProbeSet::from_selectors(
            "avatar",
            &["#a img".to_string(), "button#b img".to_string()],
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.probes[0].name, "avatar[0]");
        assert_eq!(set.probes[0].selector, "#a img");
        assert_eq!(set.probes[1].name, "avatar[1]");
    }

    #[test]
    fn empty_set_is_empty() {
        let set = ProbeSet::from_selectors("x", &[]);
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn wait_any_reports_first_matching_probe() {
        let mut page = ScriptedPage::default();
        page.present_selectors.push("button#b img".to_string());
        let set = ProbeSet::from_selectors(
            "avatar",
            &["#a img".to_string(), "button#b img".to_string()],
        );
        let hit = set
            .wait_any(&page, Duration::from_millis(50), Duration::from_millis(5))
            .await;
        assert_eq!(hit.as_deref(), Some("avatar[1]"));
    }

    #[tokio::test]
    async fn wait_any_returns_none_once_window_closes() {
        let page = ScriptedPage::default();
        let set = ProbeSet::from_selectors("avatar", &["#nope".to_string()]);
        let hit = set
            .wait_any(&page, Duration::from_millis(20), Duration::from_millis(5))
            .await;
        assert!(hit.is_none());
    }
}
