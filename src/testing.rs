//! Scripted stand-ins for the live page surface. Unit tests use these to
//! drive the login heuristics and the watch loop without a Chrome process.

use crate::browser::PageSurface;
use crate::errors::{Result, SessionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A page whose DOM answers are fixed up front. Interactions are recorded so
/// tests can assert what the caller did.
#[derive(Default)]
pub struct ScriptedPage {
    pub url: String,
    pub present_selectors: Vec<String>,
    pub element_counts: HashMap<String, usize>,
    pub attributes: HashMap<(String, usize), String>,
    pub source: String,
    pub navigations: Mutex<Vec<String>>,
    pub scrolls: Mutex<Vec<(String, usize)>>,
    pub clicks: Mutex<Vec<(String, usize)>>,
}

impl ScriptedPage {
    pub fn at_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageSurface for ScriptedPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    fn current_url(&self) -> String {
        if self.url.is_empty() {
            "about:blank".to_string()
        } else {
            self.url.clone()
        }
    }

    async fn selector_exists(&self, css_selector: &str) -> Result<bool> {
        Ok(self.present_selectors.iter().any(|s| s == css_selector))
    }

    async fn wait_for_element(&self, css_selector: &str, _timeout: Duration) -> Result<()> {
        if self.selector_exists(css_selector).await? {
            Ok(())
        } else {
            Err(SessionError::ElementNotFound(css_selector.to_string()))
        }
    }

    async fn count_elements(&self, css_selector: &str) -> Result<usize> {
        Ok(self
            .element_counts
            .get(css_selector)
            .copied()
            .unwrap_or(0))
    }

    async fn attribute_of_nth(
        &self,
        css_selector: &str,
        index: usize,
        _attribute: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .attributes
            .get(&(css_selector.to_string(), index))
            .cloned())
    }

    async fn scroll_nth_into_view(&self, css_selector: &str, index: usize) -> Result<()> {
        self.scrolls
            .lock()
            .unwrap()
            .push((css_selector.to_string(), index));
        Ok(())
    }

    async fn click_nth(&self, css_selector: &str, index: usize) -> Result<()> {
        self.clicks
            .lock()
            .unwrap()
            .push((css_selector.to_string(), index));
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.source.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_page_answers_from_its_script() {
        let mut page = ScriptedPage::at_url("https://www.youtube.com/");
        page.present_selectors.push("#avatar-btn".to_string());
        page.element_counts.insert("a#video-title".to_string(), 4);

        assert!(page.selector_exists("#avatar-btn").await.unwrap());
        assert!(!page.selector_exists("#other").await.unwrap());
        assert_eq!(page.count_elements("a#video-title").await.unwrap(), 4);
        assert_eq!(page.current_url(), "https://www.youtube.com/");
    }

    #[tokio::test]
    async fn scripted_page_records_interactions() {
        let page = ScriptedPage::default();
        page.navigate("https://www.youtube.com/feed/history")
            .await
            .unwrap();
        page.click_nth("a#video-title", 2).await.unwrap();

        assert_eq!(
            page.navigations.lock().unwrap().as_slice(),
            &["https://www.youtube.com/feed/history".to_string()]
        );
        assert_eq!(
            page.clicks.lock().unwrap().as_slice(),
            &[("a#video-title".to_string(), 2)]
        );
    }
}
