use crate::config::BrowserConfig;
use crate::cookies::{InjectionReport, SessionCookie};
use crate::errors::{Result, SessionError};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Network::{Cookie, CookieParam};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Script injected right after launch; pairs with the
/// `--disable-blink-features=AutomationControlled` launch flag.
const WEBDRIVER_OVERRIDE: &str =
    "Object.defineProperty(navigator,'webdriver',{get:()=>undefined});";

/// DOM-facing surface of a live session. The login heuristics and the watch
/// loop only see this trait, so tests can drive them with a scripted page
/// instead of a Chrome process.
#[async_trait]
pub trait PageSurface: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn refresh(&self) -> Result<()>;

    fn current_url(&self) -> String;

    /// Single non-blocking check for a selector.
    async fn selector_exists(&self, css_selector: &str) -> Result<bool>;

    /// Bounded blocking wait for one selector. Timeout surfaces as
    /// `ElementNotFound`; callers decide whether that is recoverable.
    async fn wait_for_element(&self, css_selector: &str, timeout: Duration) -> Result<()>;

    async fn count_elements(&self, css_selector: &str) -> Result<usize>;

    async fn attribute_of_nth(
        &self,
        css_selector: &str,
        index: usize,
        attribute: &str,
    ) -> Result<Option<String>>;

    async fn scroll_nth_into_view(&self, css_selector: &str, index: usize) -> Result<()>;

    async fn click_nth(&self, css_selector: &str, index: usize) -> Result<()>;

    async fn page_source(&self) -> Result<String>;
}

/// One live browser instance with a single tab. Owns the Chrome process:
/// dropping the session terminates it, which is the only teardown the rest of
/// the crate relies on.
pub struct BrowserSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        // Create strings first to ensure they live long enough
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| SessionError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| SessionError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SessionError::LaunchFailed(e.to_string()))?;

        tab.evaluate(WEBDRIVER_OVERRIDE, false)
            .map_err(|e| SessionError::LaunchFailed(e.to_string()))?;

        debug!(headless = config.headless, "browser launched");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| SessionError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Adds each record individually so one rejection cannot sink the batch.
    /// Failures are accumulated in the report with truncated reasons.
    pub async fn inject_cookies(&self, cookies: &[SessionCookie]) -> InjectionReport {
        let mut report = InjectionReport::default();

        for cookie in cookies {
            match self.tab.set_cookies(vec![to_cookie_param(cookie)]) {
                Ok(()) => report.record_success(&cookie.name),
                Err(e) => {
                    let reason = crate::errors::truncate_message(&e.to_string(), 80);
                    warn!("cookie '{}' rejected: {}", cookie.name, reason);
                    report.record_failure(&cookie.name, reason);
                }
            }
        }

        report
    }

    /// All cookies the session currently holds, in driver order.
    pub async fn export_cookies(&self) -> Result<Vec<SessionCookie>> {
        let cookies = self
            .tab
            .get_cookies()
            .map_err(|e| SessionError::CookieStore(e.to_string()))?;

        Ok(cookies.iter().map(from_driver_cookie).collect())
    }
}

#[async_trait]
impl PageSurface for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| SessionError::NavigationFailed(e.to_string()))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| SessionError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.tab
            .reload(false, None)
            .map_err(|e| SessionError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    fn current_url(&self) -> String {
        self.tab.get_url()
    }

    async fn selector_exists(&self, css_selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector('{}') !== null",
            css_selector.replace('\'', "\\'")
        );
        let value = self.evaluate(&js_code).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_for_element(&self, css_selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(css_selector, timeout)
            .map_err(|e| SessionError::ElementNotFound(e.to_string()))?;

        Ok(())
    }

    async fn count_elements(&self, css_selector: &str) -> Result<usize> {
        let js_code = format!(
            "document.querySelectorAll('{}').length",
            css_selector.replace('\'', "\\'")
        );
        let value = self.evaluate(&js_code).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn attribute_of_nth(
        &self,
        css_selector: &str,
        index: usize,
        attribute: &str,
    ) -> Result<Option<String>> {
        let js_code = format!(
            r#"
            (function() {{
                const element = document.querySelectorAll('{}')[{}];
                if (element) {{
                    return element.getAttribute('{}');
                }}
                return null;
            }})()
        "#,
            css_selector.replace('\'', "\\'"),
            index,
            attribute.replace('\'', "\\'")
        );

        let value = self.evaluate(&js_code).await?;
        Ok(value.as_str().map(|s| s.to_string()))
    }

    async fn scroll_nth_into_view(&self, css_selector: &str, index: usize) -> Result<()> {
        let js_code = format!(
            r#"
            (function() {{
                const element = document.querySelectorAll('{}')[{}];
                if (element) {{
                    element.scrollIntoView({{ block: 'center' }});
                    return true;
                }}
                return false;
            }})()
        "#,
            css_selector.replace('\'', "\\'"),
            index
        );

        let value = self.evaluate(&js_code).await?;
        if value.as_bool() == Some(true) {
            return Ok(());
        }

        Err(SessionError::ElementNotFound(format!(
            "no element #{} for selector '{}'",
            index, css_selector
        )))
    }

    async fn click_nth(&self, css_selector: &str, index: usize) -> Result<()> {
        let js_code = format!(
            r#"
            (function() {{
                const element = document.querySelectorAll('{}')[{}];
                if (element) {{
                    element.click();
                    return true;
                }}
                return false;
            }})()
        "#,
            css_selector.replace('\'', "\\'"),
            index
        );

        let value = self.evaluate(&js_code).await?;
        if value.as_bool() == Some(true) {
            return Ok(());
        }

        Err(SessionError::ElementNotFound(format!(
            "no element #{} for selector '{}'",
            index, css_selector
        )))
    }

    async fn page_source(&self) -> Result<String> {
        let value = self.evaluate("document.documentElement.outerHTML").await?;

        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| SessionError::JavaScriptFailed("page source unavailable".to_string()))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Chrome process goes down with the Browser handle.
    }
}

pub fn to_cookie_param(cookie: &SessionCookie) -> CookieParam {
    CookieParam {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        url: None,
        domain: Some(cookie.domain.clone()),
        path: Some(cookie.path.clone()),
        secure: Some(cookie.secure),
        http_only: Some(cookie.http_only),
        same_site: None,
        expires: cookie.expiry.map(|e| e as f64),
        priority: None,
        same_party: None,
        source_scheme: None,
        source_port: None,
        partition_key: None,
    }
}

pub fn from_driver_cookie(cookie: &Cookie) -> SessionCookie {
    // CDP reports session cookies with a non-positive expiry.
    let expiry = if cookie.expires > 0.0 {
        Some(cookie.expires as i64)
    } else {
        None
    };

    SessionCookie {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        secure: cookie.secure,
        http_only: cookie.http_only,
        expiry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionCookie {
        SessionCookie {
            name: "SAPISID".into(),
            value: "abc123".into(),
            domain: ".youtube.com".into(),
            path: "/".into(),
            secure: true,
            http_only: false,
            expiry: Some(1767225600),
        }
    }

    #[test]
    fn cookie_param_carries_all_session_fields() {
        let param = to_cookie_param(&sample());
        assert_eq!(param.name, "SAPISID");
        assert_eq!(param.value, "abc123");
        assert_eq!(param.domain.as_deref(), Some(".youtube.com"));
        assert_eq!(param.path.as_deref(), Some("/"));
        assert_eq!(param.secure, Some(true));
        assert_eq!(param.http_only, Some(false));
        assert_eq!(param.expires, Some(1767225600.0));
    }

    #[test]
    fn cookie_param_omits_missing_expiry() {
        let mut cookie = sample();
        cookie.expiry = None;
        assert_eq!(to_cookie_param(&cookie).expires, None);
    }
}
