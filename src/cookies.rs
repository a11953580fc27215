use crate::config::TargetConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum number of critical cookies before a session counts as plausibly
/// authenticated. A heuristic gate, not a guarantee.
pub const CRITICAL_THRESHOLD: usize = 3;

/// One record as exported by the Cookie Editor extension. Nothing beyond
/// `name` and `value` is guaranteed, and even those may be absent in
/// malformed exports.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportedCookie {
    pub name: Option<String>,
    pub value: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    #[serde(rename = "httpOnly")]
    pub http_only: Option<bool>,
    /// Unix epoch, possibly fractional, possibly a numeric string.
    #[serde(rename = "expirationDate")]
    pub expiration_date: Option<Value>,
}

/// Normalized record shaped for direct injection into a live browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub expiry: Option<i64>,
}

impl SessionCookie {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Converts exported records into session records. A filter+map: records
/// missing name or value are dropped silently, order is preserved, nothing is
/// deduplicated.
pub fn convert(exported: &[ExportedCookie], target: &TargetConfig) -> Vec<SessionCookie> {
    exported
        .iter()
        .filter_map(|record| convert_one(record, target))
        .collect()
}

fn convert_one(record: &ExportedCookie, target: &TargetConfig) -> Option<SessionCookie> {
    let name = record.name.clone()?;
    let value = record.value.clone()?;

    // Only a missing domain key falls back to the target domain. A declared
    // empty string stays as-is and, like any foreign domain, is repinned
    // below only for auth-named cookies.
    let mut domain = record
        .domain
        .clone()
        .unwrap_or_else(|| target.cookie_domain.clone());

    // Authentication cookies with an empty or foreign domain get pinned to
    // the target's cookie domain so the browser will accept them there.
    if !in_domain_family(&domain, &target.domain_family)
        && name_matches(&name, &target.auth_tokens)
    {
        domain = target.cookie_domain.clone();
    }

    Some(SessionCookie {
        name,
        value,
        domain,
        path: record.path.clone().unwrap_or_else(|| "/".to_string()),
        secure: record.secure.unwrap_or(false),
        http_only: record.http_only.unwrap_or(false),
        expiry: parse_expiry(record.expiration_date.as_ref()),
    })
}

/// Lenient expiry parsing: numbers and numeric strings pass, anything else is
/// dropped rather than treated as fatal.
fn parse_expiry(raw: Option<&Value>) -> Option<i64> {
    let raw = raw?;
    let secs = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if secs.is_finite() {
        Some(secs as i64)
    } else {
        None
    }
}

pub fn in_domain_family(domain: &str, family: &[String]) -> bool {
    !domain.is_empty() && family.iter().any(|suffix| domain.ends_with(suffix.as_str()))
}

/// Case-insensitive substring match of a cookie name against a token list.
pub fn name_matches(name: &str, tokens: &[String]) -> bool {
    let lowered = name.to_lowercase();
    tokens.iter().any(|token| lowered.contains(token.as_str()))
}

pub fn critical_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
    critical: &[String],
) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name_matches(name, critical))
        .map(|name| name.to_string())
        .collect()
}

/// Outcome of attempting each cookie independently: one record's rejection
/// never aborts the batch.
#[derive(Debug, Default)]
pub struct InjectionReport {
    pub attempted: usize,
    pub injected: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl InjectionReport {
    pub fn record_success(&mut self, name: &str) {
        self.attempted += 1;
        self.injected.push(name.to_string());
    }

    pub fn record_failure(&mut self, name: &str, reason: String) {
        self.attempted += 1;
        self.failed.push((name.to_string(), reason));
    }

    pub fn injected_count(&self) -> usize {
        self.injected.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn critical_names(&self, critical: &[String]) -> Vec<String> {
        critical_names(self.injected.iter().map(String::as_str), critical)
    }

    /// True when enough critical cookies landed for the session to be
    /// plausibly authenticated.
    pub fn meets_critical_threshold(&self, critical: &[String]) -> bool {
        self.critical_names(critical).len() >= CRITICAL_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> TargetConfig {
        TargetConfig::default()
    }

    fn exported(raw: Value) -> Vec<ExportedCookie> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn records_missing_name_or_value_are_dropped() {
        let input = exported(json!([
            { "name": "SID", "value": "a" },
            { "value": "orphan-value" },
            { "name": "orphan-name" },
            { "name": "HSID", "value": "b" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "SID");
        assert_eq!(out[1].name, "HSID");
    }

    #[test]
    fn five_records_one_missing_value_yields_four_in_order() {
        let input = exported(json!([
            { "name": "a", "value": "1" },
            { "name": "b", "value": "2" },
            { "name": "c" },
            { "name": "d", "value": "4" },
            { "name": "e", "value": "5" },
        ]));
        let out = convert(&input, &target());
        let names: Vec<_> = out.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn foreign_domain_on_auth_cookie_is_coerced() {
        let input = exported(json!([
            { "name": "SAPISID", "value": "x", "domain": "example.org" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, ".youtube.com");
    }

    #[test]
    fn absent_domain_defaults_to_target() {
        let input = exported(json!([
            { "name": "PREF", "value": "x" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, ".youtube.com");
    }

    #[test]
    fn declared_empty_domain_on_plain_cookie_is_kept() {
        let input = exported(json!([
            { "name": "PREF", "value": "x", "domain": "" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, "");
    }

    #[test]
    fn declared_empty_domain_on_auth_cookie_is_coerced() {
        let input = exported(json!([
            { "name": "HSID", "value": "x", "domain": "" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, ".youtube.com");
    }

    #[test]
    fn foreign_domain_on_plain_cookie_is_left_alone() {
        let input = exported(json!([
            { "name": "tracking_pref", "value": "x", "domain": "ads.example.org" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, "ads.example.org");
    }

    #[test]
    fn family_domains_are_never_rewritten() {
        let input = exported(json!([
            { "name": "SID", "value": "x", "domain": ".google.com" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].domain, ".google.com");
    }

    #[test]
    fn fractional_expiry_truncates_to_integer() {
        let input = exported(json!([
            { "name": "SID", "value": "x", "expirationDate": 1767225600.75 },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].expiry, Some(1767225600));
    }

    #[test]
    fn unparseable_expiry_is_omitted_not_fatal() {
        let input = exported(json!([
            { "name": "SID", "value": "x", "expirationDate": "whenever" },
            { "name": "HSID", "value": "y", "expirationDate": "1767225600.5" },
            { "name": "SSID", "value": "z", "expirationDate": null },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].expiry, None);
        assert_eq!(out[1].expiry, Some(1767225600));
        assert_eq!(out[2].expiry, None);
    }

    #[test]
    fn defaults_fill_missing_flags_and_path() {
        let input = exported(json!([
            { "name": "SID", "value": "x" },
        ]));
        let out = convert(&input, &target());
        assert_eq!(out[0].path, "/");
        assert!(!out[0].secure);
        assert!(!out[0].http_only);
    }

    #[test]
    fn critical_match_is_case_insensitive_substring() {
        let critical = target().critical_names;
        assert!(name_matches("SAPISID", &critical));
        assert!(name_matches("__Secure-3PSID", &critical));
        assert!(!name_matches("PREF", &critical));
    }

    #[test]
    fn two_critical_cookies_do_not_meet_threshold() {
        let mut report = InjectionReport::default();
        report.record_success("SAPISID");
        report.record_success("HSID");
        report.record_success("PREF");
        assert!(!report.meets_critical_threshold(&target().critical_names));
    }

    #[test]
    fn three_critical_cookies_meet_threshold() {
        let mut report = InjectionReport::default();
        report.record_success("SAPISID");
        report.record_success("HSID");
        report.record_success("SSID");
        assert!(report.meets_critical_threshold(&target().critical_names));
    }

    #[test]
    fn report_counts_failures_without_aborting() {
        let mut report = InjectionReport::default();
        report.record_success("SID");
        report.record_failure("broken", "invalid domain".into());
        report.record_success("HSID");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.injected_count(), 2);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn expires_at_converts_epoch_seconds() {
        let cookie = SessionCookie {
            name: "SID".into(),
            value: "x".into(),
            domain: ".youtube.com".into(),
            path: "/".into(),
            secure: true,
            http_only: false,
            expiry: Some(0),
        };
        assert_eq!(
            cookie.expires_at().unwrap().to_rfc3339(),
            "1970-01-01T00:00:00+00:00"
        );
    }
}
