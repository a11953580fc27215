use crate::cookies::SessionCookie;
use crate::errors::{Result, SessionError};
use std::fs;
use std::path::Path;

/// Writes the full cookie collection, unconditionally replacing whatever the
/// file held before. There is no merge and no backup: a corrupt store means
/// re-importing from a fresh export.
pub fn save(path: &Path, cookies: &[SessionCookie]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec(cookies)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Loads the persisted collection. Missing or unreadable state is a hard
/// failure; callers decide whether that means exit or cooldown.
pub fn load(path: &Path) -> Result<Vec<SessionCookie>> {
    if !path.exists() {
        return Err(SessionError::CookieStore(format!(
            "cookie store not found: {}",
            path.display()
        )));
    }
    let bytes = fs::read(path)?;
    let cookies = serde_json::from_slice(&bytes)
        .map_err(|e| SessionError::CookieStore(format!("corrupt cookie store: {}", e)))?;
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, expiry: Option<i64>) -> SessionCookie {
        SessionCookie {
            name: name.to_string(),
            value: format!("{}-value", name),
            domain: ".youtube.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: name.len() % 2 == 0,
            expiry,
        }
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let original = vec![
            cookie("SAPISID", Some(1767225600)),
            cookie("HSID", None),
            cookie("PREF", Some(0)),
        ];

        save(&path, &original).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        save(&path, &[cookie("old", None), cookie("stale", None)]).unwrap();
        save(&path, &[cookie("fresh", None)]).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "fresh");
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/cookies.json");
        save(&path, &[cookie("SID", None)]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_store_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SessionError::CookieStore(_)));
    }

    #[test]
    fn corrupt_store_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, b"{ half a reco").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, SessionError::CookieStore(_)));
    }
}
