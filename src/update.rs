//! Release feed check for the "Update Available!" notice.

use std::time::Duration;

use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::UpdatesConfig;
use crate::error::{Error, Result};

const USER_AGENT: &str = "IconChangerApp";

/// Subset of the GitHub "latest release" payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
}

pub struct UpdateChecker {
    repository: String,
    timeout: Duration,
}

impl UpdateChecker {
    pub fn new(repository: impl Into<String>, timeout: Duration) -> Self {
        Self {
            repository: repository.into(),
            timeout,
        }
    }

    pub fn from_config(config: &UpdatesConfig) -> Self {
        Self::new(
            config.repository.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn latest_release_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/releases/latest",
            self.repository.trim_matches('/')
        )
    }

    pub fn fetch_latest(&self) -> Result<Release> {
        let url = self.latest_release_url();
        debug!(%url, "Checking for updates");
        let body = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/vnd.github+json")
            .timeout(self.timeout)
            .call()
            .map_err(|e| Error::Http(e.to_string()))?
            .into_string()
            .map_err(|e| Error::Http(e.to_string()))?;
        parse_release(&body)
    }

    /// URL of a release newer than `current`, if there is one.
    pub fn check(&self, current: &str) -> Result<Option<String>> {
        let release = self.fetch_latest()?;
        newer_release(current, &release)
    }

    /// Like [`check`](Self::check) but logs and swallows failures.
    pub fn check_quietly(&self, current: &str) -> Option<String> {
        match self.check(current) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Update check failed");
                None
            }
        }
    }
}

pub fn parse_release(body: &str) -> Result<Release> {
    Ok(serde_json::from_str(body)?)
}

/// Parse a release tag, tolerating a `v` prefix and missing components
/// (`v1.2` reads as `1.2.0`).
pub fn parse_version(tag: &str) -> Result<Version> {
    let trimmed = tag.trim().trim_start_matches(['v', 'V']);
    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let (core, rest) = match trimmed.find(['-', '+']) {
        Some(at) => trimmed.split_at(at),
        None => (trimmed, ""),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(Error::Version(tag.to_string()));
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&format!("{}{}", parts.join("."), rest))
        .map_err(|_| Error::Version(tag.to_string()))
}

/// The release page when `release` is newer than `current`.
pub fn newer_release(current: &str, release: &Release) -> Result<Option<String>> {
    if release.tag_name.trim().trim_start_matches(['v', 'V']).is_empty() {
        return Ok(None);
    }
    let current = parse_version(current)?;
    let latest = parse_version(&release.tag_name)?;
    debug!(%current, %latest, "Compared release versions");
    if latest > current {
        Ok(Some(release.html_url.clone()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str) -> Release {
        Release {
            tag_name: tag.to_string(),
            html_url: format!("https://example.invalid/releases/{tag}"),
        }
    }

    #[test]
    fn newer_tag_yields_url() {
        let url = newer_release("0.0.1", &release("v0.1.0")).unwrap();
        assert_eq!(url.as_deref(), Some("https://example.invalid/releases/v0.1.0"));
    }

    #[test]
    fn same_or_older_tag_yields_nothing() {
        assert_eq!(newer_release("0.1.0", &release("v0.1.0")).unwrap(), None);
        assert_eq!(newer_release("0.2.0", &release("0.1.9")).unwrap(), None);
    }

    #[test]
    fn empty_tag_yields_nothing() {
        assert_eq!(newer_release("0.0.1", &release("")).unwrap(), None);
        assert_eq!(newer_release("0.0.1", &release("v")).unwrap(), None);
    }

    #[test]
    fn short_tags_are_padded() {
        assert_eq!(parse_version("v1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(parse_version("3").unwrap(), Version::new(3, 0, 0));
        assert_eq!(
            parse_version("1.2-beta.1").unwrap(),
            Version::parse("1.2.0-beta.1").unwrap()
        );
    }

    #[test]
    fn prerelease_is_older_than_release() {
        assert_eq!(newer_release("1.0.0", &release("v1.0.0-rc.1")).unwrap(), None);
        assert!(newer_release("1.0.0-rc.1", &release("v1.0.0"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn garbage_tag_is_an_error() {
        assert!(parse_version("latest").is_err());
        assert!(parse_version("1..2").is_err());
    }

    #[test]
    fn release_payload_parses_with_extra_fields() {
        let body = r#"{"tag_name":"v0.2.0","html_url":"https://x/y","draft":false,"assets":[]}"#;
        let release = parse_release(body).unwrap();
        assert_eq!(release.tag_name, "v0.2.0");
        assert_eq!(release.html_url, "https://x/y");
        assert!(parse_release("{}").unwrap().tag_name.is_empty());
    }

    #[test]
    fn feed_url_uses_repository_slug() {
        let checker = UpdateChecker::new("/owner/name/", Duration::from_secs(1));
        assert_eq!(
            checker.latest_release_url(),
            "https://api.github.com/repos/owner/name/releases/latest"
        );
    }
}
