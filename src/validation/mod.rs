//! Candidate URL checks applied before a mapping is created.
//!
//! Rules run in a fixed order and the first failing rule is reported. No
//! network access is performed; everything is decided from the string.

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, Url};

pub const MIN_URL_LENGTH: usize = 10;
pub const MAX_URL_LENGTH: usize = 2048;

const SUSPICIOUS_SCHEMES: &[&str] = &["file:", "ftp:", "javascript:", "data:", "vbscript:"];

/// Other shortening services. Links on these hosts are refused so the
/// service never chains redirects through a third party.
const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "rebrand.ly",
    "cutt.ly",
    "tiny.cc",
    "short.link",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyInput,
    #[error("Invalid URL format")]
    MalformedUrl,
    #[error("Only HTTP and HTTPS URLs are allowed")]
    DisallowedScheme,
    #[error("URL must be between {MIN_URL_LENGTH} and {MAX_URL_LENGTH} characters")]
    LengthOutOfRange,
    #[error("URL contains suspicious patterns")]
    SuspiciousTarget,
    #[error("URL is already shortened")]
    AlreadyShortened,
}

#[derive(Debug, Clone)]
pub struct UrlValidator {
    blocked_domains: Vec<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self {
            blocked_domains: SHORTENER_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl UrlValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host to the shortener blocklist, e.g. the service's own public
    /// domain.
    pub fn with_blocked_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = normalize_host(&domain.into());
        if !domain.is_empty() && !self.blocked_domains.contains(&domain) {
            self.blocked_domains.push(domain);
        }
        self
    }

    /// Validate a candidate URL.
    ///
    /// On success the parsed URL is returned. Its serialized form (ASCII,
    /// percent-encoded, punycode host, control characters stripped) is what
    /// gets stored and redirected to, so it must pass the same checks as the
    /// input.
    pub fn validate(&self, candidate: &str) -> Result<Url, ValidationError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let parsed = Url::parse(trimmed).map_err(|_| ValidationError::MalformedUrl)?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::DisallowedScheme);
        }

        let in_range = |s: &str| (MIN_URL_LENGTH..=MAX_URL_LENGTH).contains(&s.chars().count());
        if !in_range(trimmed) || !in_range(parsed.as_str()) {
            return Err(ValidationError::LengthOutOfRange);
        }

        if is_suspicious(&parsed) {
            return Err(ValidationError::SuspiciousTarget);
        }

        if let Some(Host::Domain(domain)) = parsed.host() {
            let host = normalize_host(domain);
            if self.blocked_domains.iter().any(|blocked| domain_matches(&host, blocked)) {
                return Err(ValidationError::AlreadyShortened);
            }
        }

        Ok(parsed)
    }
}

/// Validate with the default blocklist.
pub fn validate(candidate: &str) -> Result<Url, ValidationError> {
    UrlValidator::default().validate(candidate)
}

fn is_suspicious(parsed: &Url) -> bool {
    if SUSPICIOUS_SCHEMES
        .iter()
        .any(|scheme| parsed.as_str().starts_with(scheme))
    {
        return true;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => {
            let host = normalize_host(domain);
            host == "localhost" || host.ends_with(".localhost")
        }
        Some(Host::Ipv4(addr)) => is_local_v4(addr),
        Some(Host::Ipv6(addr)) => is_local_v6(addr),
        None => true,
    }
}

fn is_local_v4(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_unspecified()
}

fn is_local_v6(addr: Ipv6Addr) -> bool {
    if addr.is_loopback() || addr.is_unspecified() {
        return true;
    }
    // ::ffff:127.0.0.1 and friends
    addr.to_ipv4_mapped().is_some_and(is_local_v4)
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn domain_matches(host: &str, blocked: &str) -> bool {
    host == blocked
        || host
            .strip_suffix(blocked)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
