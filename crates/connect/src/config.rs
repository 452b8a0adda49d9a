//! Connection settings: candidate bases, deadlines and launch overrides.

use log::warn;
use reqwest::Url;
use std::time::Duration;

/// Static candidate bases, tried after any override or cached base.
pub const DEFAULT_API_CANDIDATES: [&str; 3] = [
    "https://nga-postauditory-unharmonically.ngrok-free.dev",
    "http://localhost:5005",
    "http://127.0.0.1:5005",
];

/// Deadline for liveness probes.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;

/// Deadline for application requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

pub const CANDIDATES_ENV: &str = "PUNCHCLOCK_API_CANDIDATES";
pub const PROBE_TIMEOUT_ENV: &str = "PUNCHCLOCK_PROBE_TIMEOUT_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "PUNCHCLOCK_REQUEST_TIMEOUT_MS";

/// Launch query parameters that set the endpoint override, in priority order.
const OVERRIDE_QUERY_PARAMS: [&str; 2] = ["api", "api_base"];

/// Trim whitespace and trailing slashes from a base URL.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    candidates: Vec<String>,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_API_CANDIDATES
                .iter()
                .map(|base| base.to_string())
                .collect(),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl ConnectConfig {
    /// Use `candidates` as the static default list.
    ///
    /// Blank entries are dropped; an empty result keeps the built-in defaults.
    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for base in candidates {
            let base = normalize_base(base.as_ref());
            if !base.is_empty() && !list.contains(&base) {
                list.push(base);
            }
        }
        if list.is_empty() {
            warn!("[Config] Empty candidate list, keeping default API candidates");
        } else {
            self.candidates = list;
        }
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Static candidate bases in priority order. Never empty.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Build from `PUNCHCLOCK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or invalid values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(CANDIDATES_ENV) {
            config = config.with_candidates(raw.split(','));
        }
        if let Some(ms) = parse_millis(&lookup, PROBE_TIMEOUT_ENV) {
            config.probe_timeout = ms;
        }
        if let Some(ms) = parse_millis(&lookup, REQUEST_TIMEOUT_ENV) {
            config.request_timeout = ms;
        }
        config
    }
}

fn parse_millis<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            warn!("[Config] Ignoring invalid {}='{}'", name, raw);
            None
        }
    }
}

/// Endpoint override carried by a launch URL (`?api=` or `?api_base=`).
///
/// Accepts a full URL or a bare query string such as `?api=http://host:5005`.
pub fn override_from_launch_url(launch_url: &str) -> Option<String> {
    let trimmed = launch_url.trim();
    let parsed = if trimmed.starts_with('?') {
        Url::parse(&format!("http://localhost/{}", trimmed))
    } else {
        Url::parse(trimmed)
    }
    .ok()?;

    OVERRIDE_QUERY_PARAMS.iter().find_map(|param| {
        parsed
            .query_pairs()
            .find(|(key, value)| key == param && !value.trim().is_empty())
            .map(|(_, value)| normalize_base(&value))
    })
}
