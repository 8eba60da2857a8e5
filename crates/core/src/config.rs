use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Index documents land in unless overridden.
pub const DEFAULT_INDEX: &str = "ci-metrics";

/// Mapping type segment of store URLs.
pub const DEFAULT_DOC_TYPE: &str = "log";

// ── Top-level config ──────────────────────────────────────────

/// Assembled once at startup from CLI arguments; nothing below reads the
/// environment on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub build: BuildContext,
}

impl Config {
    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  store:    url={}, index={}", self.store.base_url(), self.store.index);
        tracing::info!(
            "  registry: url={}",
            self.registry.base_url().unwrap_or_else(|| "(disabled)".to_string())
        );
        tracing::info!(
            "  build:    nvr={}, target={}, scratch={}",
            self.build.nvr().unwrap_or_else(|| "(none)".to_string()),
            self.build.target.as_deref().unwrap_or("(none)"),
            self.build.scratch.as_deref().unwrap_or("(none)")
        );
    }
}

// ── Document store ────────────────────────────────────────────

/// Elasticsearch-compatible store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Host, with an optional port ("es.example.org" or "es.example.org:9200").
    pub host: String,
    pub index: String,
    pub doc_type: String,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            index: DEFAULT_INDEX.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            timeout_secs: 10,
        }
    }

    /// Base URL; hosts without an explicit port get 9200.
    pub fn base_url(&self) -> String {
        if self.host.contains(':') {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:9200", self.host)
        }
    }
}

// ── Package registry ──────────────────────────────────────────

/// Registry used for architecture enrichment. `host = None` disables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub host: Option<String>,
    pub timeout_secs: u64,
}

impl RegistryConfig {
    pub fn disabled() -> Self {
        Self { host: None, timeout_secs: 10 }
    }

    pub fn base_url(&self) -> Option<String> {
        self.host.as_ref().map(|h| format!("https://{}", h))
    }
}

// ── Build context ─────────────────────────────────────────────

/// Identity of the build an event refers to, as given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildContext {
    pub name: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub target: Option<String>,
    pub scratch: Option<String>,
}

impl BuildContext {
    /// `{name}-{version}-{release}` when all three parts are present.
    pub fn nvr(&self) -> Option<String> {
        match (&self.name, &self.version, &self.release) {
            (Some(n), Some(v), Some(r)) => Some(format!("{}-{}-{}", n, v, r)),
            _ => None,
        }
    }
}
