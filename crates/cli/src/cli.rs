use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use funnel_core::config::{BuildContext, Config, RegistryConfig, StoreConfig, DEFAULT_INDEX};

/// Funnel one CI event into the metrics store.
///
/// The event payload and the build identity come from flags or from the
/// environment the CI job exports (`CI_TYPE`, `CI_MESSAGE`, `name`, ...),
/// so the binary can run as a post-build step without any wrapping.
#[derive(Parser, Debug)]
#[command(name = "ci-funnel", about, disable_version_flag = true)]
pub struct FunnelArgs {
    /// Elastic Search server to use
    #[arg(short = 'e', long)]
    pub elastic: Option<String>,

    /// PDC server to resolve expected architectures against
    #[arg(short = 'p', long)]
    pub pdc: Option<String>,

    /// Index being processed
    #[arg(long, default_value = DEFAULT_INDEX)]
    pub ci_index: String,

    /// Event type tag, default will use CI_TYPE from env
    #[arg(long, env = "CI_TYPE")]
    pub ci_type: Option<String>,

    /// Event payload, default will use CI_MESSAGE from env
    #[arg(long, env = "CI_MESSAGE")]
    pub ci_message: Option<String>,

    /// Scratch build marker, default will use scratch from env
    #[arg(long, env = "scratch")]
    pub scratch: Option<String>,

    /// Package name, default will use name from env
    #[arg(long, env = "name")]
    pub name: Option<String>,

    /// Package version, default will use version from env
    #[arg(long, env = "version")]
    pub version: Option<String>,

    /// Package release, default will use release from env
    #[arg(long, env = "release")]
    pub release: Option<String>,

    /// Build target, default will use target from env
    #[arg(long, env = "target")]
    pub target: Option<String>,

    /// Write the derived document id to this file on success
    #[arg(long)]
    pub docid_file: Option<PathBuf>,

    /// Store request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub store_timeout: u64,

    /// Registry request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub registry_timeout: u64,

    /// Don't actually do anything
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Debug output
    #[arg(short = 'v', long)]
    pub debug: bool,
}

impl FunnelArgs {
    /// Assemble the runtime config. The store host is the one argument
    /// without a usable default, so it is checked here rather than by clap.
    pub fn to_config(&self) -> Result<Config> {
        let host = self
            .elastic
            .clone()
            .context("You must specify an Elastic Search server (--elastic)")?;
        Ok(Config {
            store: StoreConfig {
                host,
                index: self.ci_index.clone(),
                doc_type: funnel_core::config::DEFAULT_DOC_TYPE.to_string(),
                timeout_secs: self.store_timeout,
            },
            registry: RegistryConfig {
                host: self.pdc.clone(),
                timeout_secs: self.registry_timeout,
            },
            build: BuildContext {
                name: self.name.clone(),
                version: self.version.clone(),
                release: self.release.clone(),
                target: self.target.clone(),
                scratch: self.scratch.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> FunnelArgs {
        FunnelArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_missing_elastic_is_rejected_by_to_config() {
        let args = parse(&["ci-funnel"]);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_scratch_value_passes_through() {
        let args = parse(&["ci-funnel", "-e", "es", "--scratch", "false"]);
        assert_eq!(args.to_config().unwrap().build.scratch.as_deref(), Some("false"));
        let args = parse(&["ci-funnel", "-e", "es", "--scratch", "true"]);
        assert_eq!(args.to_config().unwrap().build.scratch.as_deref(), Some("true"));
        let args = parse(&["ci-funnel", "-e", "es"]);
        assert_eq!(args.to_config().unwrap().build.scratch, None);
    }

    #[test]
    fn test_version_flag_takes_a_value() {
        let args = parse(&["ci-funnel", "-e", "es", "--version", "3.10.0"]);
        assert_eq!(args.version.as_deref(), Some("3.10.0"));
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["ci-funnel", "-e", "es.example.org"]);
        assert_eq!(args.ci_index, "ci-metrics");
        assert_eq!(args.store_timeout, 10);
        assert!(!args.dry_run);
    }
}
