//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;
use folio_core::services::FailurePolicy;

/// Synchronize tutorial documents into the post store.
///
/// Every flag can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the `.md`/`.mdx` documents
    #[arg(long, env = "CONTENT_DIR", default_value = "content/tutorials")]
    pub content_dir: PathBuf,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Connection pool size
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Exit successfully even if the run cannot complete.
    ///
    /// Defaults to on when APP_ENV=production so a failed sync never blocks a deploy.
    #[arg(long, env = "SYNC_TOLERATE_FAILURE", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub tolerate_failure: Option<bool>,

    /// Deployment environment
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn failure_policy(&self) -> FailurePolicy {
        let tolerate = self
            .tolerate_failure
            .unwrap_or_else(|| is_production(&self.app_env));

        if tolerate {
            FailurePolicy::Tolerate
        } else {
            FailurePolicy::Propagate
        }
    }
}

fn is_production(app_env: &str) -> bool {
    matches!(app_env.trim().to_ascii_lowercase().as_str(), "production" | "prod")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("content-sync").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_policy_follows_environment() {
        let mut cli = parse(&["--app-env", "production"]);
        assert_eq!(cli.failure_policy(), FailurePolicy::Tolerate);

        cli.app_env = "development".into();
        assert_eq!(cli.failure_policy(), FailurePolicy::Propagate);
    }

    #[test]
    fn test_explicit_flag_overrides_environment() {
        let cli = parse(&["--app-env", "production", "--tolerate-failure", "false"]);
        assert_eq!(cli.failure_policy(), FailurePolicy::Propagate);

        let cli = parse(&["--app-env", "staging", "--tolerate-failure"]);
        assert_eq!(cli.failure_policy(), FailurePolicy::Tolerate);
    }

    #[test]
    fn test_content_dir_flag() {
        let cli = parse(&["--content-dir", "/srv/tutorials", "--app-env", "test"]);
        assert_eq!(cli.content_dir, PathBuf::from("/srv/tutorials"));
    }
}
