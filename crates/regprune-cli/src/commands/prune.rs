//! Prune command implementation.
//!
//! Selects tags outside the retention policy in each repository and deletes
//! them from an OCI-compatible registry.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use regprune_core::{Orchestrator, RepositoryReport, RunConfig, DEFAULT_KEEP_NEWEST};
use regprune_registry::{Credentials, RegistryClient, RegistryConfig, DEFAULT_REGISTRY_URL};

/// Arguments for the prune command.
#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Registry base URL
    #[arg(long, env = "REGISTRY_BASE_URL", default_value = DEFAULT_REGISTRY_URL)]
    pub base_url: String,

    /// Registry login user name
    #[arg(short, long, env = "REGISTRY_USER")]
    pub user: Option<String>,

    /// Registry login password
    #[arg(short, long, env = "REGISTRY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Pre-issued bearer token, used instead of user/password
    #[arg(long, env = "REGISTRY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository path to clean up (repeatable)
    #[arg(short, long = "repository", required = true)]
    pub repositories: Vec<String>,

    /// Only consider tags matching this regex (repeatable)
    #[arg(short, long = "tag", allow_hyphen_values = true)]
    pub tags: Vec<String>,

    /// Never consider tags matching this regex (repeatable)
    #[arg(short, long = "exclude", allow_hyphen_values = true)]
    pub excludes: Vec<String>,

    /// Keep the N newest matching tags in each repository (0 keeps none)
    #[arg(short = 'n', long, default_value_t = DEFAULT_KEEP_NEWEST)]
    pub keep_n: usize,

    /// Only delete tags older than this, e.g. 12h, 7d, 1m
    #[arg(short, long, default_value = "")]
    pub older_than: String,

    /// Only print which tags would be deleted
    #[arg(short, long)]
    pub dry_run: bool,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Additional CA certificate (PEM)
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

impl PruneArgs {
    /// Validates patterns, duration and repositories into a run configuration.
    fn run_config(&self) -> Result<RunConfig> {
        RunConfig::builder()
            .repositories(self.repositories.iter().cloned())
            .includes(self.tags.iter().cloned())
            .excludes(self.excludes.iter().cloned())
            .keep_newest(self.keep_n)
            .older_than(self.older_than.clone())
            .dry_run(self.dry_run)
            .build()
            .context("Invalid configuration")
    }

    fn registry_config(&self) -> Result<RegistryConfig> {
        let mut config = RegistryConfig::new(&self.base_url)
            .credentials(determine_auth(self)?)
            .request_timeout(Duration::from_secs(self.timeout))
            .accept_invalid_certs(self.insecure);

        if let Some(ref ca_cert) = self.ca_cert {
            config = config.ca_cert(ca_cert);
        }

        Ok(config)
    }
}

/// Execute the prune command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any registry call
/// fails. Repositories after the failing one are not processed.
pub async fn execute(args: PruneArgs) -> Result<()> {
    let run_config = args.run_config()?;
    let registry_config = args.registry_config()?;

    info!(
        url = %registry_config.base_url,
        auth = registry_config.credentials.scheme(),
        insecure = registry_config.is_insecure(),
        "Registry"
    );
    if let Some(max_age) = run_config.policy.max_age {
        info!(older_than = ?max_age, "Age cutoff enabled");
    }

    let client = RegistryClient::new(registry_config).context("Failed to create registry client")?;
    let orchestrator = Orchestrator::new(client, run_config);

    let report = orchestrator
        .run_with(print_repository_report)
        .await
        .context("Prune run aborted")?;

    if orchestrator.config().dry_run {
        println!(
            "[dry run] {} tags would be deleted in {} repositories",
            report.total_selected(),
            report.repositories.len()
        );
    } else {
        println!(
            "{} tags deleted in {} repositories",
            report.total_deleted(),
            report.repositories.len()
        );
    }

    Ok(())
}

fn print_repository_report(report: &RepositoryReport) {
    let selection = &report.selection;

    println!("Searching in {}", report.repository);
    println!(
        "  {} tags found, {} matched, {} skipped",
        report.tags_found, selection.matched, selection.skipped
    );

    if selection.below_threshold {
        println!(
            "  Skipped: {} matched tags do not exceed the keep count",
            selection.matched
        );
        return;
    }

    if report.dry_run {
        for name in selection.names() {
            println!("  [dry run] {name} would be deleted");
        }
        return;
    }

    for deleted in &report.deleted {
        println!("  Deleted {} ({})", deleted.tag, deleted.digest);
    }
    println!(
        "  {}/{} tags have been deleted in {}",
        report.deleted_count(),
        report.selected_count(),
        report.repository
    );
}

/// Determines the authentication method from CLI arguments.
fn determine_auth(args: &PruneArgs) -> Result<Credentials> {
    if let Some(ref token) = args.token {
        return Ok(Credentials::Bearer {
            token: token.clone(),
        });
    }

    match (&args.user, &args.password) {
        (Some(user), Some(password)) => Ok(Credentials::Basic {
            username: user.clone(),
            password: password.clone(),
        }),
        (None, None) => Ok(Credentials::Anonymous),
        _ => anyhow::bail!("Both --user and --password are required for basic authentication"),
    }
}
