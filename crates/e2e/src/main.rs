//! Loginflow runner entry point
//!
//! Runs the built-in login and password-reset suites (and any YAML suites)
//! against the configured storefront.
//! Run with: cargo run --bin loginflow -- --fixture test-data/testData.json

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loginflow_e2e::driver::{Browser, PlaywrightDriver};
use loginflow_e2e::preflight;
use loginflow_e2e::report::{self, OutputFormat};
use loginflow_e2e::runner::{ScenarioFilter, ScenarioRunner};
use loginflow_e2e::{suites, Fixture, HarnessConfig, LoginSite, Suite};

#[derive(Parser, Debug)]
#[command(name = "loginflow")]
#[command(author, version, about = "Browser scenario runner for the login and password-reset flow")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "loginflow.toml", env = "LOGINFLOW_CONFIG")]
    config: PathBuf,

    /// Credential fixture (JSON with validUser and invalidUser)
    #[arg(long, env = "LOGINFLOW_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Base URL of the site under test
    #[arg(long, env = "LOGINFLOW_BASE_URL")]
    base_url: Option<String>,

    /// Path of the login page
    #[arg(long)]
    login_path: Option<String>,

    /// Run only this suite
    #[arg(long)]
    suite: Option<String>,

    /// Run only scenarios whose name contains this
    #[arg(short, long)]
    name: Option<String>,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Scenarios in flight at once
    #[arg(short, long, env = "LOGINFLOW_WORKERS")]
    workers: Option<usize>,

    /// Bound for each interaction and assertion wait
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Poll interval of the waits
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Browser to use
    #[arg(long, value_enum)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Directory of additional YAML suites
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Skip the built-in suites
    #[arg(long)]
    no_builtin: bool,

    /// List the selected scenarios and exit
    #[arg(long)]
    list: bool,

    /// Check the login page is reachable before starting browsers
    #[arg(long)]
    preflight: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(path) = &self.fixture {
            config.fixture_path = path.clone();
        }
        if let Some(url) = &self.base_url {
            config.target.base_url = url.clone();
        }
        if let Some(path) = &self.login_path {
            config.target.login_path = path.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout_ms {
            config.timing.timeout_ms = timeout;
        }
        if let Some(poll) = self.poll_ms {
            config.timing.poll_interval_ms = poll;
        }
        if let Some(browser) = self.browser {
            config.browser.browser = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(dir) = &self.scenarios {
            config.scenarios_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }
    }

    fn filter(&self) -> ScenarioFilter {
        ScenarioFilter {
            suite: self.suite.clone(),
            name: self.name.clone(),
            tag: self.tag.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn load_suites(config: &HarnessConfig, site: &LoginSite, no_builtin: bool) -> anyhow::Result<Vec<Suite>> {
    let mut all = if no_builtin {
        Vec::new()
    } else {
        suites::builtin(site)
    };

    if let Some(dir) = &config.scenarios_dir {
        let loaded = Suite::load_all(dir)
            .with_context(|| format!("loading suites from {}", dir.display()))?;
        info!("Loaded {} suite(s) from {}", loaded.len(), dir.display());
        all.extend(loaded);
    }

    if all.is_empty() {
        bail!("no suites to run");
    }
    Ok(all)
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let mut config = HarnessConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(true);
    }

    let site = LoginSite::new(config.target.login_path.clone());
    let suites = load_suites(&config, &site, args.no_builtin)?;
    let filter = args.filter();

    if args.list {
        print!("{}", report::render_listing(&suites, &filter, args.format)?);
        return Ok(true);
    }

    if filter.select(&suites).is_empty() {
        bail!("no scenario matches the given filter");
    }

    let fixture = Fixture::load(&config.fixture_path)
        .with_context(|| format!("loading fixture {}", config.fixture_path.display()))?;

    if args.preflight {
        preflight::check_reachable(
            &config.login_url(),
            Duration::from_millis(config.timing.startup_timeout_ms),
        )
        .await
        .context("preflight")?;
    }

    let driver = PlaywrightDriver::new(config.playwright_config())?;
    let runner = ScenarioRunner::new(config.runner_config(), Arc::new(driver), Arc::new(fixture));

    let summary = runner.run_suites(&suites, &filter).await;
    summary.write(&config.output_dir)?;
    report::print_summary(&summary, args.format)?;

    Ok(summary.success())
}
