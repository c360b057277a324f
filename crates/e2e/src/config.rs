//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::{Browser, PlaywrightConfig};
use crate::error::{E2eError, E2eResult};
use crate::runner::RunnerConfig;

/// Harness configuration, usually read from `loginflow.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Scenarios in flight at once
    pub workers: usize,

    /// Credential fixture (JSON)
    pub fixture_path: PathBuf,

    /// Extra YAML suites
    pub scenarios_dir: Option<PathBuf>,

    /// Where `test-results.json` is written
    pub output_dir: PathBuf,

    /// Site under test
    pub target: TargetConfig,

    /// Wait bounds
    pub timing: TimingConfig,

    /// Browser settings
    pub browser: BrowserConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            fixture_path: PathBuf::from("test-data/testData.json"),
            scenarios_dir: None,
            output_dir: PathBuf::from("test-results"),
            target: TargetConfig::default(),
            timing: TimingConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    pub login_path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.douglas.de".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bound for each interaction or assertion wait
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Bound for a single browser action inside the driver
    pub action_timeout_ms: u64,
    pub startup_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            poll_interval_ms: 100,
            action_timeout_ms: 5000,
            startup_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub node_binary: PathBuf,
    /// Directory with a `node_modules/playwright` install
    pub project_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let playwright = PlaywrightConfig::default();
        Self {
            browser: playwright.browser,
            headless: playwright.headless,
            viewport_width: playwright.viewport_width,
            viewport_height: playwright.viewport_height,
            node_binary: playwright.node_binary,
            project_dir: playwright.project_dir,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults if it is missing
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if !(self.target.base_url.starts_with("http://") || self.target.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!(
                "target.base_url must be an http(s) URL: {}",
                self.target.base_url
            )));
        }
        if self.workers == 0 {
            return Err(E2eError::Config("workers must be at least 1".into()));
        }
        if self.timing.timeout_ms == 0 || self.timing.poll_interval_ms == 0 {
            return Err(E2eError::Config("timing bounds must be positive".into()));
        }
        if self.timing.action_timeout_ms == 0 || self.timing.startup_timeout_ms == 0 {
            return Err(E2eError::Config(
                "timing.action_timeout_ms and timing.startup_timeout_ms must be positive".into(),
            ));
        }
        if self.timing.poll_interval_ms > self.timing.timeout_ms {
            return Err(E2eError::Config(
                "timing.poll_interval_ms must not exceed timing.timeout_ms".into(),
            ));
        }
        Ok(())
    }

    /// Absolute URL of the login page
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.target.base_url.trim_end_matches('/'),
            self.target.login_path.trim_start_matches('/')
        )
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            base_url: self.target.base_url.clone(),
            timeout: Duration::from_millis(self.timing.timeout_ms),
            poll_interval: Duration::from_millis(self.timing.poll_interval_ms),
            workers: self.workers,
        }
    }

    pub fn playwright_config(&self) -> PlaywrightConfig {
        PlaywrightConfig {
            browser: self.browser.browser,
            headless: self.browser.headless,
            viewport_width: self.browser.viewport_width,
            viewport_height: self.browser.viewport_height,
            node_binary: self.browser.node_binary.clone(),
            project_dir: self.browser.project_dir.clone(),
            action_timeout: Duration::from_millis(self.timing.action_timeout_ms),
            startup_timeout: Duration::from_millis(self.timing.startup_timeout_ms),
        }
    }
}
