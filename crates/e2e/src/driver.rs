//! Playwright browser driver
//!
//! Every page context is a separate `node` process running a small driver
//! script. The script launches the browser, opens one context and then
//! answers line-delimited JSON requests on stdin:
//!
//! ```text
//! -> {"id":3,"op":"fill","locator":{...},"value":"abcd"}
//! <- {"id":3,"ok":true}
//! -> {"id":4,"op":"probe","locator":{...},"attribute":"placeholder"}
//! <- {"id":4,"ok":true,"state":{"count":1,"visible":true,...}}
//! <- {"id":5,"ok":false,"kind":"timeout","message":"..."}
//! ```
//!
//! Waiting and polling happen in the runner; the driver only performs one
//! action or one snapshot per request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{Page, PageFactory};
use crate::predicate::ElementState;
use crate::preflight::SERVER_ERROR_STATUS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// `node` executable
    pub node_binary: PathBuf,
    /// Directory whose `node_modules` provides `playwright`
    pub project_dir: PathBuf,
    /// Upper bound for a single driver action (click, fill, goto)
    pub action_timeout: Duration,
    /// Upper bound for launching the browser
    pub startup_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            project_dir: PathBuf::from("."),
            action_timeout: Duration::from_secs(5),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Spawns one driver process per page context
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
    script_dir: Arc<TempDir>,
    script_path: PathBuf,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("loginflow-driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;
        debug!("Driver script written to {}", script_path.display());

        Ok(Self {
            config,
            script_dir: Arc::new(script_dir),
            script_path,
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&config.project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl PageFactory for PlaywrightDriver {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        let page = PlaywrightPage::spawn(&self.config, &self.script_path, self.script_dir.clone()).await?;
        Ok(Box::new(page))
    }
}

/// Request sent to the driver script
#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    command: DriverCommand<'a>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum DriverCommand<'a> {
    Goto {
        url: &'a str,
        /// Responses at or above this status fail the navigation
        fail_status: u16,
    },
    Probe {
        locator: &'a Locator,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribute: Option<&'a str>,
    },
    Fill {
        locator: &'a Locator,
        value: &'a str,
    },
    Click {
        locator: &'a Locator,
    },
    SetChecked {
        locator: &'a Locator,
        checked: bool,
    },
    Focus {
        locator: &'a Locator,
    },
    Blur {
        locator: &'a Locator,
    },
    Close,
}

impl DriverCommand<'_> {
    fn name(&self) -> &'static str {
        match self {
            DriverCommand::Goto { .. } => "goto",
            DriverCommand::Probe { .. } => "probe",
            DriverCommand::Fill { .. } => "fill",
            DriverCommand::Click { .. } => "click",
            DriverCommand::SetChecked { .. } => "set_checked",
            DriverCommand::Focus { .. } => "focus",
            DriverCommand::Blur { .. } => "blur",
            DriverCommand::Close => "close",
        }
    }

    fn target(&self) -> String {
        match self {
            DriverCommand::Goto { url, .. } => url.to_string(),
            DriverCommand::Probe { locator, .. }
            | DriverCommand::Fill { locator, .. }
            | DriverCommand::Click { locator }
            | DriverCommand::SetChecked { locator, .. }
            | DriverCommand::Focus { locator }
            | DriverCommand::Blur { locator } => locator.to_string(),
            DriverCommand::Close => "page".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ResponseKind {
    Timeout,
    Navigation,
    Error,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: u64,
    ok: bool,
    #[serde(default)]
    kind: Option<ResponseKind>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    state: Option<ElementState>,
}

impl Response {
    fn into_result(self, command: &DriverCommand<'_>, action_timeout: Duration) -> E2eResult<Option<ElementState>> {
        if self.ok {
            return Ok(self.state);
        }

        let message = self.message.unwrap_or_else(|| "unknown driver error".to_string());
        Err(match (self.kind, command) {
            (Some(ResponseKind::Navigation), DriverCommand::Goto { url, .. }) => E2eError::NavigationFailure {
                url: url.to_string(),
                reason: message,
            },
            (Some(ResponseKind::Timeout), _) => E2eError::Timeout {
                target: command.target(),
                condition: format!("ready for {}", command.name()),
                waited_ms: action_timeout.as_millis() as u64,
            },
            _ => E2eError::Driver(format!("{} {}: {}", command.name(), command.target(), message)),
        })
    }
}

/// A single browser context backed by a driver process
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    action_timeout: Duration,
    closed: bool,
    _script_dir: Arc<TempDir>,
}

impl PlaywrightPage {
    async fn spawn(config: &PlaywrightConfig, script_path: &std::path::Path, script_dir: Arc<TempDir>) -> E2eResult<Self> {
        let mut cmd = TokioCommand::new(&config.node_binary);
        cmd.arg(script_path)
            .current_dir(&config.project_dir)
            .env("LOGINFLOW_BROWSER", config.browser.as_str())
            .env("LOGINFLOW_HEADLESS", if config.headless { "1" } else { "0" })
            .env("LOGINFLOW_VIEWPORT_WIDTH", config.viewport_width.to_string())
            .env("LOGINFLOW_VIEWPORT_HEIGHT", config.viewport_height.to_string())
            .env("LOGINFLOW_ACTION_TIMEOUT_MS", config.action_timeout.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            E2eError::Driver(format!("Failed to spawn {}: {}", config.node_binary.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdout unavailable".into()))?;

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            action_timeout: config.action_timeout,
            closed: false,
            _script_dir: script_dir,
        };

        // The driver announces itself with id 0 once the browser is up
        let ready = tokio::time::timeout(config.startup_timeout, page.read_response(0))
            .await
            .map_err(|_| E2eError::Driver(format!(
                "{} did not start within {:?}",
                config.browser.as_str(),
                config.startup_timeout
            )))??;
        if !ready.ok {
            return Err(E2eError::Driver(format!(
                "browser launch failed: {}",
                ready.message.unwrap_or_default()
            )));
        }

        debug!("Driver ready (pid: {:?})", page.child.id());
        Ok(page)
    }

    async fn read_response(&mut self, id: u64) -> E2eResult<Response> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Driver("driver process exited".into()))?;

            match serde_json::from_str::<Response>(&line) {
                Ok(response) if response.id == id => return Ok(response),
                Ok(response) => debug!("Ignoring stale driver response {}", response.id),
                Err(_) => debug!("driver: {}", line),
            }
        }
    }

    async fn call(&mut self, command: DriverCommand<'_>) -> E2eResult<Option<ElementState>> {
        if self.closed {
            return Err(E2eError::Driver("page already closed".into()));
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&Request { id, command })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        // Leave the driver room to report its own timeout first
        let bound = self.action_timeout + Duration::from_secs(5);
        let response = tokio::time::timeout(bound, self.read_response(id))
            .await
            .map_err(|_| E2eError::Timeout {
                target: command.target(),
                condition: format!("driver reply to {}", command.name()),
                waited_ms: bound.as_millis() as u64,
            })??;

        response.into_result(&command, self.action_timeout)
    }

    /// Stop the driver process, gracefully first
    async fn stop(&mut self) {
        if tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await.is_ok() {
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await.is_ok()
                {
                    return;
                }
            }
        }

        warn!("Driver did not exit, killing it");
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.call(DriverCommand::Goto {
            url,
            fail_status: SERVER_ERROR_STATUS,
        })
        .await
        .map(|_| ())
    }

    async fn probe(&mut self, locator: &Locator, attribute: Option<&str>) -> E2eResult<ElementState> {
        let state = self.call(DriverCommand::Probe { locator, attribute }).await?;
        Ok(state.unwrap_or_else(ElementState::absent))
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.call(DriverCommand::Fill { locator, value }).await.map(|_| ())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        self.call(DriverCommand::Click { locator }).await.map(|_| ())
    }

    async fn set_checked(&mut self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.call(DriverCommand::SetChecked { locator, checked }).await.map(|_| ())
    }

    async fn focus(&mut self, locator: &Locator) -> E2eResult<()> {
        self.call(DriverCommand::Focus { locator }).await.map(|_| ())
    }

    async fn blur(&mut self, locator: &Locator) -> E2eResult<()> {
        self.call(DriverCommand::Blur { locator }).await.map(|_| ())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.call(DriverCommand::Close).await.map(|_| ());
        self.closed = true;
        self.stop().await;
        debug!("Browser context closed");
        result
    }
}

impl Drop for PlaywrightPage {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.child.start_kill();
        }
    }
}

/// Node.js side of the driver protocol
const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');
const pw = require(require.resolve('playwright', { paths: [process.cwd()] }));

const browserType = pw[process.env.LOGINFLOW_BROWSER || 'chromium'];
const headless = process.env.LOGINFLOW_HEADLESS !== '0';
const actionTimeout = Number(process.env.LOGINFLOW_ACTION_TIMEOUT_MS || '5000');
const viewport = {
  width: Number(process.env.LOGINFLOW_VIEWPORT_WIDTH || '1280'),
  height: Number(process.env.LOGINFLOW_VIEWPORT_HEIGHT || '720'),
};

function send(msg) {
  process.stdout.write(JSON.stringify(msg) + '\n');
}

function resolve(page, loc) {
  const base = loc.within ? resolve(page, loc.within) : page;
  const sel = loc.selector;
  let l;
  switch (sel.by) {
    case 'css': l = base.locator(sel.value); break;
    case 'test_id': l = base.getByTestId(sel.value); break;
    case 'role':
      l = base.getByRole(sel.role, sel.name != null ? { name: sel.name, exact: !!sel.exact } : {});
      break;
    case 'placeholder': l = base.getByPlaceholder(sel.value); break;
    case 'text': l = base.getByText(sel.value, { exact: !!sel.exact }); break;
    default: throw new Error('unknown selector kind: ' + sel.by);
  }
  if (loc.has || loc.has_text != null) {
    const filter = {};
    if (loc.has) filter.has = resolve(page, loc.has);
    if (loc.has_text != null) filter.hasText = loc.has_text;
    l = l.filter(filter);
  }
  if (loc.pick === 'first') l = l.first();
  if (loc.pick === 'last') l = l.last();
  return l;
}

async function probe(page, loc, attribute) {
  const l = resolve(page, loc);
  const count = await l.count();
  if (count === 0) return { count: 0 };
  const el = l.first();
  const quick = { timeout: 1000 };
  return {
    count,
    visible: await el.isVisible(),
    enabled: await el.isEnabled(quick).catch(() => false),
    checked: await el.isChecked(quick).catch(() => null),
    text: await el.textContent(quick).catch(() => null),
    class: await el.getAttribute('class', quick).catch(() => null),
    attribute: attribute ? await el.getAttribute(attribute, quick).catch(() => null) : null,
  };
}

async function handle(page, req) {
  switch (req.op) {
    case 'goto': {
      const resp = await page.goto(req.url, { waitUntil: 'domcontentloaded' });
      if (resp && resp.status() >= req.fail_status) throw new Error('HTTP ' + resp.status());
      return null;
    }
    case 'probe': return probe(page, req.locator, req.attribute);
    case 'fill': await resolve(page, req.locator).fill(req.value); return null;
    case 'click': await resolve(page, req.locator).click(); return null;
    case 'set_checked': await resolve(page, req.locator).setChecked(req.checked); return null;
    case 'focus': await resolve(page, req.locator).focus(); return null;
    case 'blur': await resolve(page, req.locator).blur(); return null;
    case 'close': return null;
    default: throw new Error('unknown op: ' + req.op);
  }
}

(async () => {
  let browser;
  try {
    browser = await browserType.launch({ headless });
  } catch (e) {
    send({ id: 0, ok: false, kind: 'error', message: String(e.message || e) });
    process.exit(1);
  }
  const context = await browser.newContext({ viewport });
  const page = await context.newPage();
  page.setDefaultTimeout(actionTimeout);
  page.setDefaultNavigationTimeout(actionTimeout * 3);
  send({ id: 0, ok: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    const req = JSON.parse(line);
    try {
      const state = await handle(page, req);
      send({ id: req.id, ok: true, state });
      if (req.op === 'close') break;
    } catch (e) {
      const kind = req.op === 'goto' ? 'navigation' : (e.name === 'TimeoutError' ? 'timeout' : 'error');
      send({ id: req.id, ok: false, kind, message: String(e.message || e).split('\n')[0] });
    }
  }

  await context.close().catch(() => {});
  await browser.close().catch(() => {});
  process.exit(0);
})();
"#;
