//! Loginflow E2E scenario runner
//!
//! Drives a real browser through the login and password-reset flow of a
//! storefront and checks the observable UI after each interaction:
//! - Semantic locators (role, test id, placeholder, text) with container scoping
//! - Bounded polling for every interaction and assertion
//! - One fresh page context per scenario, scenarios run on a worker pool
//! - Built-in suites plus declarative YAML suites
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── run_suites(suites, filter) -> SuiteSummary           │
//! │    ├── run_scenario(suite, scenario) -> ScenarioResult      │
//! │    │     ├── PageFactory::new_page() -> Box<dyn Page>       │
//! │    │     ├── baseline steps                                 │
//! │    │     └── scenario steps                                 │
//! │    └── poll predicate until timeout                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightDriver (PageFactory)                             │
//! │    └── one node process per page, JSON lines on stdio      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suite (YAML or built-in)                                   │
//! │    ├── baseline: [Step]                                     │
//! │    └── scenarios: [{ name, tags, steps: [Step] }]           │
//! │          ├── navigate { url }                               │
//! │          ├── fill { target, value }                         │
//! │          ├── click | submit | check | uncheck | blur        │
//! │          └── assert { target, expect }                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod locator;
pub mod page;
pub mod predicate;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod site;
pub mod suites;

pub use config::HarnessConfig;
pub use driver::{Browser, PlaywrightConfig, PlaywrightDriver};
pub use error::{E2eError, E2eResult, FailureKind};
pub use fixture::Fixture;
pub use locator::Locator;
pub use page::{Page, PageFactory};
pub use predicate::{ElementState, Expectation, Predicate};
pub use runner::{RunnerConfig, ScenarioFilter, ScenarioResult, ScenarioRunner, SuiteSummary};
pub use scenario::{Scenario, Step, Suite};
pub use site::LoginSite;
