//! Browser page boundary
//!
//! The runner only talks to the browser through these two traits. The
//! Playwright driver implements them for real runs; tests implement them
//! with an in-memory site.

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::locator::Locator;
use crate::predicate::ElementState;

/// One isolated page context (own cookies and local storage)
#[async_trait]
pub trait Page: Send {
    /// Load `url` and wait for the document to be ready
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    /// Snapshot the first element matching `locator`, reading `attribute`
    /// when given. Never waits: an absent element yields a zero count.
    async fn probe(&mut self, locator: &Locator, attribute: Option<&str>) -> E2eResult<ElementState>;

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()>;

    async fn click(&mut self, locator: &Locator) -> E2eResult<()>;

    async fn set_checked(&mut self, locator: &Locator, checked: bool) -> E2eResult<()>;

    async fn focus(&mut self, locator: &Locator) -> E2eResult<()>;

    /// Move focus away from `locator`, firing its blur handlers
    async fn blur(&mut self, locator: &Locator) -> E2eResult<()>;

    /// Tear the context down
    async fn close(&mut self) -> E2eResult<()>;
}

/// Creates a fresh page context per scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>>;
}
