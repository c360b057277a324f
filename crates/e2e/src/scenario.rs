//! Scenario and suite definitions
//!
//! Suites are built in Rust (see [`crate::suites`]) or parsed from YAML:
//!
//! ```yaml
//! name: login
//! baseline:
//!   - action: navigate
//!     url: /login
//!   - action: click
//!     target: { selector: { by: role, role: button, name: Nur Unbedingt Erforderlich } }
//! scenarios:
//!   - name: malformed-email
//!     tags: [validation]
//!     steps:
//!       - action: fill
//!         target: { selector: { by: css, value: 'input[type="email"]' } }
//!         value: abcd
//!       - action: blur
//!         target: { selector: { by: css, value: 'input[type="email"]' } }
//!       - action: assert
//!         target: { selector: { by: text, value: Ungültige E-Mail-Adresse } }
//!         expect: { state: visible }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::predicate::Expectation;

/// Scenarios sharing a baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Steps executed at the start of every scenario in this suite
    #[serde(default)]
    pub baseline: Vec<Step>,

    pub scenarios: Vec<Scenario>,
}

/// One independent test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    pub steps: Vec<Step>,
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL, relative to the configured base URL unless absolute
    Navigate { url: String },

    /// Fill an input once it is visible and enabled
    Fill { target: Locator, value: String },

    /// Click an element
    Click { target: Locator },

    /// Click a submit button; credential and required-field checks run here
    Submit { target: Locator },

    /// Check a checkbox
    Check { target: Locator },

    /// Uncheck a checkbox
    Uncheck { target: Locator },

    /// Move focus away from a field; format checks run here
    Blur { target: Locator },

    /// Wait until an element reaches the expected state
    Assert { target: Locator, expect: Expectation },

    /// Log a message (for debugging)
    Log { message: String },
}

/// Moment at which the site validates a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTrigger {
    Blur,
    Submit,
}

impl Step {
    pub fn navigate(url: impl Into<String>) -> Self {
        Step::Navigate { url: url.into() }
    }

    pub fn fill(target: &Locator, value: impl Into<String>) -> Self {
        Step::Fill {
            target: target.clone(),
            value: value.into(),
        }
    }

    pub fn click(target: &Locator) -> Self {
        Step::Click { target: target.clone() }
    }

    pub fn submit(target: &Locator) -> Self {
        Step::Submit { target: target.clone() }
    }

    pub fn check(target: &Locator) -> Self {
        Step::Check { target: target.clone() }
    }

    pub fn blur(target: &Locator) -> Self {
        Step::Blur { target: target.clone() }
    }

    pub fn assert(target: &Locator, expect: Expectation) -> Self {
        Step::Assert {
            target: target.clone(),
            expect,
        }
    }

    pub fn visible(target: &Locator) -> Self {
        Self::assert(target, Expectation::Visible)
    }

    pub fn hidden(target: &Locator) -> Self {
        Self::assert(target, Expectation::Hidden)
    }

    pub fn enabled(target: &Locator) -> Self {
        Self::assert(target, Expectation::Enabled)
    }

    pub fn has_class(target: &Locator, name: impl Into<String>) -> Self {
        Self::assert(target, Expectation::Class { name: name.into() })
    }

    pub fn has_attribute(target: &Locator, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::assert(
            target,
            Expectation::Attribute {
                name: name.into(),
                value: value.into(),
            },
        )
    }

    pub fn has_text(target: &Locator, value: impl Into<String>) -> Self {
        Self::assert(target, Expectation::Text { value: value.into() })
    }

    /// Short label used in traces and logs
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", url),
            Step::Fill { target, .. } => format!("fill:{}", target),
            Step::Click { target } => format!("click:{}", target),
            Step::Submit { target } => format!("submit:{}", target),
            Step::Check { target } => format!("check:{}", target),
            Step::Uncheck { target } => format!("uncheck:{}", target),
            Step::Blur { target } => format!("blur:{}", target),
            Step::Assert { target, expect } => format!("assert:{} is {}", target, expect),
            Step::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }

    /// Which validation pass this step fires, if any
    pub fn validation_trigger(&self) -> Option<ValidationTrigger> {
        match self {
            Step::Blur { .. } => Some(ValidationTrigger::Blur),
            Step::Submit { .. } => Some(ValidationTrigger::Submit),
            _ => None,
        }
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Suite {
    /// Parse a suite from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let suite: Self = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all suites from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.scenarios.is_empty() {
            return Err(E2eError::ScenarioParse(format!("suite {} has no scenarios", self.name)));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.steps.is_empty() {
                return Err(E2eError::ScenarioParse(format!(
                    "{}/{} has no steps",
                    self.name, scenario.name
                )));
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(E2eError::ScenarioParse(format!(
                    "duplicate scenario {}/{}",
                    self.name, scenario.name
                )));
            }
        }
        Ok(())
    }
}
