//! Assertion predicates and their evaluation against observed element state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::E2eResult;
use crate::fixture::Fixture;
use crate::locator::Locator;

/// Expected state of a single element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Expectation {
    Visible,
    /// Absent from the page or not rendered
    Hidden,
    Enabled,
    Checked,
    NotChecked,
    /// Attribute equals `value` exactly
    Attribute { name: String, value: String },
    /// `class` attribute contains the token `name`
    Class { name: String },
    /// Text content contains `value` (whitespace normalized)
    Text { value: String },
}

/// Snapshot of the first element a locator resolves to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Number of matching elements
    pub count: usize,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub enabled: bool,
    /// `None` for elements that cannot be checked
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    /// Value of the attribute requested by the probe, if any
    #[serde(default)]
    pub attribute: Option<String>,
}

impl ElementState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(&self) -> bool {
        self.count > 0
    }

    /// Visible and enabled, the precondition of every interaction
    pub fn is_actionable(&self) -> bool {
        self.present() && self.visible && self.enabled
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class
            .as_deref()
            .map(|c| c.split_whitespace().any(|token| token == name))
            .unwrap_or(false)
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        let needle = normalize_whitespace(needle);
        self.text
            .as_deref()
            .map(|t| normalize_whitespace(t).contains(&needle))
            .unwrap_or(false)
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Expectation {
    /// Attribute the probe has to read for this expectation
    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Expectation::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn matches(&self, state: &ElementState) -> bool {
        match self {
            Expectation::Visible => state.present() && state.visible,
            Expectation::Hidden => !state.present() || !state.visible,
            Expectation::Enabled => state.present() && state.visible && state.enabled,
            Expectation::Checked => state.present() && state.checked == Some(true),
            Expectation::NotChecked => state.present() && state.checked == Some(false),
            Expectation::Attribute { value, .. } => {
                state.present() && state.attribute.as_deref() == Some(value.as_str())
            }
            Expectation::Class { name } => state.present() && state.has_class(name),
            Expectation::Text { value } => state.present() && state.contains_text(value),
        }
    }

    /// Describe the part of `state` this expectation looks at
    pub fn observed(&self, state: &ElementState) -> String {
        if !state.present() {
            return "no matching element".to_string();
        }

        match self {
            Expectation::Visible | Expectation::Hidden => {
                if state.visible { "visible" } else { "hidden" }.to_string()
            }
            Expectation::Enabled => match (state.visible, state.enabled) {
                (false, _) => "hidden".to_string(),
                (true, true) => "enabled".to_string(),
                (true, false) => "disabled".to_string(),
            },
            Expectation::Checked | Expectation::NotChecked => match state.checked {
                Some(true) => "checked".to_string(),
                Some(false) => "not checked".to_string(),
                None => "not a checkbox".to_string(),
            },
            Expectation::Attribute { name, .. } => match &state.attribute {
                Some(value) => format!("{}={:?}", name, value),
                None => format!("no {} attribute", name),
            },
            Expectation::Class { .. } => format!("class={:?}", state.class.as_deref().unwrap_or("")),
            Expectation::Text { .. } => format!(
                "text={:?}",
                normalize_whitespace(state.text.as_deref().unwrap_or(""))
            ),
        }
    }

    pub fn resolve(&self, fixture: &Fixture) -> E2eResult<Expectation> {
        Ok(match self {
            Expectation::Attribute { name, value } => Expectation::Attribute {
                name: name.clone(),
                value: fixture.render(value)?,
            },
            Expectation::Text { value } => Expectation::Text {
                value: fixture.render(value)?,
            },
            other => other.clone(),
        })
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Visible => f.write_str("visible"),
            Expectation::Hidden => f.write_str("hidden"),
            Expectation::Enabled => f.write_str("enabled"),
            Expectation::Checked => f.write_str("checked"),
            Expectation::NotChecked => f.write_str("not checked"),
            Expectation::Attribute { name, value } => write!(f, "{}={:?}", name, value),
            Expectation::Class { name } => write!(f, "class containing {:?}", name),
            Expectation::Text { value } => write!(f, "text containing {:?}", value),
        }
    }
}

/// A locator paired with the state it must reach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub target: Locator,
    pub expect: Expectation,
}

impl Predicate {
    pub fn new(target: Locator, expect: Expectation) -> Self {
        Self { target, expect }
    }

    pub fn resolve(&self, fixture: &Fixture) -> E2eResult<Predicate> {
        Ok(Predicate {
            target: self.target.resolve(fixture)?,
            expect: self.expect.resolve(fixture)?,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.target, self.expect)
    }
}
