//! Element locators
//!
//! A [`Locator`] describes how to find an element the way Playwright does:
//! a selector (role, test id, placeholder, text or CSS), optionally scoped
//! to a container and narrowed with `has`/`has_text` filters. Locators are
//! plain data so they can be written in YAML suites, sent to the driver
//! process as JSON and compared in tests.
//!
//! Repeated elements such as the "* Pflichtfeld" hint are addressed through
//! the field block that contains them ([`Locator::field_block`]) instead of
//! by their position on the page.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::E2eResult;
use crate::fixture::Fixture;

/// How an element is selected inside its scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector, e.g. `#loginForm` or `input[type="email"]`
    Css { value: String },

    /// `data-testid` attribute
    TestId { value: String },

    /// ARIA role with an optional accessible name
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        exact: bool,
    },

    /// Input placeholder
    Placeholder { value: String },

    /// Visible text (substring unless `exact`)
    Text {
        value: String,
        #[serde(default)]
        exact: bool,
    },
}

/// Which match to keep when a locator resolves to several elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub selector: Selector,

    /// Container the selector is evaluated in (page when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<Box<Locator>>,

    /// Keep only matches that contain this element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<Box<Locator>>,

    /// Keep only matches whose text contains this string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<Pick>,
}

impl Locator {
    fn new(selector: Selector) -> Self {
        Self {
            selector,
            within: None,
            has: None,
            has_text: None,
            pick: None,
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Selector::Css { value: value.into() })
    }

    pub fn test_id(value: impl Into<String>) -> Self {
        Self::new(Selector::TestId { value: value.into() })
    }

    pub fn role(role: impl Into<String>) -> Self {
        Self::new(Selector::Role {
            role: role.into(),
            name: None,
            exact: false,
        })
    }

    /// Role with an accessible name, matched as a substring
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Selector::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        })
    }

    pub fn placeholder(value: impl Into<String>) -> Self {
        Self::new(Selector::Placeholder { value: value.into() })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Selector::Text {
            value: value.into(),
            exact: false,
        })
    }

    pub fn text_exact(value: impl Into<String>) -> Self {
        Self::new(Selector::Text {
            value: value.into(),
            exact: true,
        })
    }

    /// Evaluate this locator inside `container`
    pub fn within(mut self, container: &Locator) -> Self {
        self.within = Some(Box::new(container.clone()));
        self
    }

    pub fn has(mut self, inner: Locator) -> Self {
        self.has = Some(Box::new(inner));
        self
    }

    pub fn has_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    pub fn first(mut self) -> Self {
        self.pick = Some(Pick::First);
        self
    }

    pub fn last(mut self) -> Self {
        self.pick = Some(Pick::Last);
        self
    }

    /// The same selector without its container
    pub fn unscoped(&self) -> Locator {
        Locator {
            within: None,
            ..self.clone()
        }
    }

    /// Innermost `div` that holds this input together with its label
    ///
    /// Field level hints, error messages and status icons are rendered
    /// inside this block, so predicates scoped to it stay attached to the
    /// right field no matter how many similar hints the page shows.
    pub fn field_block(&self, label: &str) -> Locator {
        Locator {
            selector: Selector::Css { value: "div".into() },
            within: self.within.clone(),
            has: Some(Box::new(self.unscoped())),
            has_text: Some(label.to_string()),
            pick: Some(Pick::Last),
        }
    }

    /// Render fixture placeholders in every text the locator matches on
    pub fn resolve(&self, fixture: &Fixture) -> E2eResult<Locator> {
        let selector = match &self.selector {
            Selector::Css { value } => Selector::Css { value: value.clone() },
            Selector::TestId { value } => Selector::TestId { value: value.clone() },
            Selector::Role { role, name, exact } => Selector::Role {
                role: role.clone(),
                name: name.as_deref().map(|n| fixture.render(n)).transpose()?,
                exact: *exact,
            },
            Selector::Placeholder { value } => Selector::Placeholder {
                value: fixture.render(value)?,
            },
            Selector::Text { value, exact } => Selector::Text {
                value: fixture.render(value)?,
                exact: *exact,
            },
        };

        Ok(Locator {
            selector,
            within: match &self.within {
                Some(scope) => Some(Box::new(scope.resolve(fixture)?)),
                None => None,
            },
            has: match &self.has {
                Some(inner) => Some(Box::new(inner.resolve(fixture)?)),
                None => None,
            },
            has_text: self.has_text.as_deref().map(|t| fixture.render(t)).transpose()?,
            pick: self.pick,
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.within {
            write!(f, "{}.", scope)?;
        }

        match &self.selector {
            Selector::Css { value } => write!(f, "locator({:?})", value)?,
            Selector::TestId { value } => write!(f, "getByTestId({:?})", value)?,
            Selector::Role { role, name: Some(name), exact } => {
                if *exact {
                    write!(f, "getByRole({:?}, {{ name: {:?}, exact: true }})", role, name)?
                } else {
                    write!(f, "getByRole({:?}, {{ name: {:?} }})", role, name)?
                }
            }
            Selector::Role { role, name: None, .. } => write!(f, "getByRole({:?})", role)?,
            Selector::Placeholder { value } => write!(f, "getByPlaceholder({:?})", value)?,
            Selector::Text { value, exact: true } => {
                write!(f, "getByText({:?}, {{ exact: true }})", value)?
            }
            Selector::Text { value, exact: false } => write!(f, "getByText({:?})", value)?,
        }

        match (&self.has, &self.has_text) {
            (Some(inner), Some(text)) => {
                write!(f, ".filter({{ has: {}, hasText: {:?} }})", inner, text)?
            }
            (Some(inner), None) => write!(f, ".filter({{ has: {} }})", inner)?,
            (None, Some(text)) => write!(f, ".filter({{ hasText: {:?} }})", text)?,
            (None, None) => {}
        }

        match self.pick {
            Some(Pick::First) => f.write_str(".first()"),
            Some(Pick::Last) => f.write_str(".last()"),
            None => Ok(()),
        }
    }
}
