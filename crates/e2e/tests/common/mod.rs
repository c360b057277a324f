//! In-memory login site used by the integration tests
//!
//! Models the login page and the password-reset dialog as a small state
//! machine. Locators are recognised by equality with the ones in
//! [`LoginSite`], so the built-in suites run unchanged against it.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use loginflow_e2e::fixture::is_email_shaped;
use loginflow_e2e::locator::Selector;
use loginflow_e2e::runner::RunnerConfig;
use loginflow_e2e::site::copy;
use loginflow_e2e::{E2eError, E2eResult, ElementState, Fixture, Locator, LoginSite, Page, PageFactory};

pub const BASE_URL: &str = "https://shop.test";

pub fn fixture() -> Fixture {
    Fixture::from_json(
        r#"{
            "validUser": { "email": "anna.schmidt@example.de", "password": "S3cret!pw", "name": "Anna" },
            "invalidUser": { "email": "nobody@example.de", "password": "whatever1" }
        }"#,
    )
    .unwrap()
}

pub fn runner_config(workers: usize) -> RunnerConfig {
    RunnerConfig {
        base_url: BASE_URL.to_string(),
        timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(10),
        workers,
    }
}

/// Knobs for breaking the site on purpose
#[derive(Debug, Clone)]
pub struct Behavior {
    pub reachable: bool,
    pub login_button_enabled: bool,
    pub accepts_valid_user: bool,
    /// When false the close button drops the confirmation but leaves the
    /// reset form open
    pub close_button_closes_dialog: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            reachable: true,
            login_button_enabled: true,
            accepts_valid_user: true,
            close_button_closes_dialog: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    ResetEmail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    ConsentReject,
    Grid,
    LoginForm,
    LoginTitle,
    LoginRequiredHint,
    Input(Field),
    PasswordToggle,
    ForgotPassword,
    RememberMe,
    RememberMeLabel,
    LoginButton,
    Greeting,
    CredentialError,
    FormError,
    RequiredHint(Field),
    InvalidHint(Field),
    StatusIcon(Field),
    ResetTitle,
    ResetExplanation,
    ResetRequiredHint,
    ResetSubmit,
    ModalClose,
    CloseButton,
    SentDialog,
    SentTitle,
    SentIcon,
    DialogText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Status {
    #[default]
    Untouched,
    Valid,
    Required,
    Invalid,
}

struct Shared {
    site: LoginSite,
    fixture: Fixture,
    behavior: Behavior,
    elements: Vec<(Locator, Element)>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    opened: AtomicUsize,
    sessions: Mutex<Vec<Vec<String>>>,
}

impl Shared {
    fn identify(&self, locator: &Locator) -> Option<Element> {
        if let Some((_, element)) = self.elements.iter().find(|(l, _)| l == locator) {
            return Some(element.clone());
        }
        if locator.within.as_deref() == Some(&self.site.sent_dialog) {
            if let Selector::Text { value, .. } = &locator.selector {
                return Some(Element::DialogText(value.clone()));
            }
        }
        None
    }
}

/// Page factory handing out fresh in-memory pages
#[derive(Clone)]
pub struct FakeSite {
    shared: Arc<Shared>,
}

impl FakeSite {
    pub fn new(behavior: Behavior) -> Self {
        let site = LoginSite::default();
        let fixture = fixture();
        let resolve = |l: &Locator| l.resolve(&fixture).unwrap();

        let mut elements = vec![
            (site.consent_reject.clone(), Element::ConsentReject),
            (site.grid.clone(), Element::Grid),
            (site.login_form.clone(), Element::LoginForm),
            (site.login_title.clone(), Element::LoginTitle),
            (site.login_required_hint.clone(), Element::LoginRequiredHint),
            (site.email_input.clone(), Element::Input(Field::Email)),
            (site.password_input.clone(), Element::Input(Field::Password)),
            (site.password_toggle.clone(), Element::PasswordToggle),
            (site.forgot_password.clone(), Element::ForgotPassword),
            (site.remember_me.clone(), Element::RememberMe),
            (site.remember_me_label.clone(), Element::RememberMeLabel),
            (site.login_button.clone(), Element::LoginButton),
            (resolve(&site.greeting), Element::Greeting),
            (site.credential_error.clone(), Element::CredentialError),
            (site.form_error.clone(), Element::FormError),
            (site.reset_title.clone(), Element::ResetTitle),
            (site.reset_explanation.clone(), Element::ResetExplanation),
            (site.reset_required_hint.clone(), Element::ResetRequiredHint),
            (site.reset_email_input.clone(), Element::Input(Field::ResetEmail)),
            (site.reset_submit.clone(), Element::ResetSubmit),
            (site.modal_close.clone(), Element::ModalClose),
            (site.close_button.clone(), Element::CloseButton),
            (site.sent_dialog.clone(), Element::SentDialog),
            (site.sent_title.clone(), Element::SentTitle),
            (site.sent_icon.clone(), Element::SentIcon),
        ];
        for (field, block) in [
            (Field::Email, &site.email_block),
            (Field::Password, &site.password_block),
            (Field::ResetEmail, &site.reset_email_block),
        ] {
            elements.push((LoginSite::required_hint(block), Element::RequiredHint(field)));
            elements.push((LoginSite::invalid_email_hint(block), Element::InvalidHint(field)));
            elements.push((LoginSite::status_icon(block), Element::StatusIcon(field)));
        }

        Self {
            shared: Arc::new(Shared {
                site,
                fixture,
                behavior,
                elements,
                open: AtomicUsize::new(0),
                max_open: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
                sessions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Pages opened so far
    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Pages currently open
    pub fn open(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Highest number of pages open at the same time
    pub fn max_open(&self) -> usize {
        self.shared.max_open.load(Ordering::SeqCst)
    }

    /// Operation log of every closed page
    pub fn sessions(&self) -> Vec<Vec<String>> {
        self.shared.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFactory for FakeSite {
    async fn new_page(&self) -> E2eResult<Box<dyn Page>> {
        let now_open = self.shared.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_open.fetch_max(now_open, Ordering::SeqCst);
        self.shared.opened.fetch_add(1, Ordering::SeqCst);

        // Browser contexts take a moment to start
        tokio::time::sleep(Duration::from_millis(5)).await;

        Ok(Box::new(FakePage {
            shared: self.shared.clone(),
            state: PageState::default(),
            log: Vec::new(),
            closed: false,
        }))
    }
}

#[derive(Debug, Default)]
struct PageState {
    loaded: bool,
    consent_open: bool,
    account: bool,
    email: String,
    password: String,
    reset_email: String,
    status: [Status; 3],
    focused: Option<Field>,
    password_shown: bool,
    remember: bool,
    credential_error: bool,
    form_error: bool,
    reset_open: bool,
    sent_to: Option<String>,
}

fn slot(field: Field) -> usize {
    match field {
        Field::Email => 0,
        Field::Password => 1,
        Field::ResetEmail => 2,
    }
}

impl PageState {
    fn status(&self, field: Field) -> Status {
        self.status[slot(field)]
    }

    fn set_status(&mut self, field: Field, status: Status) {
        self.status[slot(field)] = status;
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::ResetEmail => &self.reset_email,
        }
    }

    fn login_view(&self) -> bool {
        self.loaded && !self.account
    }

    fn reset_form_view(&self) -> bool {
        self.loaded && self.reset_open && self.sent_to.is_none()
    }

    fn sent_view(&self) -> bool {
        self.loaded && self.reset_open && self.sent_to.is_some()
    }

    fn field_shown(&self, field: Field) -> bool {
        match field {
            Field::Email | Field::Password => self.login_view(),
            Field::ResetEmail => self.reset_form_view(),
        }
    }

    fn dialog_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            copy::SENT_TITLE,
            copy::SENT_THANKS,
            self.sent_to.as_deref().unwrap_or(""),
            copy::SENT_INSTRUCTIONS,
            copy::SENT_NOTICE
        )
    }

    /// Format check run when an email field loses focus
    fn validate_on_blur(&mut self, field: Field) {
        if field == Field::Password || self.value(field).is_empty() {
            return;
        }
        let status = if is_email_shaped(self.value(field)) {
            Status::Valid
        } else {
            Status::Invalid
        };
        self.set_status(field, status);
    }

    fn validate_on_submit(&mut self, field: Field) -> bool {
        let value = self.value(field);
        let status = if value.is_empty() {
            Status::Required
        } else if field != Field::Password && !is_email_shaped(value) {
            Status::Invalid
        } else {
            Status::Valid
        };
        self.set_status(field, status);
        status == Status::Valid
    }

    fn blur_focused(&mut self) {
        if let Some(field) = self.focused.take() {
            self.validate_on_blur(field);
        }
    }
}

fn shown(visible: bool) -> ElementState {
    if visible {
        ElementState {
            count: 1,
            visible: true,
            enabled: true,
            ..Default::default()
        }
    } else {
        ElementState::absent()
    }
}

pub struct FakePage {
    shared: Arc<Shared>,
    state: PageState,
    log: Vec<String>,
    closed: bool,
}

impl FakePage {
    fn element(&self, locator: &Locator) -> E2eResult<Element> {
        self.shared
            .identify(locator)
            .ok_or_else(|| E2eError::Driver(format!("no element for {}", locator)))
    }

    fn snapshot(&self, element: &Element, attribute: Option<&str>) -> ElementState {
        let s = &self.state;
        let error_class = |field: Field| {
            let mut class = "input__input".to_string();
            if matches!(s.status(field), Status::Required | Status::Invalid) {
                class.push(' ');
                class.push_str(copy::ERROR_CLASS);
            }
            class
        };

        match element {
            Element::ConsentReject => shown(s.loaded && s.consent_open),
            Element::Grid => ElementState {
                class: Some(if s.account {
                    format!("grid {}", copy::ACCOUNT_CLASS)
                } else {
                    "grid".to_string()
                }),
                ..shown(s.loaded)
            },
            Element::LoginForm
            | Element::LoginTitle
            | Element::LoginRequiredHint
            | Element::PasswordToggle
            | Element::ForgotPassword
            | Element::RememberMeLabel => shown(s.login_view()),
            Element::Input(field) => {
                let attribute = attribute.map(|name| match (name, field) {
                    ("placeholder", Field::Password) => copy::PASSWORD_LABEL.to_string(),
                    ("placeholder", _) => copy::EMAIL_LABEL.to_string(),
                    ("type", Field::Password) if s.password_shown => "text".to_string(),
                    ("type", Field::Password) => "password".to_string(),
                    ("type", _) => "email".to_string(),
                    _ => String::new(),
                });
                ElementState {
                    class: Some(error_class(*field)),
                    text: Some(s.value(*field).to_string()),
                    attribute,
                    ..shown(s.field_shown(*field))
                }
            }
            Element::RememberMe => ElementState {
                checked: Some(s.remember),
                ..shown(s.login_view())
            },
            Element::LoginButton => ElementState {
                enabled: self.shared.behavior.login_button_enabled,
                ..shown(s.login_view())
            },
            Element::Greeting => shown(s.loaded && s.account),
            Element::CredentialError => shown(s.login_view() && s.credential_error),
            Element::FormError => shown(s.login_view() && s.form_error),
            Element::RequiredHint(field) => {
                shown(s.field_shown(*field) && s.status(*field) == Status::Required)
            }
            Element::InvalidHint(field) => {
                shown(s.field_shown(*field) && s.status(*field) == Status::Invalid)
            }
            Element::StatusIcon(field) => {
                shown(s.field_shown(*field) && s.status(*field) != Status::Untouched)
            }
            Element::ResetTitle
            | Element::ResetExplanation
            | Element::ResetRequiredHint
            | Element::ResetSubmit => shown(s.reset_form_view()),
            Element::ModalClose | Element::CloseButton => shown(s.loaded && s.reset_open),
            Element::SentDialog => ElementState {
                text: Some(s.dialog_text()),
                ..shown(s.sent_view())
            },
            Element::SentTitle | Element::SentIcon => shown(s.sent_view()),
            Element::DialogText(value) => shown(s.sent_view() && s.dialog_text().contains(value.as_str())),
        }
    }

    fn submit_login(&mut self) {
        let email_ok = self.state.validate_on_submit(Field::Email);
        let password_ok = self.state.validate_on_submit(Field::Password);
        if !(email_ok && password_ok) {
            self.state.form_error = true;
            self.state.credential_error = false;
            return;
        }

        let valid = &self.shared.fixture.valid_user;
        self.state.form_error = false;
        if self.shared.behavior.accepts_valid_user
            && self.state.email == valid.email
            && self.state.password == valid.password
        {
            self.state.account = true;
        } else {
            self.state.credential_error = true;
        }
    }

    fn submit_reset(&mut self) {
        if self.state.validate_on_submit(Field::ResetEmail) {
            // Registered or not, the site answers the same way
            self.state.sent_to = Some(self.state.reset_email.clone());
        }
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.log.push(format!("goto {}", url));
        if !self.shared.behavior.reachable {
            return Err(E2eError::NavigationFailure {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.state = PageState {
            loaded: true,
            consent_open: true,
            ..Default::default()
        };
        Ok(())
    }

    async fn probe(&mut self, locator: &Locator, attribute: Option<&str>) -> E2eResult<ElementState> {
        Ok(match self.shared.identify(locator) {
            Some(element) => self.snapshot(&element, attribute),
            None => ElementState::absent(),
        })
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> E2eResult<()> {
        let field = match self.element(locator)? {
            Element::Input(field) => field,
            other => return Err(E2eError::Driver(format!("{:?} is not fillable", other))),
        };
        self.log.push(format!("fill {:?}", field));

        if self.state.focused != Some(field) {
            self.state.blur_focused();
        }
        self.state.focused = Some(field);
        match field {
            Field::Email => self.state.email = value.to_string(),
            Field::Password => self.state.password = value.to_string(),
            Field::ResetEmail => self.state.reset_email = value.to_string(),
        }

        // Typing a well-formed address clears the error and shows the check mark
        if field != Field::Password && is_email_shaped(value) {
            self.state.set_status(field, Status::Valid);
        } else if field == Field::Password && !value.is_empty() {
            self.state.set_status(field, Status::Valid);
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        let element = self.element(locator)?;
        self.log.push(format!("click {:?}", element));
        self.state.blur_focused();

        match element {
            Element::ConsentReject => self.state.consent_open = false,
            Element::PasswordToggle => self.state.password_shown = !self.state.password_shown,
            Element::ForgotPassword => {
                self.state.reset_open = true;
                self.state.reset_email.clear();
                self.state.set_status(Field::ResetEmail, Status::Untouched);
                self.state.sent_to = None;
            }
            Element::RememberMe => self.state.remember = !self.state.remember,
            Element::LoginButton => self.submit_login(),
            Element::ResetSubmit => self.submit_reset(),
            Element::CloseButton if !self.shared.behavior.close_button_closes_dialog => {
                self.state.sent_to = None;
            }
            Element::ModalClose | Element::CloseButton => {
                self.state.reset_open = false;
                self.state.sent_to = None;
            }
            other => return Err(E2eError::Driver(format!("{:?} is not clickable", other))),
        }
        Ok(())
    }

    async fn set_checked(&mut self, locator: &Locator, checked: bool) -> E2eResult<()> {
        match self.element(locator)? {
            Element::RememberMe => {
                self.log.push(format!("set_checked RememberMe {}", checked));
                self.state.remember = checked;
                Ok(())
            }
            other => Err(E2eError::Driver(format!("{:?} is not a checkbox", other))),
        }
    }

    async fn focus(&mut self, locator: &Locator) -> E2eResult<()> {
        if let Element::Input(field) = self.element(locator)? {
            self.state.blur_focused();
            self.state.focused = Some(field);
        }
        Ok(())
    }

    async fn blur(&mut self, locator: &Locator) -> E2eResult<()> {
        if let Element::Input(field) = self.element(locator)? {
            self.log.push(format!("blur {:?}", field));
            self.state.validate_on_blur(field);
            if self.state.focused == Some(field) {
                self.state.focused = None;
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if !self.closed {
            self.closed = true;
            self.shared.open.fetch_sub(1, Ordering::SeqCst);
            self.shared
                .sessions
                .lock()
                .unwrap()
                .push(std::mem::take(&mut self.log));
        }
        Ok(())
    }
}
