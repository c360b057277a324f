//! Locators and copy of the login page and the password-reset dialog

use crate::locator::Locator;

/// User facing strings asserted on by the built-in suites
pub mod copy {
    pub const CONSENT_REJECT: &str = "Nur Unbedingt Erforderlich";
    pub const LOGIN_TITLE: &str = "Ich bin bereits Douglas-Kund*in";
    pub const REQUIRED_HINT: &str = "* Pflichtfeld";
    pub const EMAIL_LABEL: &str = "E-Mail-Adresse*";
    pub const PASSWORD_LABEL: &str = "Passwort*";
    pub const FORGOT_PASSWORD: &str = "Passwort vergessen?";
    pub const REMEMBER_ME: &str = "Eingeloggt bleiben";
    pub const LOGIN_BUTTON: &str = "Anmelden";
    pub const GREETING: &str = "Hallo ${validUser.name}";
    pub const CREDENTIAL_ERROR: &str = "Falsche Zugangsdaten";
    pub const FORM_ERROR: &str = "Bitte überprüfe deine Angaben";
    pub const INVALID_EMAIL: &str = "Ungültige E-Mail-Adresse";

    pub const RESET_TITLE: &str = "Du hast dein Passwort vergessen?";
    pub const RESET_EXPLANATION: &str =
        "Bitte gib hier die E-Mail-Adresse ein, mit der du dein Douglas-Konto erstellt ha";
    pub const RESET_SUBMIT: &str = "E-Mail absenden";
    pub const CLOSE: &str = "Schliessen";

    pub const SENT_TITLE: &str = "E-Mail verschickt";
    pub const SENT_THANKS: &str =
        "Vielen Dank für die Anforderung eines neuen Passworts! Wir haben dir an folgende";
    pub const SENT_INSTRUCTIONS: &str =
        "Bitte klicke auf den Link und lege innerhalb der nächsten 24 Stunden dein Passwo";
    pub const SENT_NOTICE: &str =
        "Bitte beachte: Wenn du mit der oben genannten E-Mail-Adresse noch kein Konto bei";

    /// Class of an input rendered in its error state (red border)
    pub const ERROR_CLASS: &str = "input__input--error";
    /// Class of the page grid once the account view is shown
    pub const ACCOUNT_CLASS: &str = "account-page";
}

/// Every element the built-in suites interact with or assert on
#[derive(Debug, Clone)]
pub struct LoginSite {
    pub login_path: String,

    pub consent_reject: Locator,
    pub grid: Locator,
    pub login_form: Locator,
    pub login_title: Locator,
    pub login_required_hint: Locator,
    pub email_input: Locator,
    pub email_block: Locator,
    pub password_input: Locator,
    pub password_block: Locator,
    pub password_toggle: Locator,
    pub forgot_password: Locator,
    pub remember_me: Locator,
    pub remember_me_label: Locator,
    pub login_button: Locator,
    pub greeting: Locator,
    pub credential_error: Locator,
    pub form_error: Locator,

    pub reset_form: Locator,
    pub reset_title: Locator,
    pub reset_explanation: Locator,
    pub reset_required_hint: Locator,
    pub reset_email_input: Locator,
    pub reset_email_block: Locator,
    pub reset_submit: Locator,
    pub modal_close: Locator,
    pub close_button: Locator,

    pub sent_dialog: Locator,
    pub sent_title: Locator,
    pub sent_icon: Locator,
}

impl LoginSite {
    pub fn new(login_path: impl Into<String>) -> Self {
        use copy::*;

        let grid = Locator::test_id("grid");
        let login_form = Locator::css("#loginForm");
        let email_input = Locator::css(r#"input[type="email"]"#).within(&grid);
        let password_input = Locator::placeholder(PASSWORD_LABEL).within(&login_form);
        let password_block = password_input.field_block(PASSWORD_LABEL);

        let reset_form = Locator::css("#forgotPasswordForm");
        let reset_email_input = Locator::role_named("textbox", EMAIL_LABEL).within(&reset_form);

        let modal_close = Locator::test_id("modal-header-close");
        let sent_title = Locator::role_named("heading", SENT_TITLE);
        // Innermost block holding both the header close icon and the closing
        // notice, i.e. the whole confirmation modal
        let sent_dialog = Locator::css("div")
            .has(modal_close.clone())
            .has_text(SENT_NOTICE)
            .last();

        Self {
            login_path: login_path.into(),

            consent_reject: Locator::role_named("button", CONSENT_REJECT),
            login_title: Locator::text(LOGIN_TITLE),
            login_required_hint: Locator::text(REQUIRED_HINT).within(&login_form).first(),
            email_block: email_input.field_block(EMAIL_LABEL),
            password_toggle: Locator::role("button").within(&password_block),
            password_block,
            forgot_password: Locator::text(FORGOT_PASSWORD),
            remember_me: Locator::test_id("checkbox-remember-me"),
            remember_me_label: Locator::text(REMEMBER_ME),
            login_button: Locator::role_named("button", LOGIN_BUTTON).within(&grid),
            greeting: Locator::role_named("heading", GREETING),
            credential_error: Locator::text(CREDENTIAL_ERROR),
            form_error: Locator::text(FORM_ERROR),

            reset_title: Locator::text(RESET_TITLE),
            reset_explanation: Locator::text(RESET_EXPLANATION),
            reset_required_hint: Locator::text(REQUIRED_HINT).within(&reset_form).first(),
            reset_email_block: reset_email_input.field_block(EMAIL_LABEL),
            reset_submit: Locator::role_named("button", RESET_SUBMIT),
            close_button: Locator::role_named("button", CLOSE),

            sent_icon: Locator::role("img").within(&sent_dialog).first(),
            sent_dialog,
            sent_title,

            grid,
            login_form,
            email_input,
            password_input,
            reset_form,
            reset_email_input,
            modal_close,
        }
    }

    /// Field level "* Pflichtfeld" hint of the block
    pub fn required_hint(block: &Locator) -> Locator {
        Locator::text(copy::REQUIRED_HINT).within(block)
    }

    /// Field level format error of the block
    pub fn invalid_email_hint(block: &Locator) -> Locator {
        Locator::text(copy::INVALID_EMAIL).within(block)
    }

    /// Status icon ("!" or check mark) rendered inside the block
    pub fn status_icon(block: &Locator) -> Locator {
        Locator::role("img").within(block)
    }
}

impl Default for LoginSite {
    fn default() -> Self {
        Self::new("/login")
    }
}
