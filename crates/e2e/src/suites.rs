//! Built-in login and password-reset suites

use crate::locator::Locator;
use crate::predicate::Expectation;
use crate::scenario::{Scenario, Step, Suite};
use crate::site::{copy, LoginSite};

pub const LOGIN_SUITE: &str = "login";
pub const PASSWORD_RESET_SUITE: &str = "password-reset";

/// A syntactically valid password the site never accepts for `validUser`
const WRONG_PASSWORD: &str = "123456";

pub fn builtin(site: &LoginSite) -> Vec<Suite> {
    vec![login_suite(site), password_reset_suite(site)]
}

fn login_baseline(site: &LoginSite) -> Vec<Step> {
    vec![
        Step::navigate(site.login_path.clone()),
        Step::click(&site.consent_reject),
        Step::visible(&site.login_form),
    ]
}

pub fn login_suite(site: &LoginSite) -> Suite {
    let email_required = LoginSite::required_hint(&site.email_block);
    let password_required = LoginSite::required_hint(&site.password_block);
    let email_icon = LoginSite::status_icon(&site.email_block);

    let scenarios = vec![
        Scenario::new("login-form-elements")
            .describe("Login form shows its title, fields, hints and controls")
            .tag("ui")
            .steps([
                Step::visible(&site.login_title),
                Step::visible(&site.login_required_hint),
                Step::visible(&site.email_input),
                Step::has_attribute(&site.email_input, "placeholder", copy::EMAIL_LABEL),
                Step::visible(&site.password_input),
                Step::visible(&site.password_toggle),
                Step::visible(&site.forgot_password),
                Step::assert(&site.remember_me, Expectation::NotChecked),
                Step::visible(&site.remember_me_label),
                Step::enabled(&site.login_button),
            ]),
        Scenario::new("password-visibility-toggle")
            .describe("The eye button unmasks the password field")
            .tag("ui")
            .steps([
                Step::fill(&site.password_input, "${validUser.password}"),
                Step::has_attribute(&site.password_input, "type", "password"),
                Step::click(&site.password_toggle),
                Step::has_attribute(&site.password_input, "type", "text"),
            ]),
        Scenario::new("login-valid-credentials")
            .describe("Valid credentials with remember-me open the account page")
            .tag("auth")
            .tag("smoke")
            .steps([
                Step::fill(&site.email_input, "${validUser.email}"),
                Step::fill(&site.password_input, "${validUser.password}"),
                Step::visible(&email_icon),
                Step::check(&site.remember_me),
                Step::assert(&site.remember_me, Expectation::Checked),
                Step::submit(&site.login_button),
                Step::has_class(&site.grid, copy::ACCOUNT_CLASS),
                Step::visible(&site.greeting),
            ]),
        Scenario::new("login-wrong-password")
            .describe("Registered email with a wrong password is rejected")
            .tag("auth")
            .steps([
                Step::fill(&site.email_input, "${validUser.email}"),
                Step::fill(&site.password_input, WRONG_PASSWORD),
                Step::submit(&site.login_button),
                Step::visible(&site.credential_error),
                Step::visible(&site.login_form),
            ]),
        Scenario::new("login-missing-password")
            .describe("Submitting without a password flags the password field")
            .tag("validation")
            .steps([
                Step::fill(&site.email_input, "${validUser.email}"),
                Step::submit(&site.login_button),
                Step::visible(&site.form_error),
                Step::visible(&password_required),
                Step::has_class(&site.password_input, copy::ERROR_CLASS),
            ]),
        Scenario::new("login-empty-fields")
            .describe("Submitting an empty form flags both fields")
            .tag("validation")
            .steps([
                Step::submit(&site.login_button),
                Step::visible(&site.form_error),
                Step::visible(&email_icon),
                Step::visible(&email_required),
                Step::visible(&password_required),
                Step::has_class(&site.email_input, copy::ERROR_CLASS),
                Step::has_class(&site.password_input, copy::ERROR_CLASS),
                Step::visible(&site.login_form),
            ]),
        Scenario::new("login-unknown-account")
            .describe("An unregistered account is rejected")
            .tag("auth")
            .steps([
                Step::fill(&site.email_input, "${invalidUser.email}"),
                Step::fill(&site.password_input, "${invalidUser.password}"),
                Step::submit(&site.login_button),
                Step::visible(&site.credential_error),
                Step::visible(&site.login_form),
            ]),
        Scenario::new("login-malformed-email-on-blur")
            .describe("A malformed email is flagged as soon as the field loses focus")
            .tag("validation")
            .steps([
                Step::fill(&site.email_input, "abcd"),
                Step::blur(&site.email_input),
                Step::visible(&LoginSite::invalid_email_hint(&site.email_block)),
                Step::visible(&email_icon),
                Step::has_class(&site.email_input, copy::ERROR_CLASS),
                Step::hidden(&site.form_error),
            ]),
    ];

    Suite {
        name: LOGIN_SUITE.to_string(),
        description: "Login form".to_string(),
        baseline: login_baseline(site),
        scenarios,
    }
}

/// State after the confirmation was closed, whichever control closed it
fn closed_state(site: &LoginSite) -> Vec<Step> {
    vec![
        Step::hidden(&site.sent_title),
        Step::hidden(&site.reset_email_input),
        Step::hidden(&site.modal_close),
    ]
}

pub fn password_reset_suite(site: &LoginSite) -> Suite {
    let mut baseline = login_baseline(site);
    baseline.push(Step::click(&site.forgot_password));
    baseline.push(Step::visible(&site.reset_email_input));

    let reset_icon = LoginSite::status_icon(&site.reset_email_block);
    let dialog_text = |text: &str| Locator::text(text).within(&site.sent_dialog);

    let scenarios = vec![
        Scenario::new("reset-form-elements")
            .describe("Reset dialog shows its title, explanation, field and buttons")
            .tag("ui")
            .steps([
                Step::visible(&site.reset_title),
                Step::visible(&site.reset_explanation),
                Step::visible(&site.modal_close),
                Step::visible(&site.reset_required_hint),
                Step::visible(&site.reset_email_input),
                Step::has_attribute(&site.reset_email_input, "placeholder", copy::EMAIL_LABEL),
                Step::enabled(&site.reset_submit),
                Step::enabled(&site.close_button),
            ]),
        Scenario::new("reset-valid-email")
            .describe("A registered email gets the confirmation, closed with the button")
            .tag("reset")
            .tag("smoke")
            .steps([
                Step::fill(&site.reset_email_input, "${validUser.email}"),
                Step::visible(&reset_icon),
                Step::submit(&site.reset_submit),
                Step::visible(&site.sent_title),
                Step::has_text(&site.sent_dialog, "${validUser.email}"),
                Step::click(&site.close_button),
            ])
            .steps(closed_state(site)),
        Scenario::new("reset-close-icon-valid-email")
            .describe("The confirmation for a registered email also closes with the header icon")
            .tag("reset")
            .steps([
                Step::fill(&site.reset_email_input, "${validUser.email}"),
                Step::submit(&site.reset_submit),
                Step::visible(&site.sent_title),
                Step::click(&site.modal_close),
            ])
            .steps(closed_state(site)),
        Scenario::new("reset-empty-email")
            .describe("Submitting without an email flags the field")
            .tag("validation")
            .steps([
                Step::submit(&site.reset_submit),
                Step::visible(&LoginSite::required_hint(&site.reset_email_block)),
                Step::visible(&reset_icon),
                Step::has_class(&site.reset_email_input, copy::ERROR_CLASS),
            ]),
        Scenario::new("reset-unknown-email")
            .describe("An unregistered email gets the same confirmation, closed with the header icon")
            .tag("reset")
            .steps([
                Step::fill(&site.reset_email_input, "${invalidUser.email}"),
                Step::submit(&site.reset_submit),
                Step::visible(&site.sent_title),
                Step::has_text(&site.sent_dialog, "${invalidUser.email}"),
                Step::click(&site.modal_close),
            ])
            .steps(closed_state(site)),
        Scenario::new("reset-malformed-email-on-blur")
            .describe("A malformed email is flagged as soon as the field loses focus")
            .tag("validation")
            .steps([
                Step::fill(&site.reset_email_input, "abcde"),
                Step::blur(&site.reset_email_input),
                Step::visible(&LoginSite::invalid_email_hint(&site.reset_email_block)),
                Step::visible(&reset_icon),
                Step::has_class(&site.reset_email_input, copy::ERROR_CLASS),
                Step::hidden(&site.sent_title),
            ]),
        Scenario::new("reset-malformed-email-on-submit")
            .describe("Submitting a malformed email keeps the format error and sends nothing")
            .tag("validation")
            .steps([
                Step::fill(&site.reset_email_input, "abcde"),
                Step::submit(&site.reset_submit),
                Step::visible(&LoginSite::invalid_email_hint(&site.reset_email_block)),
                Step::has_class(&site.reset_email_input, copy::ERROR_CLASS),
                Step::hidden(&site.sent_title),
            ]),
        Scenario::new("reset-sent-dialog-elements")
            .describe("Confirmation dialog shows icon, title, texts and the submitted email")
            .tag("ui")
            .steps([
                Step::fill(&site.reset_email_input, "${validUser.email}"),
                Step::submit(&site.reset_submit),
                Step::visible(&site.sent_icon),
                Step::visible(&site.sent_title),
                Step::visible(&dialog_text(copy::SENT_THANKS)),
                Step::visible(&dialog_text("${validUser.email}")),
                Step::visible(&dialog_text(copy::SENT_INSTRUCTIONS)),
                Step::visible(&dialog_text(copy::SENT_NOTICE)),
                Step::enabled(&site.close_button),
            ]),
    ];

    Suite {
        name: PASSWORD_RESET_SUITE.to_string(),
        description: "Password reset dialog".to_string(),
        baseline,
        scenarios,
    }
}
