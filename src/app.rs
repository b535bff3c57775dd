use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::confirmation::Confirmation;
use crate::form::{Dispatch, FormEvent, FormRejected, FormState, ValidatedForm};
use crate::submission::{self, DurableSlot, SimulatedTransport, SubmissionRecord, SubmitError, SubmitPolicy};
use crate::theme::Theme;

/// Status line messages clear after this long
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

type PendingSubmission = JoinHandle<Result<SubmissionRecord, SubmitError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Confirmation,
}

pub struct App {
    pub view: View,
    pub show_help: bool,

    pub form: FormState,
    /// Index into the fields; `fields.len()` is the submit control
    pub focus: usize,

    pub confirmation: Option<Confirmation>,
    pub confirmation_opened: Option<Instant>,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub theme: Theme,
    pub submit_started: Option<Instant>,

    config: AppConfig,
    slot: DurableSlot,
    pending: Option<PendingSubmission>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let slot = match &config.slot_path {
            Some(path) => DurableSlot::at(path),
            None => DurableSlot::default_location()?,
        };

        if !slot.is_empty() {
            tracing::info!(
                "An unread submission is waiting in {} and will be replaced by the next one",
                slot.path().display()
            );
        }

        Ok(Self {
            view: View::Form,
            show_help: false,
            form: FormState::from_specs(&config.fields, &config.submit_label),
            focus: 0,
            confirmation: None,
            confirmation_opened: None,
            status_message: None,
            status_message_time: None,
            theme: Theme::from_config(&config.theme),
            submit_started: None,
            config,
            slot,
            pending: None,
        })
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn on_submit_control(&self) -> bool {
        self.focus >= self.form.fields.len()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::F(1) {
            self.show_help = !self.show_help;
            return Ok(());
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return Ok(());
        }

        match self.view {
            View::Form => self.handle_form_key(key),
            View::Confirmation => self.handle_confirmation_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        // Nothing is editable while the submit control is busy
        if self.form.submit.is_disabled() {
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
            KeyCode::Enter => {
                if self.on_submit_control() {
                    self.submit_form();
                } else {
                    self.move_focus(1);
                }
            }
            // '?' is ordinary text inside a field
            KeyCode::Char('?') if self.on_submit_control() => self.show_help = true,
            KeyCode::Char(c) if !ctrl => self.edit_focused(|value| value.push(c)),
            KeyCode::Backspace => self.edit_focused(|value| {
                value.pop();
            }),
            _ => {}
        }
        Ok(())
    }

    fn handle_confirmation_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.reset_form();
                self.set_status("Ready for a new message");
            }
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
        Ok(())
    }

    /// Apply an edit to the focused field's value and report it as input
    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(field) = self.form.fields.get(self.focus) else {
            return;
        };
        let mut value = field.value.clone();
        edit(&mut value);
        self.form.dispatch(FormEvent::Input { field: self.focus, value });
    }

    /// Move focus, treating the field being left as blurred
    fn move_focus(&mut self, delta: isize) {
        let stops = self.form.fields.len() + 1;
        self.blur_focused();
        self.focus = (self.focus as isize + delta).rem_euclid(stops as isize) as usize;
    }

    fn blur_focused(&mut self) {
        if !self.on_submit_control() {
            self.form.dispatch(FormEvent::Blur { field: self.focus });
        }
    }

    fn submit_form(&mut self) {
        match self.form.dispatch(FormEvent::SubmitIntent) {
            Dispatch::Accepted(form) => self.start_submission(form),
            Dispatch::Rejected(FormRejected::Invalid(count)) => {
                // Jump to the first field that needs fixing
                if let Some(first) = self.form.fields.iter().position(|f| f.has_error()) {
                    self.focus = first;
                }
                self.set_status(format!("{} field(s) need attention", count));
            }
            Dispatch::Rejected(FormRejected::Busy) | Dispatch::Ignored | Dispatch::Updated => {}
        }
    }

    fn start_submission(&mut self, form: ValidatedForm) {
        let transport = SimulatedTransport::new(Duration::from_millis(self.config.submission.latency_ms));
        let policy = SubmitPolicy::from(&self.config.submission);
        let slot = self.slot.clone();

        tracing::info!("Submitting form ({} fields)", form.values().len());
        self.submit_started = Some(Instant::now());
        self.pending = Some(tokio::spawn(async move {
            submission::submit(&transport, &policy, form, &slot).await
        }));
    }

    pub async fn tick(&mut self) -> Result<()> {
        let finished = self.pending.as_ref().is_some_and(|h| h.is_finished());
        if finished {
            if let Some(handle) = self.pending.take() {
                self.submit_started = None;
                match handle.await {
                    Ok(Ok(record)) => self.on_submitted(record)?,
                    Ok(Err(e)) => {
                        tracing::warn!("Submission failed: {}", e);
                        self.form.finish(Some(&e.to_string()));
                        self.focus = self.form.fields.len();
                    }
                    Err(e) => {
                        tracing::error!("Submission task died: {}", e);
                        self.form.finish(Some("internal error"));
                    }
                }
            }
        }

        // Clear status message after 3 seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        Ok(())
    }

    fn on_submitted(&mut self, record: SubmissionRecord) -> Result<()> {
        self.form.finish(None);

        // The confirmation view owns the slot now: read it and clear it
        let record = match self.slot.take() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::warn!("Slot was empty after submission, using in-memory record");
                record
            }
            Err(e) => {
                tracing::warn!("Could not read submission slot: {}", e);
                record
            }
        };

        self.confirmation = Some(Confirmation::from_record(&record));
        self.confirmation_opened = Some(Instant::now());
        self.view = View::Confirmation;

        if self.config.notifications {
            if let Err(e) = notify("formgate", "Your message has been sent") {
                tracing::warn!("Notification failed: {}", e);
            }
        }

        Ok(())
    }

    fn reset_form(&mut self) {
        self.form = FormState::from_specs(&self.config.fields, &self.config.submit_label);
        self.focus = 0;
        self.confirmation = None;
        self.confirmation_opened = None;
        self.view = View::Form;
    }
}

pub fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("mail-send")
        .show()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubmissionConfig;
    use crate::form::{FieldError, FORM_ERROR_MESSAGE};

    fn test_app(dir: &tempfile::TempDir) -> App {
        let config = AppConfig {
            slot_path: Some(dir.path().join("formSubmission.json")),
            submission: SubmissionConfig {
                latency_ms: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        App::new(config).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn fill(app: &mut App, name: &str, text: &str) {
        app.focus = app.form.fields.iter().position(|f| f.name == name).unwrap();
        type_text(app, text);
    }

    fn fill_required(app: &mut App) {
        fill(app, "firstName", "Ada");
        fill(app, "lastName", "Lovelace");
        fill(app, "email", "ada@example.com");
        fill(app, "subject", "Safari");
        fill(app, "message", "Hello there");
    }

    fn ctrl_s(app: &mut App) {
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)).unwrap();
    }

    #[test]
    fn test_leaving_field_validates_and_typing_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, 1);
        assert_eq!(app.form.fields[0].error, Some(FieldError::Required));

        press(&mut app, KeyCode::BackTab);
        type_text(&mut app, "A");
        assert!(app.form.fields[0].error.is_none());
        assert_eq!(app.form.fields[0].value, "A");

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.form.fields[0].value, "");
    }

    #[test]
    fn test_focus_wraps_through_submit_control() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        let stops = app.form.fields.len() + 1;

        press(&mut app, KeyCode::Up);
        assert!(app.on_submit_control());
        for _ in 0..stops {
            press(&mut app, KeyCode::Down);
        }
        assert!(app.on_submit_control());
    }

    #[tokio::test]
    async fn test_invalid_submit_shows_banner_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        fill_required(&mut app);
        fill(&mut app, "email", "@nope");

        ctrl_s(&mut app);
        app.tick().await.unwrap();

        assert_eq!(app.form.banner.as_deref(), Some(FORM_ERROR_MESSAGE));
        assert!(!app.is_submitting());
        assert_eq!(app.view, View::Form);
        assert_eq!(app.form.fields[app.focus].name, "email");
        assert!(!dir.path().join("formSubmission.json").exists());
    }

    #[tokio::test]
    async fn test_valid_submit_navigates_to_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        fill_required(&mut app);
        fill(&mut app, "phone", "+1 234 567 8901");

        ctrl_s(&mut app);
        assert!(app.is_submitting());
        assert_eq!(app.form.submit.label, "Sending...");

        // Typing is ignored while busy
        let before = app.form.fields[app.focus].value.clone();
        type_text(&mut app, "zz");
        assert_eq!(app.form.fields[app.focus].value, before);

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.view != View::Confirmation && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.tick().await.unwrap();
        }

        assert_eq!(app.view, View::Confirmation);
        let confirmation = app.confirmation.as_ref().unwrap();
        assert_eq!(confirmation.row("Contact"), Some("Ada Lovelace"));
        assert_eq!(confirmation.row("Phone"), Some("+1 234 567 8901"));
        assert_eq!(confirmation.row("Travel Dates"), None);
        // Slot is read then deleted by the confirmation view
        assert!(!dir.path().join("formSubmission.json").exists());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::Form);
        assert!(app.form.fields.iter().all(|f| f.value.is_empty()));
    }

    #[test]
    fn test_question_mark_is_text_inside_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir);
        type_text(&mut app, "?");
        assert!(!app.show_help);
        assert_eq!(app.form.fields[0].value, "?");

        press(&mut app, KeyCode::F(1));
        assert!(app.show_help);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
    }
}
