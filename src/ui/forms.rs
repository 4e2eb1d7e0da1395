use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::{Field, ValidationErrors};
use crate::form::RecordDraft;
use crate::models::{KindConfig, Record, RecordId};
use crate::session::LoginForm;

/// Fields available within the record form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum RecordField {
    #[default]
    FirstName,
    LastName,
    Category,
}

impl RecordField {
    /// Cycle focus forward through the three fields.
    pub(crate) fn next(self) -> Self {
        match self {
            RecordField::FirstName => RecordField::LastName,
            RecordField::LastName => RecordField::Category,
            RecordField::Category => RecordField::FirstName,
        }
    }

    pub(crate) fn previous(self) -> Self {
        match self {
            RecordField::FirstName => RecordField::Category,
            RecordField::LastName => RecordField::FirstName,
            RecordField::Category => RecordField::LastName,
        }
    }

    pub(crate) fn error_key(self) -> Field {
        match self {
            RecordField::FirstName => Field::FirstName,
            RecordField::LastName => Field::LastName,
            RecordField::Category => Field::Category,
        }
    }

    /// Row offset of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        match self {
            RecordField::FirstName => 0,
            RecordField::LastName => 1,
            RecordField::Category => 2,
        }
    }
}

/// Append a character to the active text field. The category behaves like a
/// select box and ignores typed characters.
pub(crate) fn push_char(draft: &mut RecordDraft, field: RecordField, ch: char) -> bool {
    if ch.is_control() {
        return false;
    }
    match field {
        RecordField::FirstName => draft.first_name.push(ch),
        RecordField::LastName => draft.last_name.push(ch),
        RecordField::Category => return false,
    }
    true
}

pub(crate) fn backspace(draft: &mut RecordDraft, field: RecordField) {
    match field {
        RecordField::FirstName => {
            draft.first_name.pop();
        }
        RecordField::LastName => {
            draft.last_name.pop();
        }
        RecordField::Category => draft.category.clear(),
    }
}

/// Step the category selection through the configured values.
pub(crate) fn cycle_category(draft: &mut RecordDraft, config: &KindConfig, forward: bool) {
    let values = &config.categories;
    if values.is_empty() {
        return;
    }
    let current = values.iter().position(|value| *value == draft.category);
    let next = match (current, forward) {
        (None, true) => 0,
        (None, false) => values.len() - 1,
        (Some(idx), true) => (idx + 1) % values.len(),
        (Some(idx), false) => (idx + values.len() - 1) % values.len(),
    };
    draft.category = values[next].clone();
}

/// Render a single line for the form widget.
pub(crate) fn build_line(
    label: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
    error: Option<&str>,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if error.is_some() {
        Style::default().fg(Color::Red)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ];
    if let Some(message) = error {
        spans.push(Span::styled(
            format!("  {message}"),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

/// Lines for the add/edit popup.
pub(crate) fn record_form_lines(
    draft: &RecordDraft,
    errors: &ValidationErrors,
    active: RecordField,
    config: &KindConfig,
) -> Vec<Line<'static>> {
    let category_placeholder = format!("<select {}: ←/→>", config.category_field);
    vec![
        build_line(
            "First Name",
            &draft.first_name,
            "<required>",
            active == RecordField::FirstName,
            errors.get(Field::FirstName),
        ),
        build_line(
            "Last Name",
            &draft.last_name,
            "<required>",
            active == RecordField::LastName,
            errors.get(Field::LastName),
        ),
        build_line(
            &config.category_label,
            &draft.category,
            &category_placeholder,
            active == RecordField::Category,
            errors.get(Field::Category),
        ),
    ]
}

/// Fields of the login form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum LoginField {
    #[default]
    Username,
    Password,
}

/// Login surface state: typed values, focus, and the last validation result.
#[derive(Default)]
pub(crate) struct LoginView {
    pub(crate) form: LoginForm,
    pub(crate) active: LoginField,
    pub(crate) errors: ValidationErrors,
}

impl LoginView {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoginField::Username => self.form.username.push(ch),
            LoginField::Password => self.form.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Username => {
                self.form.username.pop();
            }
            LoginField::Password => {
                self.form.password.pop();
            }
        }
    }

    pub(crate) fn lines(&self, busy: bool) -> Vec<Line<'static>> {
        let masked = "*".repeat(self.form.password.chars().count());
        let button = if busy {
            Span::styled("[ Logging in... ]", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled("[ Login ]", Style::default().fg(Color::Cyan))
        };
        vec![
            build_line(
                "Username",
                &self.form.username,
                "<required>",
                self.active == LoginField::Username,
                self.errors.get(Field::Username),
            ),
            build_line(
                "Password",
                &masked,
                "<required>",
                self.active == LoginField::Password,
                self.errors.get(Field::Password),
            ),
            Line::from(""),
            Line::from(button),
        ]
    }

    /// Character count of the focused field, used to place the cursor.
    pub(crate) fn value_len(&self) -> usize {
        match self.active {
            LoginField::Username => self.form.username.chars().count(),
            LoginField::Password => self.form.password.chars().count(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmRecordDelete {
    pub(crate) id: RecordId,
    pub(crate) name: String,
}

impl ConfirmRecordDelete {
    /// Build the confirmation state from the record being considered.
    pub(crate) fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.full_name(),
        }
    }
}
