//! Bridge between the add/edit form surface and the record store. A
//! submission is validated in full before the store is touched; success
//! closes the surface and clears the editing target.

use crate::error::{AdminError, Field, ValidationErrors};
use crate::models::{KindConfig, Record, RecordFields, RecordId};
use crate::store::RecordStore;

/// Raw text the user typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub first_name: String,
    pub last_name: String,
    pub category: String,
}

impl RecordDraft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            category: record.category.clone(),
        }
    }

    /// Trim every field and check presence plus category membership.
    pub fn validate(&self, config: &KindConfig) -> Result<RecordFields, AdminError> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let category = self.category.trim();

        let mut errors = ValidationErrors::new();
        if first_name.is_empty() {
            errors.push(Field::FirstName, "Please enter the first name");
        }
        if last_name.is_empty() {
            errors.push(Field::LastName, "Please enter the last name");
        }
        if category.is_empty() {
            errors.push(
                Field::Category,
                format!("Please select the {}", config.category_field),
            );
        } else if !config.allows_category(category) {
            errors.push(
                Field::Category,
                format!("Unknown {} '{category}'", config.category_field),
            );
        }

        errors.into_result(RecordFields {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            category: category.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Adding,
    Editing(RecordId),
}

/// An open add/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSurface {
    pub mode: FormMode,
    pub draft: RecordDraft,
    pub errors: ValidationErrors,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Added(Record),
    Updated(Record),
}

impl Submission {
    pub fn record(&self) -> &Record {
        match self {
            Submission::Added(record) | Submission::Updated(record) => record,
        }
    }

    /// "Student added successfully" / "Teacher updated successfully".
    pub fn notice(&self, config: &KindConfig) -> String {
        let verb = match self {
            Submission::Added(_) => "added",
            Submission::Updated(_) => "updated",
        };
        format!("{} {verb} successfully", config.singular)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormBridge {
    surface: Option<FormSurface>,
}

impl FormBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty add form, discarding any previous draft.
    pub fn open_add(&mut self) {
        self.surface = Some(FormSurface {
            mode: FormMode::Adding,
            draft: RecordDraft::default(),
            errors: ValidationErrors::new(),
        });
    }

    /// Open the edit form pre-filled from `record`.
    pub fn open_edit(&mut self, record: &Record) {
        self.surface = Some(FormSurface {
            mode: FormMode::Editing(record.id.clone()),
            draft: RecordDraft::from_record(record),
            errors: ValidationErrors::new(),
        });
    }

    pub fn cancel(&mut self) {
        self.surface = None;
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&FormSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut FormSurface> {
        self.surface.as_mut()
    }

    /// Id of the record being edited, if the open form is an edit form.
    pub fn editing(&self) -> Option<RecordId> {
        match &self.surface.as_ref()?.mode {
            FormMode::Editing(id) => Some(id.clone()),
            FormMode::Adding => None,
        }
    }

    /// Validate the open draft and create or update through `store`.
    ///
    /// On failure the surface stays open and the store is unchanged; field
    /// errors are kept on the surface for rendering.
    pub fn submit(
        &mut self,
        store: &mut RecordStore,
        config: &KindConfig,
    ) -> Result<Submission, AdminError> {
        let surface = self.surface.as_mut().ok_or(AdminError::FormClosed)?;

        let fields = match surface.draft.validate(config) {
            Ok(fields) => fields,
            Err(err) => {
                if let AdminError::Validation(errors) = &err {
                    surface.errors = errors.clone();
                }
                return Err(err);
            }
        };

        let submission = match &surface.mode {
            FormMode::Adding => Submission::Added(store.create(fields)),
            FormMode::Editing(id) => Submission::Updated(store.update(id.clone(), fields.into())?),
        };

        self.surface = None;
        Ok(submission)
    }
}
