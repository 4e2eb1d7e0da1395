//! Core library for the school administration dashboard.
//!
//! The domain modules (`store`, `filter`, `form`, `session`, `router`) have no
//! terminal dependencies and can be driven directly; `ui` wires them into the
//! interactive shell used by the binary.
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod models;
pub mod router;
pub mod session;
pub mod source;
pub mod store;
pub mod ui;

pub use config::AppConfig;
pub use error::{AdminError, Field, ValidationErrors};
pub use filter::{filter_records, RecordFilter};
pub use form::{FormBridge, FormMode, RecordDraft, Submission};
pub use models::{EntityKind, KindConfig, Record, RecordFields, RecordId, RecordPatch};
pub use router::Route;
pub use session::{CredentialVerifier, LoginForm, SessionGate, SessionState, StaticCredentials};
pub use source::{HttpSource, RecordSource};
pub use store::RecordStore;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
