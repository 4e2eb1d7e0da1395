//! Login gate in front of the record screens.
//!
//! The gate is a two-state machine (`Unauthenticated` → `Authenticated`).
//! A login check deliberately takes `delay` of wall-clock time: the shell
//! calls `begin_login`, keeps its submit control busy while `is_busy()`, and
//! calls `poll` on every tick until the check resolves. Credential checking
//! itself sits behind `CredentialVerifier` so the fixed pair can be swapped
//! for a real backend without touching the state machine.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{AdminError, Field, ValidationErrors};

/// Decides whether a username/password pair is acceptable.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

impl<F> CredentialVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// The single credential pair recognised by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Username/password as typed into the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Presence check run before the credential check starts.
    pub fn validate(&self) -> Result<(), AdminError> {
        let mut errors = ValidationErrors::new();
        if self.username.is_empty() {
            errors.push(Field::Username, "Please enter your username");
        }
        if self.password.is_empty() {
            errors.push(Field::Password, "Please enter your password");
        }
        errors.into_result(())
    }
}

struct PendingLogin {
    username: String,
    password: String,
    ready_at: Instant,
}

pub struct SessionGate {
    state: SessionState,
    verifier: Box<dyn CredentialVerifier>,
    delay: Duration,
    pending: Option<PendingLogin>,
}

impl SessionGate {
    pub fn new(verifier: impl CredentialVerifier + 'static, delay: Duration) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            verifier: Box::new(verifier),
            delay,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// True while a login check is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a login check that resolves `delay` after `now`. A second
    /// submission while one is pending is rejected with `Busy`.
    pub fn begin_login(
        &mut self,
        username: &str,
        password: &str,
        now: Instant,
    ) -> Result<(), AdminError> {
        if self.pending.is_some() {
            return Err(AdminError::Busy);
        }
        self.pending = Some(PendingLogin {
            username: username.to_string(),
            password: password.to_string(),
            ready_at: now + self.delay,
        });
        Ok(())
    }

    /// Resolve the pending check once its delay has elapsed. Returns `None`
    /// while nothing is pending or the check is still running.
    pub fn poll(&mut self, now: Instant) -> Option<Result<(), AdminError>> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.ready_at);
        if ready {
            self.resolve()
        } else {
            None
        }
    }

    /// Blocking variant of `begin_login` + `poll`: waits out the delay on the
    /// calling thread.
    pub fn attempt_login(&mut self, username: &str, password: &str) -> Result<(), AdminError> {
        self.begin_login(username, password, Instant::now())?;
        thread::sleep(self.delay);
        self.resolve().unwrap_or(Err(AdminError::InvalidCredentials))
    }

    /// Return to `Unauthenticated`, discarding any in-flight check.
    pub fn logout(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.pending = None;
    }

    fn resolve(&mut self) -> Option<Result<(), AdminError>> {
        let pending = self.pending.take()?;
        if self.verifier.verify(&pending.username, &pending.password) {
            self.state = SessionState::Authenticated;
            Some(Ok(()))
        } else {
            Some(Err(AdminError::InvalidCredentials))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(delay_ms: u64) -> SessionGate {
        SessionGate::new(
            StaticCredentials::new("admin", "password"),
            Duration::from_millis(delay_ms),
        )
    }

    #[test]
    fn correct_pair_authenticates() {
        let mut gate = gate(0);
        assert_eq!(gate.state(), SessionState::Unauthenticated);
        assert_eq!(gate.attempt_login("admin", "password"), Ok(()));
        assert!(gate.is_authenticated());
    }

    #[test]
    fn wrong_password_stays_unauthenticated() {
        let mut gate = gate(0);
        assert_eq!(
            gate.attempt_login("admin", "wrong"),
            Err(AdminError::InvalidCredentials)
        );
        assert_eq!(gate.state(), SessionState::Unauthenticated);
        assert!(!gate.is_busy());
    }

    #[test]
    fn check_waits_for_the_delay_and_rejects_duplicates() {
        let mut gate = gate(1000);
        let start = Instant::now();
        gate.begin_login("admin", "password", start).unwrap();

        assert!(gate.is_busy());
        assert_eq!(
            gate.begin_login("admin", "password", start),
            Err(AdminError::Busy)
        );
        assert_eq!(gate.poll(start + Duration::from_millis(999)), None);
        assert!(!gate.is_authenticated());

        assert_eq!(gate.poll(start + Duration::from_millis(1000)), Some(Ok(())));
        assert!(gate.is_authenticated());
        assert!(!gate.is_busy());
        assert_eq!(gate.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn logout_resets_and_drops_pending_check() {
        let mut gate = gate(0);
        gate.attempt_login("admin", "password").unwrap();
        let now = Instant::now();
        gate.begin_login("admin", "password", now).unwrap();

        gate.logout();

        assert_eq!(gate.state(), SessionState::Unauthenticated);
        assert_eq!(gate.poll(now), None);
    }

    #[test]
    fn verifier_is_pluggable() {
        let mut gate = SessionGate::new(
            |user: &str, _: &str| user == "ops",
            Duration::ZERO,
        );
        assert!(gate.attempt_login("ops", "anything").is_ok());
    }

    #[test]
    fn login_form_requires_both_fields() {
        let form = LoginForm::default();
        let Err(AdminError::Validation(errors)) = form.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get(Field::Username), Some("Please enter your username"));
        assert_eq!(errors.get(Field::Password), Some("Please enter your password"));

        let filled = LoginForm {
            username: "admin".into(),
            password: "x".into(),
        };
        assert_eq!(filled.validate(), Ok(()));
    }
}
