//! Routed surfaces of the dashboard and the rule that keeps the record
//! screens behind the login gate.

use crate::models::EntityKind;
use crate::session::SessionGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Records(EntityKind),
}

impl Route {
    /// Map a path to a route. The root path and anything unknown land on the
    /// login surface.
    pub fn parse(path: &str) -> Route {
        match path.trim().trim_end_matches('/') {
            "/students" => Route::Records(EntityKind::Student),
            "/teachers" => Route::Records(EntityKind::Teacher),
            _ => Route::Login,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Records(EntityKind::Student) => "/students",
            Route::Records(EntityKind::Teacher) => "/teachers",
        }
    }

    pub fn is_protected(self) -> bool {
        matches!(self, Route::Records(_))
    }
}

/// Route actually shown for `requested`: protected routes redirect to login
/// unless the session is authenticated.
pub fn resolve(requested: Route, session: &SessionGate) -> Route {
    if requested.is_protected() && !session.is_authenticated() {
        Route::Login
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::StaticCredentials;

    fn gate() -> SessionGate {
        SessionGate::new(StaticCredentials::new("admin", "password"), Duration::ZERO)
    }

    #[test]
    fn parses_known_paths_and_defaults_to_login() {
        assert_eq!(Route::parse("/students"), Route::Records(EntityKind::Student));
        assert_eq!(Route::parse("/teachers/"), Route::Records(EntityKind::Teacher));
        assert_eq!(Route::parse("/"), Route::Login);
        assert_eq!(Route::parse("/nowhere"), Route::Login);
        assert_eq!(Route::parse("/login"), Route::Login);
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Login,
            Route::Records(EntityKind::Student),
            Route::Records(EntityKind::Teacher),
        ] {
            assert_eq!(Route::parse(route.path()), route);
        }
    }

    #[test]
    fn protected_routes_redirect_until_authenticated() {
        let mut session = gate();
        let students = Route::Records(EntityKind::Student);
        assert_eq!(resolve(students, &session), Route::Login);

        session.attempt_login("admin", "password").unwrap();
        assert_eq!(resolve(students, &session), students);
        assert_eq!(resolve(Route::Login, &session), Route::Login);

        session.logout();
        assert_eq!(resolve(Route::Records(EntityKind::Teacher), &session), Route::Login);
    }
}
