//! Binary entry point: read configuration, point the record loader at the
//! API, and drive the terminal shell until the user quits.
use std::env;
use std::sync::Arc;

use school_admin::{run_app, App, AppConfig, HttpSource, Route};

/// An optional first argument names the route to open, e.g. `/teachers`.
/// Protected routes still go through the login screen first.
fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let source = Arc::new(HttpSource::new(
        config.api_base_url.clone(),
        config.request_timeout(),
    ));

    let mut app = App::new(config, source);
    if let Some(path) = env::args().nth(1) {
        app.navigate(Route::parse(&path));
    }
    run_app(&mut app)
}
