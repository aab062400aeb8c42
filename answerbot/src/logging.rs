//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// Respects the `ANSWERBOT_LOG` environment variable for filtering and
/// defaults to `info`. Output goes to stderr so replies on stdout stay clean.
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_env("ANSWERBOT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
