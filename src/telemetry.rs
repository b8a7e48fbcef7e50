use prometheus::register_counter_vec;
use prometheus::CounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUIZ_CNTR: CounterVec = register_counter_vec!(
        "quiz_requests_total",
        "Number of quiz requests by scope (all or filtered) and outcome",
        &["scope", "outcome"]
    )
    .unwrap();
    pub static ref QUESTION_MUTATIONS_CNTR: CounterVec = register_counter_vec!(
        "questions_mutations_total",
        "Number of successful question writes",
        &["operation"]
    )
    .unwrap();
}

/// Loads `.env` first so `LOG_LEVEL` and `INCLUDE_SPAN_EVENTS` set there
/// apply to the subscriber.
pub fn init_tracing() {
    dotenv::dotenv().ok();
    let mut fmt_layer = fmt::layer();
    if span_events_enabled() {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT);
    }

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .init();
}

fn span_events_enabled() -> bool {
    std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_file_configures_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LOG_LEVEL=warn\nINCLUDE_SPAN_EVENTS=TRUE\n").unwrap();

        // values already in the environment win over the file
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("INCLUDE_SPAN_EVENTS");
        dotenv::from_path(&path).unwrap();

        assert_eq!(env_filter().to_string(), "warn");
        assert!(span_events_enabled());
    }
}
