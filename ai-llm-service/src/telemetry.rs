use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefixes of the workspace crates whose events this layer renders.
pub const TARGET_PREFIXES: &[&str] = &[
    "ai_llm_service",
    "rag_store",
    "contextor",
    "api",
    "rag_backend",
];

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // No fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Build a **workspace-scoped** formatting layer that renders only events
/// emitted by the RAG crates (see [`TARGET_PREFIXES`]).
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - Span close events (duration at the end of spans)
/// - ANSI colors only when stdout is a terminal
///
/// Third-party crates (hyper, h2, tonic) stay silent here; compose this with
/// an `EnvFilter` in the binary.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        // Span close gives durations for instrumented functions
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

/// Level directives for every workspace crate, e.g. `rag_store=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let level = level.as_str().to_lowercase();
    TARGET_PREFIXES
        .iter()
        .filter_map(|prefix| Directive::from_str(&format!("{prefix}={level}")).ok())
        .collect()
}

/// Creates an `EnvFilter` from `RUST_LOG`. When it is unset, dependencies log
/// at `default` and the workspace crates at `level`.
///
/// With `default = "warn"` and `Level::INFO`, dependencies log at WARN while
/// the RAG crates log at INFO.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(rust_log.as_deref(), default, level)
}

/// `rust_log` wins as given; an unparsable value falls back to the defaults.
fn filter_from(rust_log: Option<&str>, default: &str, level: Level) -> EnvFilter {
    if let Some(spec) = rust_log.filter(|s| !s.trim().is_empty()) {
        match EnvFilter::try_new(spec) {
            Ok(filter) => return filter,
            Err(err) => eprintln!("ignoring invalid {}: {err}", EnvFilter::DEFAULT_ENV),
        }
    }
    level_directives(level)
        .into_iter()
        .fold(EnvFilter::new(default), |filter, directive| {
            filter.add_directive(directive)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_workspace_targets_only() {
        assert!(is_workspace_target("rag_store::index::qdrant"));
        assert!(is_workspace_target("api"));
        assert!(!is_workspace_target("apis::other"));
        assert!(!is_workspace_target("hyper::proto"));
    }

    #[test]
    fn builds_one_directive_per_crate() {
        let directives = level_directives(Level::DEBUG);
        assert_eq!(directives.len(), TARGET_PREFIXES.len());
        assert!(directives.iter().any(|d| d.to_string() == "contextor=debug"));
    }

    #[test]
    fn rust_log_is_not_overridden() {
        let filter = filter_from(Some("rag_store=debug"), "warn", Level::INFO).to_string();
        assert!(filter.contains("rag_store=debug"));
        assert!(!filter.contains("rag_store=info"));
        assert!(!filter.contains("contextor=info"));
    }

    #[test]
    fn defaults_apply_without_rust_log() {
        for rust_log in [None, Some(""), Some("rag_store=loud")] {
            let filter = filter_from(rust_log, "warn", Level::INFO).to_string();
            assert!(filter.contains("rag_store=info"), "{filter}");
            assert!(filter.contains("warn"), "{filter}");
        }
    }
}
