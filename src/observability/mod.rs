//! Tracing pipeline that exports OpenTelemetry spans to a local file.
//!
//! ```text
//! tracing macros → tracing-opentelemetry → SDK provider → FileSpanExporter → JSONL file
//! ```
//!
//! Every list, mutation and stats request the query worker serves runs in
//! a span whose parent is the span active when the event handler posted
//! the message, so a trace shows the whole path from user input to the
//! backend round-trip.
//!
//! Spans go to `<data dir>/equilink-admin-otlp.json`, one OTLP JSON document
//! per line. The file rotates at 10 MB and keeps three backups.
//!
//! The filter comes from `trace_level` in the configuration, then
//! `RUST_LOG`, then defaults to `info`.

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::{init_tracing, TRACE_FILE_NAME};
