//! Logging and tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and one fmt
//! layer, text or JSON. Output goes to stderr so command output on stdout
//! stays machine-readable.

mod subscriber;

pub use subscriber::{TelemetryError, TelemetryGuard, init_scoped_telemetry, init_telemetry};
