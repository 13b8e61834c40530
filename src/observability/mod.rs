//! Observability.

mod logging;

pub use logging::{LogFormat, init};
