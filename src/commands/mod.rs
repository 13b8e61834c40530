//! CLI command implementations.

mod ask;
mod consolidate;
mod hook;
mod index;
mod memory;
mod query;
mod status;
mod validate;

pub use ask::cmd_ask;
pub use consolidate::cmd_consolidate;
pub use hook::{HookEvent, cmd_hook};
pub use index::cmd_index;
pub use memory::{MemoryAction, cmd_memory};
pub use query::cmd_query;
pub use status::cmd_status;
pub use validate::cmd_validate;

/// The default session id for CLI writes: `YYYY-MM-DD/session`, matching
/// what hooks derive when the host agent sends no session.
pub fn default_session_id() -> String {
    format!("{}/session", chrono::Utc::now().format("%Y-%m-%d"))
}
