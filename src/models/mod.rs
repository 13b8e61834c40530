//! Domain models.

mod commit;
mod diagnostics;
mod memory;
mod signals;

pub use commit::{CommitType, IndexedCommit, Intent, StructuredCommit};
pub use diagnostics::{Diagnostic, Severity};
pub use memory::{EntryTag, MemoryEntry, WorkingMemory};
pub use signals::PromptSignals;
