//! Prompt signal types.

use crate::models::Intent;

/// Signals extracted from one user prompt.
///
/// The three collections are disjoint: a token consumed as a scope hint or
/// an intent synonym never reappears as a keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSignals {
    /// Tokens that matched a stored scope key (exact or as a prefix).
    pub scope_hints: Vec<String>,
    /// Intents implied by synonym-table hits, de-duplicated.
    pub intent_hints: Vec<Intent>,
    /// Residual tokens after stop-word filtering, first-seen order.
    pub keywords: Vec<String>,
}

impl PromptSignals {
    /// Whether no signal of any kind was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scope_hints.is_empty() && self.intent_hints.is_empty() && self.keywords.is_empty()
    }
}
