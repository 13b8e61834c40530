//! Prompt-analysis vocabulary tables.
//!
//! Data, not code: the intent synonym table and the stop-word set live here
//! so additions stay reviewable in one place.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::models::Intent;

/// English verbs and nouns that imply a commit intent.
pub static INTENT_SYNONYMS: LazyLock<HashMap<&'static str, Intent>> = LazyLock::new(|| {
    use Intent::{
        ConfigureInfra, Document, EnableCapability, Explore, FixDefect, ImproveQuality,
        ResolveBlocker, Restructure,
    };
    HashMap::from([
        // enable-capability
        ("add", EnableCapability),
        ("implement", EnableCapability),
        ("create", EnableCapability),
        ("build", EnableCapability),
        ("introduce", EnableCapability),
        ("support", EnableCapability),
        ("enable", EnableCapability),
        ("feature", EnableCapability),
        ("capability", EnableCapability),
        ("new", EnableCapability),
        // fix-defect
        ("fix", FixDefect),
        ("bug", FixDefect),
        ("defect", FixDefect),
        ("broken", FixDefect),
        ("breaks", FixDefect),
        ("crash", FixDefect),
        ("error", FixDefect),
        ("fail", FixDefect),
        ("failing", FixDefect),
        ("failure", FixDefect),
        ("regression", FixDefect),
        ("incorrect", FixDefect),
        ("wrong", FixDefect),
        ("repair", FixDefect),
        // improve-quality
        ("improve", ImproveQuality),
        ("cleanup", ImproveQuality),
        ("clean", ImproveQuality),
        ("polish", ImproveQuality),
        ("simplify", ImproveQuality),
        ("tidy", ImproveQuality),
        ("lint", ImproveQuality),
        ("quality", ImproveQuality),
        ("readability", ImproveQuality),
        ("refine", ImproveQuality),
        // restructure
        ("refactor", Restructure),
        ("restructure", Restructure),
        ("reorganize", Restructure),
        ("rearchitect", Restructure),
        ("extract", Restructure),
        ("modularize", Restructure),
        ("rename", Restructure),
        ("split", Restructure),
        // configure-infra
        ("configure", ConfigureInfra),
        ("config", ConfigureInfra),
        ("configuration", ConfigureInfra),
        ("infra", ConfigureInfra),
        ("infrastructure", ConfigureInfra),
        ("deploy", ConfigureInfra),
        ("deployment", ConfigureInfra),
        ("pipeline", ConfigureInfra),
        ("docker", ConfigureInfra),
        ("provision", ConfigureInfra),
        ("tooling", ConfigureInfra),
        // document
        ("document", Document),
        ("documentation", Document),
        ("docs", Document),
        ("readme", Document),
        ("changelog", Document),
        ("describe", Document),
        // explore
        ("explore", Explore),
        ("investigate", Explore),
        ("research", Explore),
        ("spike", Explore),
        ("prototype", Explore),
        ("experiment", Explore),
        ("evaluate", Explore),
        ("assess", Explore),
        // resolve-blocker
        ("unblock", ResolveBlocker),
        ("blocker", ResolveBlocker),
        ("blocked", ResolveBlocker),
        ("workaround", ResolveBlocker),
        ("mitigate", ResolveBlocker),
    ])
});

/// Common words dropped from residual keywords.
pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do", "does",
        "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can", "need",
        "i", "we", "you", "it", "this", "that", "these", "those", "my", "our", "your", "its",
        "me", "us", "them", "they", "he", "she", "his", "her", "what", "which", "who", "how",
        "when", "where", "why", "there", "here", "then", "than", "so", "if", "not", "no", "yes",
        "please", "about", "into", "over", "under", "again", "just", "also", "some", "any", "all",
        "more", "most", "other", "each", "because", "while", "during", "before", "after", "up",
        "down", "out", "off", "let", "lets", "make", "get", "got", "want", "like", "see", "look",
        "code", "file", "files", "thing", "things", "now", "still", "really", "very",
    ]
    .into_iter()
    .collect()
});
