//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (run context, window resolution, output) and `offset`
//! - `reports` - Report generation commands (tags, tag, budget, untagged)

pub mod core;
pub mod reports;

// Re-export command functions for main.rs
pub use self::core::*;
pub use reports::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
