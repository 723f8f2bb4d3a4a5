//! Befall utility crate: shell-like lexing, the argument coercion pipeline,
//! state persistence and secret redaction.

pub mod coercion;
pub mod persistence;
pub mod shell_lexing;
pub mod text_processing;

use std::path::PathBuf;

use dirs_next::home_dir;

pub use coercion::{CoercionError, ScalarKind, TypeTag, coerce_arg, coerce_args, coerce_value, parse_bool};
pub use persistence::{PersistenceError, StateStore, default_state_path};
pub use shell_lexing::{
    LexError, LexToken, lex_shell_like, lex_shell_like_ranged, lex_words, split_commands, split_quoted, unquote,
};
pub use text_processing::{redact_json, redact_sensitive};

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/").or_else(|| p.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x/state.json"), home.join("x/state.json"));
        }
        assert_eq!(expand_tilde(" /abs/path "), PathBuf::from("/abs/path"));
    }
}
