//! Two-stage completion for operation execution lines.
//!
//! Stage one completes the operation id. Once the id is settled, stage two
//! offers the request's bindable field keys as `key=` candidates, skipping
//! keys that are already present on the line.

use std::collections::HashSet;

use befall_util::{LexToken, coercion::split_key_type, lex_shell_like_ranged};

use crate::registry::OperationRegistry;

/// Key under which the operation id may be given explicitly.
pub const ROUTE_KEY: &str = "route";

pub struct CompletionEngine<'a> {
    registry: &'a OperationRegistry,
    /// Command word that starts the line, e.g. `apiexec.exec`.
    command: Option<&'a str>,
}

impl<'a> CompletionEngine<'a> {
    pub fn new(registry: &'a OperationRegistry) -> Self {
        Self { registry, command: None }
    }

    pub fn with_command(mut self, command: &'a str) -> Self {
        self.command = Some(command);
        self
    }

    /// Full-line replacements for `line`.
    pub fn complete(&self, line: &str) -> Vec<String> {
        let tokens = lex_shell_like_ranged(line);
        let ends_with_space = line.chars().last().is_some_and(char::is_whitespace);

        let mut rest: &[LexToken<'_>] = &tokens;
        if let (Some(command), Some(first)) = (self.command, tokens.first())
            && first.text == command
        {
            rest = &tokens[1..];
        }

        let Some((route, after_route)) = rest.split_first() else {
            return self.registry.ids().into_iter().map(|id| self.format_id(id, false)).collect();
        };
        let (typed_id, explicit) = match route.text.split_once('=') {
            Some((key, value)) if key == ROUTE_KEY => (value, true),
            Some(_) => return Vec::new(),
            None => (route.text, false),
        };

        let lowered = typed_id.to_lowercase();
        let candidates: Vec<&str> = self
            .registry
            .ids()
            .into_iter()
            .filter(|id| id.to_lowercase().starts_with(&lowered))
            .collect();
        let exact = candidates.iter().copied().find(|id| id.eq_ignore_ascii_case(typed_id));
        let settled = !after_route.is_empty() || ends_with_space;

        match exact {
            Some(id) if settled || candidates.len() == 1 => self.complete_fields(id, line, after_route, ends_with_space),
            _ if settled => Vec::new(),
            _ => candidates.into_iter().map(|id| self.format_id(id, explicit)).collect(),
        }
    }

    fn format_id(&self, id: &str, explicit: bool) -> String {
        let id = if explicit { format!("{ROUTE_KEY}={id}") } else { id.to_string() };
        match self.command {
            Some(command) => format!("{command} {id}"),
            None => id,
        }
    }

    fn complete_fields(&self, id: &str, line: &str, args: &[LexToken<'_>], ends_with_space: bool) -> Vec<String> {
        let Some(shape) = self.registry.lookup(id).and_then(|op| op.request_shape()) else {
            return Vec::new();
        };

        let fragment = if ends_with_space { None } else { args.last() };
        if fragment.is_some_and(|token| token.text.contains('=')) {
            return Vec::new();
        }

        let present: HashSet<&str> = args
            .iter()
            .filter_map(|token| token.text.split_once('='))
            .map(|(raw_key, _)| split_key_type(raw_key).0)
            .collect();
        let open_keys = shape
            .bindable_fields()
            .filter_map(|field| field.source_key)
            .filter(|key| !present.contains(key));

        match fragment {
            Some(token) => {
                let head = line[..token.start].trim();
                open_keys
                    .filter(|key| key.starts_with(token.text))
                    .map(|key| format!("{head} {key}="))
                    .collect()
            }
            None => {
                let head = line.trim();
                open_keys.map(|key| format!("{head} {key}=")).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{create_with_only_resp, create_with_req_and_resp};
    use befall_api::ops::guilds::get_staff_team;
    use befall_api::ops::users::{get_user, get_user_guilds};
    use befall_api::{ApiContext, ApiError};

    async fn version(_ctx: ApiContext) -> Result<String, ApiError> {
        Ok(String::new())
    }

    fn registry() -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        registry.register("core", create_with_only_resp("getApiConfig", version));
        registry.register("guilds", create_with_req_and_resp("getStaffTeam", get_staff_team));
        registry.register("user", create_with_req_and_resp("getUser", get_user));
        registry.register("user", create_with_req_and_resp("getUserGuilds", get_user_guilds));
        registry
    }

    #[test]
    fn empty_input_lists_every_id() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry).with_command("apiexec.exec");
        assert_eq!(
            engine.complete("apiexec.exec "),
            vec![
                "apiexec.exec getApiConfig",
                "apiexec.exec getStaffTeam",
                "apiexec.exec getUser",
                "apiexec.exec getUserGuilds",
            ]
        );
    }

    #[test]
    fn id_prefix_is_case_insensitive() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry);
        assert_eq!(engine.complete("getuserg"), vec!["getUserGuilds"]);
        assert_eq!(engine.complete("route=getS"), vec!["route=getStaffTeam"]);
    }

    #[test]
    fn exact_id_with_other_candidates_still_lists_ids() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry);
        assert_eq!(engine.complete("getUser"), vec!["getUser", "getUserGuilds"]);
    }

    #[test]
    fn settled_id_offers_field_keys() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry).with_command("apiexec.exec");
        assert_eq!(
            engine.complete("apiexec.exec getStaffTeam "),
            vec!["apiexec.exec getStaffTeam guildId="]
        );
    }

    #[test]
    fn partial_key_is_completed_and_present_keys_are_skipped() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry);
        assert_eq!(engine.complete("getUserGuilds ref"), vec!["getUserGuilds refresh="]);
        assert!(engine.complete("getUserGuilds refresh::bool=true ").is_empty());
    }

    #[test]
    fn mid_value_yields_nothing() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry);
        assert!(engine.complete("getStaffTeam guildId=").is_empty());
        assert!(engine.complete("getStaffTeam guildId=12").is_empty());
    }

    #[test]
    fn unknown_settled_id_yields_nothing() {
        let registry = registry();
        let engine = CompletionEngine::new(&registry);
        assert!(engine.complete("nothing ").is_empty());
        assert!(engine.complete("getApiConfig ").is_empty());
    }
}
