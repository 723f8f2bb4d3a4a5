//! Start-up configuration: command-line flags layered over `BEFALL_*`
//! environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use befall_types::{AppState, Location, UserPrefs};
use befall_util::{default_state_path, expand_tilde, parse_bool};
use clap::Parser;

pub const INSTANCE_URL_ENV: &str = "BEFALL_INSTANCE_URL";
pub const BIND_ADDR_ENV: &str = "BEFALL_BIND_ADDR";
pub const MOUSE_ENV: &str = "BEFALL_MOUSE_ENABLED";
pub const PASTE_ENV: &str = "BEFALL_PASTE_ENABLED";
pub const FULLSCREEN_ENV: &str = "BEFALL_FULLSCREEN";

#[derive(Debug, Default, Parser)]
#[command(name = "befall", version, about = "Interactive console for the Befall moderation API")]
pub struct Cli {
    /// Run these `;`-separated commands, then exit
    #[arg(long, value_name = "CMDS")]
    pub command: Option<String>,

    /// State file to load and save; empty or `false` disables persistence
    #[arg(long, value_name = "PATH", conflicts_with = "no_persist")]
    pub persist: Option<String>,

    /// Keep state in memory only
    #[arg(long)]
    pub no_persist: bool,

    /// Base URL of the API instance
    #[arg(long, value_name = "URL")]
    pub instance_url: Option<String>,

    /// Start at this location, e.g. `choose_guild?{"refresh":"true"}`
    #[arg(long, value_name = "LOC")]
    pub location: Option<String>,
}

/// Everything `main` needs, resolved from flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub commands: Option<String>,
    pub prefs: UserPrefs,
    pub instance_url: Option<String>,
    pub bind_addr: Option<String>,
    pub location: Option<Location>,
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env_value(name) {
        None => Ok(default),
        Some(value) => match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => bail!("{name} must be a boolean, got {value:?}"),
        },
    }
}

fn persist_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_persist {
        return None;
    }
    match cli.persist.as_deref().map(str::trim) {
        Some(path) if path.is_empty() || path.eq_ignore_ascii_case("false") => None,
        Some(path) => Some(expand_tilde(path)),
        None => default_state_path(),
    }
}

impl Settings {
    pub fn resolve(cli: Cli) -> Result<Self> {
        let defaults = UserPrefs::default();
        let prefs = UserPrefs {
            mouse_enabled: env_flag(MOUSE_ENV, defaults.mouse_enabled)?,
            paste_enabled: env_flag(PASTE_ENV, defaults.paste_enabled)?,
            fullscreen_enabled: env_flag(FULLSCREEN_ENV, defaults.fullscreen_enabled)?,
            persist: persist_path(&cli),
        };
        let location = cli
            .location
            .as_deref()
            .map(|raw| raw.parse::<Location>().with_context(|| format!("invalid --location {raw}")))
            .transpose()?;

        Ok(Self {
            commands: cli.command,
            prefs,
            instance_url: cli.instance_url.or_else(|| env_value(INSTANCE_URL_ENV)),
            bind_addr: env_value(BIND_ADDR_ENV),
            location,
        })
    }

    /// Applies the overrides on top of loaded (or fresh) state.
    pub fn apply(&self, state: &mut AppState) {
        if let Some(url) = &self.instance_url {
            state.fetch_options.instance_api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(bind_addr) = &self.bind_addr {
            state.bind_addr = bind_addr.trim_end_matches('/').to_string();
        }
        if let Some(location) = &self.location {
            state.current_loc = location.clone();
        }
        state.prefs = self.prefs.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ENV: [&str; 6] = [
        INSTANCE_URL_ENV,
        BIND_ADDR_ENV,
        MOUSE_ENV,
        PASTE_ENV,
        FULLSCREEN_ENV,
        befall_util::persistence::PERSIST_PATH_ENV,
    ];

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("befall").chain(args.iter().copied())).unwrap()
    }

    fn without_env<R>(f: impl FnOnce() -> R) -> R {
        temp_env::with_vars_unset(ALL_ENV, f)
    }

    #[test]
    fn defaults_match_user_prefs() {
        without_env(|| {
            let settings = Settings::resolve(cli(&["--no-persist"])).unwrap();
            assert_eq!(settings.prefs, UserPrefs::default());
            assert_eq!(settings.instance_url, None);
            assert_eq!(settings.commands, None);
        });
    }

    #[test]
    fn flags_win_over_environment() {
        temp_env::with_vars(
            [
                (INSTANCE_URL_ENV, Some("http://env:1")),
                (MOUSE_ENV, Some("true")),
                (FULLSCREEN_ENV, Some("0")),
                (BIND_ADDR_ENV, Some("http://127.0.0.1:9000/")),
            ],
            || {
                let settings =
                    Settings::resolve(cli(&["--instance-url", "http://flag:2/", "--persist", "false"])).unwrap();
                assert_eq!(settings.instance_url.as_deref(), Some("http://flag:2/"));
                assert!(settings.prefs.mouse_enabled);
                assert!(!settings.prefs.fullscreen_enabled);
                assert_eq!(settings.prefs.persist, None);

                let mut state = AppState::default();
                settings.apply(&mut state);
                assert_eq!(state.api_url(), "http://flag:2");
                assert_eq!(state.bind_addr, "http://127.0.0.1:9000");
            },
        );
    }

    #[test]
    fn persistence_follows_flag_then_environment() {
        temp_env::with_vars(
            [(befall_util::persistence::PERSIST_PATH_ENV, Some("/tmp/env-state.json"))],
            || {
                let from_env = Settings::resolve(cli(&[])).unwrap();
                assert_eq!(from_env.prefs.persist, Some(PathBuf::from("/tmp/env-state.json")));
                let from_flag = Settings::resolve(cli(&["--persist", "/tmp/flag.json"])).unwrap();
                assert_eq!(from_flag.prefs.persist, Some(PathBuf::from("/tmp/flag.json")));
                let disabled = Settings::resolve(cli(&["--no-persist"])).unwrap();
                assert_eq!(disabled.prefs.persist, None);
            },
        );
    }

    #[test]
    fn malformed_values_are_errors() {
        without_env(|| {
            assert!(Settings::resolve(cli(&["--location", "root?{oops"])).is_err());
        });
        temp_env::with_var(PASTE_ENV, Some("sometimes"), || {
            assert!(Settings::resolve(cli(&["--no-persist"])).is_err());
        });
    }

    #[test]
    fn location_deep_link_replaces_the_saved_location() {
        without_env(|| {
            let settings = Settings::resolve(cli(&["--no-persist", "--location", r#"choose_guild?{"guild_id":"7"}"#])).unwrap();
            let mut state = AppState::default();
            settings.apply(&mut state);
            assert_eq!(state.current_loc.id, "choose_guild");
            assert_eq!(state.current_loc.data.get("guild_id").map(String::as_str), Some("7"));
        });
    }
}
