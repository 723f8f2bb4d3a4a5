//! Built-in navigation states.

mod apiexec;
mod choose_guild;
mod login;
mod root;
mod showstate;

use std::sync::Arc;

use anyhow::{Result, bail};
use befall_util::parse_bool;

pub use apiexec::{ApiExecLsView, ApiExecView};
pub use choose_guild::ChooseGuildView;
pub use login::{LoginView, authorize_url};
pub use root::RootView;
pub use showstate::ShowStateView;

use crate::router::Router;
use crate::view::{View, ViewArgs};

/// Every built-in view, in help order.
pub fn default_views() -> Vec<Arc<dyn View>> {
    vec![
        Arc::new(RootView),
        Arc::new(LoginView::default()),
        Arc::new(ChooseGuildView::default()),
        Arc::new(ApiExecLsView),
        Arc::new(ApiExecView),
        Arc::new(ShowStateView),
    ]
}

pub fn default_router() -> Router {
    let mut router = Router::new();
    for view in default_views() {
        router.register(view);
    }
    router
}

/// A non-blank argument value, trimmed.
pub(crate) fn arg<'a>(args: &'a ViewArgs, name: &str) -> Option<&'a str> {
    args.get(name).map(|value| value.trim()).filter(|value| !value.is_empty())
}

/// A boolean argument; absent means `false`.
pub(crate) fn flag(args: &ViewArgs, name: &str) -> Result<bool> {
    match arg(args, name) {
        None => Ok(false),
        Some(value) => match parse_bool(value) {
            Some(flag) => Ok(flag),
            None => bail!("argument {name} expects a boolean, got {value:?}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_knows_every_builtin_view() {
        let router = default_router();
        let ids: Vec<_> = router.views().map(|view| view.id()).collect();
        assert_eq!(ids, vec!["root", "login", "choose_guild", "apiexec.ls", "apiexec.exec", "showstate"]);
    }

    #[test]
    fn flags_parse_booleans_and_reject_junk() {
        let mut args = ViewArgs::new();
        assert!(!flag(&args, "refresh").unwrap());
        args.insert("refresh".into(), " true ".into());
        assert!(flag(&args, "refresh").unwrap());
        args.insert("refresh".into(), "maybe".into());
        assert!(flag(&args, "refresh").is_err());
        args.insert("blank".into(), "  ".into());
        assert_eq!(arg(&args, "blank"), None);
    }
}
