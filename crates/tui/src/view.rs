//! The lifecycle contract every navigable view implements.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::app::App;

/// Location data handed to a view: raw string arguments keyed by name.
pub type ViewArgs = IndexMap<String, String>;

/// One declared argument of a view, used for help output and for filling
/// bare shell tokens in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewArg {
    pub name: &'static str,
    pub description: &'static str,
    pub type_name: &'static str,
}

impl ViewArg {
    pub const fn new(name: &'static str, description: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            description,
            type_name,
        }
    }
}

/// A navigation state.
///
/// The router calls `teardown` on the view being left, then `setup` and
/// `render` on the view being entered. `render` may run for as long as the
/// view needs user interaction; `teardown` must make any pending wait in
/// `render` return. Hooks take `&self`, so views that hold per-visit state
/// keep it behind interior mutability.
#[async_trait]
pub trait View: Send + Sync {
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn args(&self) -> &'static [ViewArg] {
        &[]
    }

    /// Whether a saved location pointing here may be re-entered at start-up.
    /// Views with side effects (requests, login waits, pickers) opt out.
    fn resumable(&self) -> bool {
        true
    }

    async fn setup(&self, _app: &App) -> anyhow::Result<()> {
        Ok(())
    }

    async fn render(&self, app: &App, args: &ViewArgs) -> anyhow::Result<()>;

    async fn teardown(&self, _app: &App) -> anyhow::Result<()> {
        Ok(())
    }

    /// Custom completions for a line starting with this view's id. `None`
    /// falls back to the shell's default completion.
    fn complete(&self, _app: &App, _line: &str) -> Option<Vec<String>> {
        None
    }
}
