//! Shared application handle passed to every view.

use std::io::Write;
use std::sync::{Arc, Mutex};

use befall_api::{ApiContext, SharedState};
use befall_registry::OperationRegistry;
use befall_util::{PersistenceError, StateStore};
use tracing::warn;

/// Destination of user-facing output.
///
/// Views print through the console rather than to stdout directly so that
/// their output can be captured in tests.
#[derive(Debug, Clone, Default)]
pub struct Console {
    captured: Option<Arc<Mutex<String>>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::default()
    }

    /// A console that records output in memory.
    pub fn capture() -> Self {
        Self {
            captured: Some(Arc::new(Mutex::new(String::new()))),
        }
    }

    pub fn println(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        match &self.captured {
            Some(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                buffer.push_str(line);
                buffer.push('\n');
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                if let Err(err) = writeln!(stdout, "{line}") {
                    warn!(error = %err, "Failed to write to stdout");
                }
            }
        }
    }

    /// Everything printed so far; empty for the stdout console.
    pub fn captured(&self) -> String {
        self.captured
            .as_ref()
            .map(|buffer| buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone())
            .unwrap_or_default()
    }
}

/// Everything a view needs: the API context (client plus shared state), the
/// operation registry, the optional state store and the console.
#[derive(Debug, Clone)]
pub struct App {
    pub ctx: ApiContext,
    pub registry: Arc<OperationRegistry>,
    store: Option<StateStore>,
    console: Console,
}

impl App {
    pub fn new(ctx: ApiContext, registry: Arc<OperationRegistry>, store: Option<StateStore>) -> Self {
        Self {
            ctx,
            registry,
            store,
            console: Console::stdout(),
        }
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.ctx.state
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn store(&self) -> Option<&StateStore> {
        self.store.as_ref()
    }

    /// Writes a snapshot of the state when persistence is enabled.
    pub async fn persist(&self) -> Result<(), PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = self.ctx.state.lock().await.clone();
        store.save(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_console_records_lines() {
        let console = Console::capture();
        console.println("one");
        console.clone().println("two");
        assert_eq!(console.captured(), "one\ntwo\n");
        assert!(Console::stdout().captured().is_empty());
    }
}
