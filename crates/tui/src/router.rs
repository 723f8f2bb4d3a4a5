//! Navigation state machine.
//!
//! The current location lives in the shared application state and is
//! persisted after every transition. The router additionally remembers which
//! view it actually set up in this process, so that the first transition
//! after a restart does not tear down a view that was never entered.

use std::sync::{Arc, Mutex};

use befall_types::Location;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::view::{View, ViewArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Setup,
    Render,
    Teardown,
}

impl std::fmt::Display for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Hook::Setup => "setup",
            Hook::Render => "render",
            Hook::Teardown => "teardown",
        })
    }
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("route not found: {0}")]
    RouteNotFound(String),
    #[error("{view} {hook} failed: {error:#}")]
    Hook {
        view: String,
        hook: Hook,
        error: anyhow::Error,
    },
}

impl NavigationError {
    fn hook(view: &str, hook: Hook, error: anyhow::Error) -> Self {
        NavigationError::Hook {
            view: view.to_string(),
            hook,
            error,
        }
    }
}

/// Where a fresh start, or one that cannot resume, begins.
pub const DEFAULT_VIEW: &str = "root";

#[derive(Default)]
pub struct Router {
    views: IndexMap<&'static str, Arc<dyn View>>,
    active: Mutex<Option<&'static str>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: Arc<dyn View>) {
        if self.views.insert(view.id(), Arc::clone(&view)).is_some() {
            warn!(view = view.id(), "View registered twice; keeping the last registration");
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn View>> {
        self.views.get(id)
    }

    /// Registered views in registration order.
    pub fn views(&self) -> impl Iterator<Item = &Arc<dyn View>> {
        self.views.values()
    }

    /// The view set up by the last transition, if any.
    pub fn active(&self) -> Option<&'static str> {
        *self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_active(&self, id: Option<&'static str>) {
        *self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = id;
    }

    /// Moves to `target`.
    ///
    /// An unknown target fails before anything else happens. Otherwise the
    /// active view is torn down (a failure aborts and leaves the location
    /// unchanged), the location is updated, and the target is set up and
    /// rendered. Re-entering the current view runs the full cycle as well.
    pub async fn goto(&self, app: &App, target: &str, args: ViewArgs) -> Result<(), NavigationError> {
        let Some(view) = self.views.get(target).cloned() else {
            return Err(NavigationError::RouteNotFound(target.to_string()));
        };

        if let Some(current) = self.active().and_then(|id| self.views.get(id)) {
            debug!(from = current.id(), to = view.id(), "Tearing down view");
            current
                .teardown(app)
                .await
                .map_err(|err| NavigationError::hook(current.id(), Hook::Teardown, err))?;
            self.set_active(None);
        }

        app.state().lock().await.current_loc = Location::with_data(view.id(), args.clone());
        self.persist(app).await;

        info!(route = view.id(), "Entering view");
        self.set_active(Some(view.id()));
        view.setup(app)
            .await
            .map_err(|err| NavigationError::hook(view.id(), Hook::Setup, err))?;
        let rendered = view
            .render(app, &args)
            .await
            .map_err(|err| NavigationError::hook(view.id(), Hook::Render, err));
        self.persist(app).await;
        rendered
    }

    /// Re-enters the location recorded in the state, e.g. after a restart.
    /// A saved view that is not resumable sends the user to [`DEFAULT_VIEW`]
    /// instead.
    pub async fn goto_current_location(&self, app: &App) -> Result<(), NavigationError> {
        let location = app.state().lock().await.current_loc.clone();
        match self.views.get(location.id.as_str()) {
            Some(view) if !view.resumable() => {
                info!(route = view.id(), "Saved view is not resumable; starting at {DEFAULT_VIEW}");
                self.goto(app, DEFAULT_VIEW, ViewArgs::new()).await
            }
            _ => self.goto(app, &location.id, location.data).await,
        }
    }

    async fn persist(&self, app: &App) {
        if let Err(err) = app.persist().await {
            warn!(error = %err, "Failed to persist state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use befall_api::{ApiClient, ApiContext, shared_state};
    use befall_registry::OperationRegistry;
    use befall_types::AppState;
    use befall_util::StateStore;

    type Events = Arc<Mutex<Vec<String>>>;

    struct Recording {
        id: &'static str,
        events: Events,
        fail_teardown: bool,
        resumable: bool,
    }

    impl Recording {
        fn new(id: &'static str, events: &Events) -> Arc<dyn View> {
            Arc::new(Self {
                id,
                events: Arc::clone(events),
                fail_teardown: false,
                resumable: true,
            })
        }

        fn record(&self, hook: &str) {
            self.events.lock().unwrap().push(format!("{}:{hook}", self.id));
        }
    }

    #[async_trait]
    impl View for Recording {
        fn id(&self) -> &'static str {
            self.id
        }

        fn description(&self) -> &'static str {
            "records its lifecycle"
        }

        fn resumable(&self) -> bool {
            self.resumable
        }

        async fn setup(&self, _app: &App) -> anyhow::Result<()> {
            self.record("setup");
            Ok(())
        }

        async fn render(&self, _app: &App, args: &ViewArgs) -> anyhow::Result<()> {
            self.record(&format!("render{args:?}"));
            Ok(())
        }

        async fn teardown(&self, _app: &App) -> anyhow::Result<()> {
            self.record("teardown");
            if self.fail_teardown {
                anyhow::bail!("stuck");
            }
            Ok(())
        }
    }

    fn app(store: Option<StateStore>) -> App {
        let ctx = ApiContext::new(ApiClient::new().unwrap(), shared_state(AppState::default()));
        App::new(ctx, Arc::new(OperationRegistry::new()), store)
    }

    fn two_views(events: &Events) -> Router {
        let mut router = Router::new();
        router.register(Recording::new("a", events));
        router.register(Recording::new("b", events));
        router
    }

    #[tokio::test]
    async fn teardown_runs_before_setup_of_the_next_view() {
        let events = Events::default();
        let router = two_views(&events);
        let app = app(None);

        router.goto(&app, "a", ViewArgs::new()).await.unwrap();
        router.goto(&app, "b", ViewArgs::new()).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["a:setup", "a:render{}", "a:teardown", "b:setup", "b:render{}"]
        );
        assert_eq!(app.state().lock().await.current_loc.id, "b");
    }

    #[tokio::test]
    async fn reentering_the_current_view_runs_the_full_cycle() {
        let events = Events::default();
        let router = two_views(&events);
        let app = app(None);

        router.goto(&app, "a", ViewArgs::new()).await.unwrap();
        router.goto(&app, "a", ViewArgs::new()).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["a:setup", "a:render{}", "a:teardown", "a:setup", "a:render{}"]
        );
    }

    #[tokio::test]
    async fn unknown_route_leaves_location_and_active_view_untouched() {
        let events = Events::default();
        let router = two_views(&events);
        let app = app(None);

        router.goto(&app, "a", ViewArgs::new()).await.unwrap();
        let err = router.goto(&app, "missing", ViewArgs::new()).await.unwrap_err();

        assert!(matches!(err, NavigationError::RouteNotFound(ref id) if id == "missing"));
        assert_eq!(app.state().lock().await.current_loc.id, "a");
        assert_eq!(router.active(), Some("a"));
        assert!(!events.lock().unwrap().contains(&"a:teardown".to_string()));
    }

    #[tokio::test]
    async fn failing_teardown_aborts_the_transition() {
        let events = Events::default();
        let mut router = Router::new();
        router.register(Arc::new(Recording {
            id: "sticky",
            events: Arc::clone(&events),
            fail_teardown: true,
            resumable: true,
        }));
        router.register(Recording::new("b", &events));
        let app = app(None);

        router.goto(&app, "sticky", ViewArgs::new()).await.unwrap();
        let err = router.goto(&app, "b", ViewArgs::new()).await.unwrap_err();

        assert!(matches!(err, NavigationError::Hook { hook: Hook::Teardown, .. }), "{err}");
        assert_eq!(app.state().lock().await.current_loc.id, "sticky");
        assert!(!events.lock().unwrap().contains(&"b:setup".to_string()));
    }

    #[tokio::test]
    async fn transitions_are_persisted_and_resumable() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let events = Events::default();
        let router = two_views(&events);
        let app = app(Some(store.clone()));

        let mut args = ViewArgs::new();
        args.insert("k".into(), "v".into());
        router.goto(&app, "b", args).await.unwrap();

        let saved: AppState = store.load().unwrap().expect("state written");
        assert_eq!(saved.current_loc.id, "b");
        assert_eq!(saved.current_loc.data.get("k").map(String::as_str), Some("v"));

        let resumed_events = Events::default();
        let resumed_router = two_views(&resumed_events);
        let resumed = app_with_state(saved);
        resumed_router.goto_current_location(&resumed).await.unwrap();
        assert_eq!(*resumed_events.lock().unwrap(), vec!["b:setup", "b:render{\"k\": \"v\"}"]);
    }

    #[tokio::test]
    async fn non_resumable_view_is_not_reentered_on_start() {
        let events = Events::default();
        let mut router = Router::new();
        router.register(Recording::new(DEFAULT_VIEW, &events));
        router.register(Arc::new(Recording {
            id: "once",
            events: Arc::clone(&events),
            fail_teardown: false,
            resumable: false,
        }));

        let mut state = AppState::default();
        state.current_loc = Location::new("once");
        let app = app_with_state(state);
        router.goto_current_location(&app).await.unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["root:setup", "root:render{}"]);
        assert_eq!(app.state().lock().await.current_loc.id, DEFAULT_VIEW);
    }

    fn app_with_state(state: AppState) -> App {
        let ctx = ApiContext::new(ApiClient::new().unwrap(), shared_state(state));
        App::new(ctx, Arc::new(OperationRegistry::new()), None)
    }
}
