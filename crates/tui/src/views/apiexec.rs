//! Views that list and run registered API operations.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use befall_registry::{CompletionEngine, OperationError, OperationRegistry, ROUTE_KEY};
use befall_util::{coerce_args, lex_shell_like_ranged};

use super::{arg, flag};
use crate::app::App;
use crate::view::{View, ViewArg, ViewArgs};

/// Arguments starting with this prefix steer the view and are never sent.
const CONTROL_PREFIX: &str = "__";

const LS_ARGS: &[ViewArg] = &[ViewArg::new(
    ROUTE_KEY,
    "Show the request and response types of this operation",
    "string",
)];

const EXEC_ARGS: &[ViewArg] = &[
    ViewArg::new(ROUTE_KEY, "The operation to execute", "string"),
    ViewArg::new("__debug", "Print the route, the typed arguments and progress", "bool"),
    ViewArg::new("__spew.req", "Dump the bound request", "bool"),
    ViewArg::new("__spew.resp", "Dump the response instead of printing JSON", "bool"),
    ViewArg::new("__file", "Write the response to this file", "string"),
    ViewArg::new("__file.mode", "Format of the written file: json or spew", "string"),
];

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lists operations by category, or describes one of them.
pub struct ApiExecLsView;

impl ApiExecLsView {
    fn describe(app: &App, route: &str) -> Result<()> {
        let operation = app
            .registry
            .lookup(route)
            .ok_or_else(|| anyhow!("no API operation named {route}"))?;
        let console = app.console();
        console.println(format!("Route ID: {}", operation.id()));
        console.println(match operation.request_shape() {
            Some(shape) => format!("Route ReqType: {shape}"),
            None => "Route ReqType: none".to_string(),
        });
        console.println(match operation.response_shape() {
            Some(shape) => format!("Route RespType: {shape}"),
            None => "Route RespType: none".to_string(),
        });
        Ok(())
    }

    fn list(app: &App) {
        let console = app.console();
        for category in app.registry.list_categories() {
            let title = title_case(&category.name);
            console.println(&title);
            console.println("=".repeat(title.chars().count()));
            for operation in &category.operations {
                console.println(operation.id());
            }
            console.println("");
        }
    }
}

#[async_trait]
impl View for ApiExecLsView {
    fn id(&self) -> &'static str {
        "apiexec.ls"
    }

    fn description(&self) -> &'static str {
        "Lists all available API endpoints that can be tested"
    }

    fn args(&self) -> &'static [ViewArg] {
        LS_ARGS
    }

    async fn render(&self, app: &App, args: &ViewArgs) -> Result<()> {
        match arg(args, ROUTE_KEY) {
            Some(route) => Self::describe(app, route),
            None => {
                Self::list(app);
                Ok(())
            }
        }
    }

    fn complete(&self, app: &App, line: &str) -> Option<Vec<String>> {
        Some(complete_route(&app.registry, self.id(), line))
    }
}

/// Completes `<command> route=<id>` for views that only take a route.
fn complete_route(registry: &OperationRegistry, command: &str, line: &str) -> Vec<String> {
    let tokens = lex_shell_like_ranged(line);
    let ends_with_space = line.chars().last().is_some_and(char::is_whitespace);
    let fragment = match tokens.as_slice() {
        [_] if ends_with_space => "",
        [_, last] if !ends_with_space => last.text,
        _ => return Vec::new(),
    };
    let typed = fragment
        .strip_prefix(ROUTE_KEY)
        .and_then(|rest| rest.strip_prefix('='))
        .unwrap_or(fragment)
        .to_lowercase();
    registry
        .ids()
        .into_iter()
        .filter(|id| id.to_lowercase().starts_with(&typed))
        .map(|id| format!("{command} {ROUTE_KEY}={id}"))
        .collect()
}

/// Binds typed arguments to an operation and executes it.
pub struct ApiExecView;

#[async_trait]
impl View for ApiExecView {
    fn id(&self) -> &'static str {
        "apiexec.exec"
    }

    fn description(&self) -> &'static str {
        "Execute/Make a request to an API endpoint that can be tested"
    }

    fn args(&self) -> &'static [ViewArg] {
        EXEC_ARGS
    }

    fn resumable(&self) -> bool {
        false
    }

    async fn render(&self, app: &App, args: &ViewArgs) -> Result<()> {
        let route = arg(args, ROUTE_KEY).ok_or_else(|| anyhow!("missing required argument {ROUTE_KEY}"))?;
        let operation = app
            .registry
            .lookup(route)
            .ok_or_else(|| anyhow!("no API operation named {route}"))?;
        let debug = flag(args, "__debug")?;
        let spew_req = flag(args, "__spew.req")?;
        let spew_resp = flag(args, "__spew.resp")?;
        let file = arg(args, "__file");
        let file_mode = arg(args, "__file.mode").unwrap_or("json");
        if !matches!(file_mode, "json" | "spew") {
            bail!("__file.mode must be json or spew, got {file_mode:?}");
        }

        let typed = coerce_args(
            args.iter()
                .filter(|(key, _)| key.as_str() != ROUTE_KEY && !key.starts_with(CONTROL_PREFIX))
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )?;

        let console = app.console();
        if debug {
            console.println(format!("Route ID: {}", operation.id()));
            console.println(format!("Route Req Send: {typed:#?}"));
        }

        let bound = operation.populate_with_args(&typed)?;
        if spew_req {
            console.println(bound.bound_request_debug().unwrap_or_else(|| "<no request>".to_string()));
        }

        let response = match bound.execute(app.ctx.clone()).await {
            Ok(response) => response,
            Err(OperationError::Api(err)) if err.is_session_error() => {
                return Err(anyhow!(err).context("this operation needs a session; run `login` first"));
            }
            Err(err) => return Err(err.into()),
        };
        if debug {
            console.println("Route Resp Recv:");
        }

        if let Some(path) = file {
            let contents = match file_mode {
                "spew" => response.debug.clone(),
                _ => serde_json::to_string_pretty(&response.json)?,
            };
            write_output(Path::new(path), &contents).await?;
            console.println(format!("Wrote response to {path}"));
        } else if spew_resp {
            console.println(&response.debug);
        } else {
            console.println(serde_json::to_string_pretty(&response.json)?);
        }
        Ok(())
    }

    fn complete(&self, app: &App, line: &str) -> Option<Vec<String>> {
        Some(CompletionEngine::new(&app.registry).with_command(self.id()).complete(line))
    }
}

async fn write_output(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use befall_api::ops::users::GetUserData;
    use befall_api::{ApiClient, ApiContext, ApiError, shared_state};
    use befall_registry::{create_with_only_req, create_with_req_and_resp};
    use befall_types::AppState;
    use serde_json::{Value, json};

    use crate::app::Console;

    async fn echo(_ctx: ApiContext, data: GetUserData) -> Result<Value, ApiError> {
        Ok(json!({ "id": data.id }))
    }

    async fn forget(_ctx: ApiContext, _data: GetUserData) -> Result<(), ApiError> {
        Ok(())
    }

    fn app() -> App {
        let mut registry = OperationRegistry::new();
        registry.register("user", create_with_req_and_resp("getUser", echo));
        registry.register("platform", create_with_only_req("forgetUser", forget));
        let ctx = ApiContext::new(ApiClient::new().unwrap(), shared_state(AppState::default()));
        App::new(ctx, Arc::new(registry), None).with_console(Console::capture())
    }

    fn args(pairs: &[(&str, &str)]) -> ViewArgs {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn ls_prints_categories_with_underlines() {
        let app = app();
        ApiExecLsView.render(&app, &ViewArgs::new()).await.unwrap();
        assert_eq!(app.console().captured(), "User\n====\ngetUser\n\nPlatform\n========\nforgetUser\n\n");
    }

    #[tokio::test]
    async fn ls_describes_one_route() {
        let app = app();
        ApiExecLsView.render(&app, &args(&[("route", "getUser")])).await.unwrap();
        let out = app.console().captured();
        assert!(out.starts_with("Route ID: getUser\nRoute ReqType: GetUserData {"));
        assert!(out.contains("Route RespType: "));
        assert!(ApiExecLsView.render(&app, &args(&[("route", "nope")])).await.is_err());
    }

    #[tokio::test]
    async fn exec_prints_the_json_response() {
        let app = app();
        ApiExecView.render(&app, &args(&[("route", "getUser"), ("id", "7")])).await.unwrap();
        let printed: Value = serde_json::from_str(&app.console().captured()).unwrap();
        assert_eq!(printed, json!({ "id": "7" }));
    }

    #[tokio::test]
    async fn exec_debug_traces_and_request_only_yields_empty_object() {
        let app = app();
        ApiExecView
            .render(&app, &args(&[("route", "forgetUser"), ("id", "7"), ("__debug", "true")]))
            .await
            .unwrap();
        let out = app.console().captured();
        assert!(out.starts_with("Route ID: forgetUser\nRoute Req Send: "));
        assert!(out.contains("Route Resp Recv:\n{}"));
    }

    #[tokio::test]
    async fn exec_writes_spew_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let app = app();
        let path_arg = path.to_string_lossy().to_string();
        ApiExecView
            .render(
                &app,
                &args(&[("route", "getUser"), ("id", "9"), ("__file", &path_arg), ("__file.mode", "spew")]),
            )
            .await
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"id\""));
        assert!(written.contains("\"9\""));
        assert!(app.console().captured().starts_with("Wrote response to "));
    }

    #[tokio::test]
    async fn exec_rejects_missing_route_and_bad_types() {
        let app = app();
        let err = ApiExecView.render(&app, &ViewArgs::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required argument route");
        assert!(ApiExecView.render(&app, &args(&[("route", "missing")])).await.is_err());
        let err = ApiExecView
            .render(&app, &args(&[("route", "getUser"), ("id::int32", "x")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to convert id=x to int32"), "{err}");
    }

    #[test]
    fn completion_delegates_to_the_registry() {
        let app = app();
        assert_eq!(
            ApiExecLsView.complete(&app, "apiexec.ls route=get"),
            Some(vec!["apiexec.ls route=getUser".to_string()])
        );
        assert_eq!(
            ApiExecView.complete(&app, "apiexec.exec getUser "),
            Some(vec!["apiexec.exec getUser id=".to_string()])
        );
    }
}
