//! Uniform, object-safe wrapper around typed business operations.
//!
//! Business operations are plain async functions with one of three shapes:
//! response only, request only, or request and response. [`TypedOperation`]
//! adapts each shape to the [`Operation`] trait so the registry can hold
//! heterogeneous operations behind `Arc<dyn Operation>` and the shell can
//! bind arguments and execute them without knowing the concrete types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use befall_api::{ApiContext, ApiError};
use befall_types::{ApiRequest, ApiResponse, RequestShape, ResponseShape, TypedArgs};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::binding::{BindingError, bind_request};

/// Which of the three handler shapes an operation has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    ResponseOnly,
    RequestOnly,
    RequestAndResponse,
}

impl OperationKind {
    pub fn takes_request(&self) -> bool {
        !matches!(self, OperationKind::ResponseOnly)
    }

    pub fn returns_response(&self) -> bool {
        !matches!(self, OperationKind::RequestOnly)
    }
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("operation {id} has not been bound to any arguments")]
    NotBound { id: String },
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    /// JSON encoding of the response; `{}` for request-only operations.
    pub json: Value,
    /// Pretty `Debug` rendering of the typed response.
    pub debug: String,
}

impl OperationResponse {
    fn empty() -> Self {
        Self {
            json: Value::Object(Map::new()),
            debug: "{}".to_string(),
        }
    }

    fn of<T: ApiResponse>(value: &T) -> Result<Self, OperationError> {
        Ok(Self {
            json: serde_json::to_value(value).map_err(OperationError::Encode)?,
            debug: format!("{value:#?}"),
        })
    }
}

#[async_trait]
pub trait Operation: Send + Sync + fmt::Debug {
    /// Unique identifier, e.g. `getUser`.
    fn id(&self) -> &str;

    fn kind(&self) -> OperationKind;

    /// Returns a new instance with its request bound from `args`.
    ///
    /// The receiver is left untouched, so a registered operation can be bound
    /// any number of times. Response-only operations return an unchanged
    /// copy.
    fn populate_with_args(&self, args: &TypedArgs) -> Result<Box<dyn Operation>, BindingError>;

    /// Field table of the request type, if the operation takes one.
    fn request_shape(&self) -> Option<RequestShape>;

    /// Schema of the response type, if the operation returns one.
    fn response_shape(&self) -> Option<ResponseShape>;

    /// JSON encoding of the bound request, if any.
    fn bound_request(&self) -> Option<Value>;

    /// Pretty `Debug` rendering of the bound request, if any.
    fn bound_request_debug(&self) -> Option<String>;

    async fn execute(&self, ctx: ApiContext) -> Result<OperationResponse, OperationError>;
}

/// Request type of response-only operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoRequest {}

impl ApiRequest for NoRequest {
    const SHAPE: RequestShape = RequestShape::new("NoRequest", &[]);
}

type ResponseOnlyFn<Resp> = Arc<dyn Fn(ApiContext) -> BoxFuture<'static, Result<Resp, ApiError>> + Send + Sync>;
type RequestOnlyFn<Req> = Arc<dyn Fn(ApiContext, Req) -> BoxFuture<'static, Result<(), ApiError>> + Send + Sync>;
type RequestResponseFn<Req, Resp> =
    Arc<dyn Fn(ApiContext, Req) -> BoxFuture<'static, Result<Resp, ApiError>> + Send + Sync>;

enum Handler<Req, Resp> {
    ResponseOnly(ResponseOnlyFn<Resp>),
    RequestOnly(RequestOnlyFn<Req>),
    RequestAndResponse(RequestResponseFn<Req, Resp>),
}

impl<Req, Resp> Clone for Handler<Req, Resp> {
    fn clone(&self) -> Self {
        match self {
            Handler::ResponseOnly(f) => Handler::ResponseOnly(Arc::clone(f)),
            Handler::RequestOnly(f) => Handler::RequestOnly(Arc::clone(f)),
            Handler::RequestAndResponse(f) => Handler::RequestAndResponse(Arc::clone(f)),
        }
    }
}

/// A typed handler plus the request bound to it, if any.
pub struct TypedOperation<Req, Resp> {
    id: String,
    handler: Handler<Req, Resp>,
    bound: Option<Req>,
}

impl<Req: Clone, Resp> Clone for TypedOperation<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            handler: self.handler.clone(),
            bound: self.bound.clone(),
        }
    }
}

impl<Req: fmt::Debug, Resp> fmt::Debug for TypedOperation<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedOperation")
            .field("id", &self.id)
            .field("kind", &self.handler_kind())
            .field("bound", &self.bound)
            .finish()
    }
}

impl<Req, Resp> TypedOperation<Req, Resp> {
    fn handler_kind(&self) -> OperationKind {
        match self.handler {
            Handler::ResponseOnly(_) => OperationKind::ResponseOnly,
            Handler::RequestOnly(_) => OperationKind::RequestOnly,
            Handler::RequestAndResponse(_) => OperationKind::RequestAndResponse,
        }
    }

    fn bound_or_err(&self) -> Result<Req, OperationError>
    where
        Req: Clone,
    {
        self.bound.clone().ok_or_else(|| OperationError::NotBound { id: self.id.clone() })
    }
}

#[async_trait]
impl<Req, Resp> Operation for TypedOperation<Req, Resp>
where
    Req: ApiRequest,
    Resp: ApiResponse,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> OperationKind {
        self.handler_kind()
    }

    fn populate_with_args(&self, args: &TypedArgs) -> Result<Box<dyn Operation>, BindingError> {
        if !self.kind().takes_request() {
            return Ok(Box::new(self.clone()));
        }
        let request = bind_request::<Req>(args)?;
        debug!(operation = %self.id, request = ?request, "Bound request");
        Ok(Box::new(Self {
            id: self.id.clone(),
            handler: self.handler.clone(),
            bound: Some(request),
        }))
    }

    fn request_shape(&self) -> Option<RequestShape> {
        self.kind().takes_request().then_some(Req::SHAPE)
    }

    fn response_shape(&self) -> Option<ResponseShape> {
        self.kind().returns_response().then(ResponseShape::of::<Resp>)
    }

    fn bound_request(&self) -> Option<Value> {
        self.bound.as_ref().and_then(|request| serde_json::to_value(request).ok())
    }

    fn bound_request_debug(&self) -> Option<String> {
        self.bound.as_ref().map(|request| format!("{request:#?}"))
    }

    async fn execute(&self, ctx: ApiContext) -> Result<OperationResponse, OperationError> {
        debug!(operation = %self.id, "Executing operation");
        match &self.handler {
            Handler::ResponseOnly(handler) => {
                let response = handler(ctx).await?;
                OperationResponse::of(&response)
            }
            Handler::RequestOnly(handler) => {
                handler(ctx, self.bound_or_err()?).await?;
                Ok(OperationResponse::empty())
            }
            Handler::RequestAndResponse(handler) => {
                let response = handler(ctx, self.bound_or_err()?).await?;
                OperationResponse::of(&response)
            }
        }
    }
}

/// Wraps an operation that takes no request.
pub fn create_with_only_resp<Resp, F, Fut>(id: impl Into<String>, handler: F) -> Arc<dyn Operation>
where
    Resp: ApiResponse,
    F: Fn(ApiContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, ApiError>> + Send + 'static,
{
    let handler: ResponseOnlyFn<Resp> = Arc::new(move |ctx| handler(ctx).boxed());
    Arc::new(TypedOperation::<NoRequest, Resp> {
        id: id.into(),
        handler: Handler::ResponseOnly(handler),
        bound: None,
    })
}

/// Wraps an operation that returns nothing on success.
pub fn create_with_only_req<Req, F, Fut>(id: impl Into<String>, handler: F) -> Arc<dyn Operation>
where
    Req: ApiRequest,
    F: Fn(ApiContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    let handler: RequestOnlyFn<Req> = Arc::new(move |ctx, req| handler(ctx, req).boxed());
    Arc::new(TypedOperation::<Req, ()> {
        id: id.into(),
        handler: Handler::RequestOnly(handler),
        bound: None,
    })
}

/// Wraps an operation with both a request and a response.
pub fn create_with_req_and_resp<Req, Resp, F, Fut>(id: impl Into<String>, handler: F) -> Arc<dyn Operation>
where
    Req: ApiRequest,
    Resp: ApiResponse,
    F: Fn(ApiContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, ApiError>> + Send + 'static,
{
    let handler: RequestResponseFn<Req, Resp> = Arc::new(move |ctx, req| handler(ctx, req).boxed());
    Arc::new(TypedOperation::<Req, Resp> {
        id: id.into(),
        handler: Handler::RequestAndResponse(handler),
        bound: None,
    })
}
