//! Operation registry for the Befall shell.
//!
//! This crate provides the uniform wrapper that lets typed business
//! operations be stored side by side, bound from typed CLI arguments and
//! executed, plus the registry that indexes them and the completion engine
//! that reads their field tables.

pub mod binding;
pub mod completion;
pub mod operation;
pub mod registry;

pub use binding::{BindingError, bind_object, bind_request};
pub use completion::{CompletionEngine, ROUTE_KEY};
pub use operation::{
    NoRequest, Operation, OperationError, OperationKind, OperationResponse, TypedOperation, create_with_only_req,
    create_with_only_resp, create_with_req_and_resp,
};
pub use registry::{OperationCategory, OperationRegistry};
