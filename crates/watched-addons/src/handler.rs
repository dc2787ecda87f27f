//! Action handler types.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ActionContext, ActionError, ActionType, DirectoryRequest, DirectoryResponse};

/// A boxed future for async action handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for types that can handle action invocations.
///
/// Payloads are untyped JSON at this level. See [`TypedAction`] for
/// handlers with pinned input and output types.
pub trait ActionHandler: Send + Sync {
    /// Execute the action with the given input and context.
    fn handle(
        &self,
        input: serde_json::Value,
        context: ActionContext,
    ) -> BoxFuture<'static, Result<serde_json::Value, ActionError>>;
}

/// Wrapper to create an ActionHandler from a function.
pub struct FnHandler<F>(pub F);

impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(serde_json::Value, ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, ActionError>> + Send + 'static,
{
    fn handle(
        &self,
        input: serde_json::Value,
        context: ActionContext,
    ) -> BoxFuture<'static, Result<serde_json::Value, ActionError>> {
        Box::pin((self.0)(input, context))
    }
}

/// Create an action handler from an async function.
///
/// # Example
/// ```ignore
/// let handler = handler_fn(|input, ctx| async move {
///     Ok(serde_json::json!({ "echo": input }))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(serde_json::Value, ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, ActionError>> + Send + 'static,
{
    FnHandler(f)
}

/// An action with fixed input and output types.
pub trait TypedAction: Send + Sync + 'static {
    const ACTION: ActionType;
    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;
}

/// The `directory` action.
pub struct DirectoryAction;

impl TypedAction for DirectoryAction {
    const ACTION: ActionType = ActionType::Directory;
    type Input = DirectoryRequest;
    type Output = DirectoryResponse;
}

/// Handler for a [`TypedAction`], decoding input and encoding output as JSON.
pub struct TypedHandler<A, F> {
    f: F,
    _action: PhantomData<fn() -> A>,
}

impl<A, F, Fut> ActionHandler for TypedHandler<A, F>
where
    A: TypedAction,
    F: Fn(A::Input, ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<A::Output, ActionError>> + Send + 'static,
{
    fn handle(
        &self,
        input: serde_json::Value,
        context: ActionContext,
    ) -> BoxFuture<'static, Result<serde_json::Value, ActionError>> {
        let input = match serde_json::from_value::<A::Input>(input) {
            Ok(input) => input,
            Err(e) => {
                return Box::pin(async move {
                    Err(ActionError::InvalidInput {
                        action: A::ACTION,
                        message: e.to_string(),
                    })
                });
            }
        };

        let fut = (self.f)(input, context);
        Box::pin(async move {
            let output = fut.await?;
            serde_json::to_value(output).map_err(|e| ActionError::InvalidOutput {
                action: A::ACTION,
                message: e.to_string(),
            })
        })
    }
}

/// Create a typed action handler from an async function.
pub fn typed_handler_fn<A, F, Fut>(f: F) -> TypedHandler<A, F>
where
    A: TypedAction,
    F: Fn(A::Input, ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<A::Output, ActionError>> + Send + 'static,
{
    TypedHandler {
        f,
        _action: PhantomData,
    }
}
