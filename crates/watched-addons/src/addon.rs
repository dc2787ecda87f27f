//! Worker addon - the action handler registry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::{debug, warn};

use crate::{
    ActionContext, ActionError, ActionHandler, ActionType, RawWorkerAddonProps, TypedAction,
    WorkerAddonProps, typed_handler_fn, validate_worker_addon_props,
};

/// An addon exposing a set of actions whose handlers are supplied at runtime.
///
/// Holds the validated addon properties and at most one handler per action.
/// Handlers are registered through `&mut self` during startup; once the addon
/// is shared behind an `Arc` the table can only be read.
pub struct WorkerAddon {
    props: WorkerAddonProps,
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl WorkerAddon {
    /// Create an addon from already validated properties.
    pub fn new(props: WorkerAddonProps) -> Self {
        Self {
            props,
            handlers: HashMap::new(),
        }
    }

    /// Validate raw properties and create an addon with no handlers.
    pub fn create(raw: RawWorkerAddonProps) -> Result<Self, ActionError> {
        let props = validate_worker_addon_props(raw)?;
        debug!("Created worker addon {} v{}", props.id, props.version);
        Ok(Self::new(props))
    }

    /// Get the addon properties.
    pub fn props(&self) -> &WorkerAddonProps {
        &self.props
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Handler Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a handler for an action.
    ///
    /// Fails if the action already has a handler; the existing one is kept.
    pub fn register_handler<H: ActionHandler + 'static>(
        &mut self,
        action: ActionType,
        handler: H,
    ) -> Result<(), ActionError> {
        self.register_shared_handler(action, Arc::new(handler))
    }

    /// Register an already shared handler. [`Self::get_handler`] returns
    /// this same `Arc`.
    pub fn register_shared_handler(
        &mut self,
        action: ActionType,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), ActionError> {
        if self.handlers.contains_key(&action) {
            return Err(ActionError::DuplicateHandler(action));
        }

        if !self.is_declared(action) {
            warn!(
                "Addon {} registers a handler for undeclared action \"{action}\"",
                self.props.id
            );
        }

        self.handlers.insert(action, handler);
        debug!("Addon {} registered handler for \"{action}\"", self.props.id);
        Ok(())
    }

    /// Register a handler with pinned input and output types.
    pub fn register_typed_handler<A, F, Fut>(&mut self, f: F) -> Result<(), ActionError>
    where
        A: TypedAction,
        F: Fn(A::Input, ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A::Output, ActionError>> + Send + 'static,
    {
        self.register_handler(A::ACTION, typed_handler_fn::<A, F, Fut>(f))
    }

    /// Remove the handler for an action. Removing a missing handler is a no-op.
    pub fn unregister_handler(&mut self, action: ActionType) {
        if self.handlers.remove(&action).is_some() {
            debug!("Addon {} unregistered handler for \"{action}\"", self.props.id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the handler registered for an action.
    pub fn get_handler(&self, action: ActionType) -> Result<Arc<dyn ActionHandler>, ActionError> {
        self.handlers
            .get(&action)
            .cloned()
            .ok_or(ActionError::HandlerNotFound(action))
    }

    /// Actions declared across the addon's resources.
    pub fn declared_actions(&self) -> Vec<ActionType> {
        self.props.declared_actions()
    }

    /// Whether any resource declares the action.
    pub fn is_declared(&self, action: ActionType) -> bool {
        self.props
            .resources
            .iter()
            .any(|r| r.actions.contains(&action))
    }

    /// Actions that currently have a handler, sorted.
    pub fn registered_actions(&self) -> Vec<ActionType> {
        let mut actions: Vec<_> = self.handlers.keys().copied().collect();
        actions.sort();
        actions
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for WorkerAddon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAddon")
            .field("props", &self.props)
            .field("handlers", &self.registered_actions())
            .finish()
    }
}

/// Validate raw properties and create a worker addon.
pub fn create_worker_addon(raw: RawWorkerAddonProps) -> Result<WorkerAddon, ActionError> {
    WorkerAddon::create(raw)
}
