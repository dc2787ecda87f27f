//! Transport-neutral action dispatch.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::{ActionContext, ActionError, ActionType, FetchRemote, RequestMeta, WorkerAddon};

/// Resolves action names to handlers of one addon and invokes them.
///
/// This is the sequence a transport runs per inbound request: parse the
/// action name, look up the handler, build the context, await the result.
#[derive(Clone)]
pub struct ActionDispatcher {
    addon: Arc<WorkerAddon>,
    fetch_remote: Arc<dyn FetchRemote>,
}

impl ActionDispatcher {
    /// Dispatch to `addon`, handing `fetch_remote` to every handler.
    pub fn new(addon: Arc<WorkerAddon>, fetch_remote: Arc<dyn FetchRemote>) -> Self {
        Self {
            addon,
            fetch_remote,
        }
    }

    /// Get the addon being dispatched to.
    pub fn addon(&self) -> &Arc<WorkerAddon> {
        &self.addon
    }

    /// Invoke the handler for `action_name` with a JSON input.
    pub async fn dispatch(
        &self,
        action_name: &str,
        input: serde_json::Value,
        request: RequestMeta,
    ) -> Result<serde_json::Value, ActionError> {
        let action: ActionType = action_name
            .parse()
            .map_err(|_| ActionError::UnknownAction(action_name.to_string()))?;
        self.dispatch_action(action, input, request).await
    }

    /// Invoke the handler for a known action with a JSON input.
    pub async fn dispatch_action(
        &self,
        action: ActionType,
        input: serde_json::Value,
        request: RequestMeta,
    ) -> Result<serde_json::Value, ActionError> {
        let handler = self.addon.get_handler(action)?;
        let context = ActionContext::new(request, self.addon.clone(), self.fetch_remote.clone());

        debug!("Dispatching \"{action}\" to addon {}", self.addon.props().id);
        let result = handler.handle(input, context).await;

        if let Err(e) = &result {
            if e.is_reportable() {
                error!("Action \"{action}\" of addon {} failed: {e}", self.addon.props().id);
            } else {
                warn!("Action \"{action}\" of addon {} failed: {e}", self.addon.props().id);
            }
        }

        result
    }
}
