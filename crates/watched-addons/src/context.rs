//! Context passed to action handlers.

use std::sync::Arc;

use http::{HeaderMap, Method, Uri};

use crate::{
    ActionError, ActionHandler, ActionType, DisabledFetchRemote, FetchRemote, WorkerAddon,
    WorkerAddonProps,
};

/// Metadata of the inbound request that triggered an action.
///
/// Transport-neutral: a transport copies what it knows into this struct.
#[derive(Clone, Debug, Default)]
pub struct RequestMeta {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestMeta {
    /// Create request metadata with no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
        }
    }

    /// Replace the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Copy method, URI and headers out of an `http` request.
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }

    /// Get a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Read-only view of the addon that owns a running handler.
///
/// Handlers can inspect the addon and look up sibling handlers, but cannot
/// change the handler table they are dispatched from.
#[derive(Clone, Debug)]
pub struct AddonHandle {
    addon: Arc<WorkerAddon>,
}

impl AddonHandle {
    /// Wrap a shared addon.
    pub fn new(addon: Arc<WorkerAddon>) -> Self {
        Self { addon }
    }

    /// Get the addon properties.
    pub fn props(&self) -> &WorkerAddonProps {
        self.addon.props()
    }

    /// Get the handler registered for an action.
    pub fn get_handler(&self, action: ActionType) -> Result<Arc<dyn ActionHandler>, ActionError> {
        self.addon.get_handler(action)
    }
}

/// Everything a handler gets besides its input.
#[derive(Clone)]
pub struct ActionContext {
    /// The inbound request.
    pub request: RequestMeta,
    /// The addon the handler is registered on.
    pub addon: AddonHandle,
    /// Capability for outbound calls.
    pub fetch_remote: Arc<dyn FetchRemote>,
}

impl ActionContext {
    /// Create a context for one handler invocation.
    pub fn new(
        request: RequestMeta,
        addon: Arc<WorkerAddon>,
        fetch_remote: Arc<dyn FetchRemote>,
    ) -> Self {
        Self {
            request,
            addon: AddonHandle::new(addon),
            fetch_remote,
        }
    }

    /// Context with an empty request and remote fetching disabled.
    pub fn new_empty(addon: Arc<WorkerAddon>) -> Self {
        Self::new(RequestMeta::default(), addon, Arc::new(DisabledFetchRemote))
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("request", &self.request)
            .field("addon", &self.addon.props().id)
            .finish_non_exhaustive()
    }
}
