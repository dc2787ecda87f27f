use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use watched_addons::{
    ActionContext, ActionError, ActionHandler, ActionType, AddonType, BoxFuture, DirectoryAction,
    DirectoryItem, DirectoryRequest, DirectoryResponse, FetchError, FetchRemote, RawWorkerAddonProps,
    RemoteRequest, RemoteResponse, RequestMeta, WorkerAddon, create_worker_addon, handler_fn,
    typed_handler_fn,
};

/// Answers every request with the requested URL as a JSON string.
struct EchoUrlFetchRemote;

impl FetchRemote for EchoUrlFetchRemote {
    fn fetch(&self, request: RemoteRequest) -> BoxFuture<'static, Result<RemoteResponse, FetchError>> {
        Box::pin(async move {
            Ok(RemoteResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: serde_json::to_vec(&request.url).unwrap(),
            })
        })
    }
}

fn minimal_addon() -> WorkerAddon {
    create_worker_addon(
        RawWorkerAddonProps::new("com.example.catalog")
            .with_name("Example Catalog")
            .with_resource(&["movie", "series"], &[ActionType::Directory]),
    )
    .unwrap()
}

fn sample_response() -> DirectoryResponse {
    DirectoryResponse {
        items: vec![DirectoryItem {
            id: "tt0133093".to_string(),
            item_type: "movie".to_string(),
            name: "The Matrix".to_string(),
            description: Some("A hacker learns the truth.".to_string()),
            poster: None,
        }],
        next_cursor: None,
    }
}

fn same_handler(a: &Arc<dyn ActionHandler>, b: &Arc<dyn ActionHandler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[test]
fn create_forces_worker_type() {
    let raw = RawWorkerAddonProps::from_json(serde_json::json!({
        "id": "com.example.reader",
        "type": "reader",
    }))
    .unwrap();

    let addon = create_worker_addon(raw).unwrap();
    assert_eq!(addon.props().addon_type, AddonType::Worker);
}

#[test]
fn create_accepts_non_string_type() {
    let raw = RawWorkerAddonProps::from_json(serde_json::json!({ "id": "x", "type": 7 })).unwrap();

    let addon = create_worker_addon(raw).unwrap();
    assert_eq!(addon.props().id, "x");
    assert_eq!(addon.props().addon_type, AddonType::Worker);
}

#[test]
fn create_surfaces_validation_errors() {
    let raw = RawWorkerAddonProps::from_json(serde_json::json!({ "name": "No id" })).unwrap();
    let err = create_worker_addon(raw).unwrap_err();
    assert!(matches!(err, ActionError::Validation(_)));
}

#[tokio::test]
async fn directory_handler_output_is_returned_unmodified() {
    let mut addon = minimal_addon();
    let handler: Arc<dyn ActionHandler> =
        Arc::new(typed_handler_fn::<DirectoryAction, _, _>(|_req, _ctx| async move {
            Ok(sample_response())
        }));
    addon
        .register_shared_handler(ActionType::Directory, handler.clone())
        .unwrap();

    let found = addon.get_handler(ActionType::Directory).unwrap();
    assert!(same_handler(&found, &handler));

    let addon = Arc::new(addon);
    let input = serde_json::to_value(DirectoryRequest {
        search: Some("matrix".to_string()),
        ..Default::default()
    })
    .unwrap();
    let output = found
        .handle(input, ActionContext::new_empty(addon))
        .await
        .unwrap();

    let output: DirectoryResponse = serde_json::from_value(output).unwrap();
    assert_eq!(output, sample_response());
}

#[test]
fn second_directory_registration_fails_and_keeps_first() {
    let mut addon = minimal_addon();
    let first: Arc<dyn ActionHandler> =
        Arc::new(handler_fn(|_input, _ctx| async move { Ok(serde_json::json!("first")) }));
    let second: Arc<dyn ActionHandler> =
        Arc::new(handler_fn(|_input, _ctx| async move { Ok(serde_json::json!("second")) }));

    addon
        .register_shared_handler(ActionType::Directory, first.clone())
        .unwrap();
    let err = addon
        .register_shared_handler(ActionType::Directory, second)
        .unwrap_err();

    assert!(matches!(err, ActionError::DuplicateHandler(ActionType::Directory)));
    assert!(same_handler(
        &addon.get_handler(ActionType::Directory).unwrap(),
        &first
    ));
}

#[test]
fn register_unregister_leaves_no_residue() {
    let mut addon = minimal_addon();
    for action in ActionType::ALL {
        addon
            .register_handler(action, handler_fn(|input, _ctx| async move { Ok(input) }))
            .unwrap();
        addon.unregister_handler(action);
        addon.unregister_handler(action);
        assert!(matches!(
            addon.get_handler(action),
            Err(ActionError::HandlerNotFound(a)) if a == action
        ));
    }
    assert!(addon.is_empty());
}

#[tokio::test]
async fn handlers_receive_request_and_fetch_capability() {
    let mut addon = minimal_addon();
    addon
        .register_handler(
            ActionType::Item,
            handler_fn(|_input, ctx: ActionContext| async move {
                let url = format!(
                    "https://api.example.com{}?addon={}",
                    ctx.request.uri.path(),
                    ctx.addon.props().id
                );
                let response = ctx.fetch_remote.fetch(RemoteRequest::get(url)).await?;
                let echoed: String = response.json()?;
                Ok::<_, ActionError>(serde_json::json!({ "fetched": echoed }))
            }),
        )
        .unwrap();

    let addon = Arc::new(addon);
    let request = RequestMeta::new(http::Method::POST, "/item".parse().unwrap());
    let context = ActionContext::new(request, addon.clone(), Arc::new(EchoUrlFetchRemote));

    let output = addon
        .get_handler(ActionType::Item)
        .unwrap()
        .handle(serde_json::json!({}), context)
        .await
        .unwrap();

    assert_eq!(
        output["fetched"],
        "https://api.example.com/item?addon=com.example.catalog"
    );
}
