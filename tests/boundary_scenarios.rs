//! The six boundary scenarios from spec.md §8, driven end to end
//! through `DavHandler::handle` over a `MemoryBackend`, scripting the
//! LLM transport with `FakeTransport` (requires the `test-util`
//! feature; see `Cargo.toml`'s self-referencing dev-dependency).

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};

use dav_genesis::dialect::FinderDialect;
use dav_genesis::handler::{Backend, DavBuilder, DavHandler};
use dav_genesis::llm::events::{OutputItem, ResponseEvent};
use dav_genesis::llm::fake::FakeTransport;
use dav_genesis::llm::{LlmTransport, Orchestrator};
use dav_genesis::path::Path;
use dav_genesis::tracker::Tracker;
use dav_genesis::MemoryBackend;

fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

fn text_body(s: &str) -> Full<Bytes> {
    Full::new(Bytes::from(s.as_bytes().to_vec()))
}

async fn body_string(resp: http::Response<Full<Bytes>>) -> (StatusCode, String) {
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// One complete tool call: `OutputItemAdded` naming the tool, then
/// `FunctionCallArgumentsDone` carrying the whole JSON payload at once —
/// the runner doesn't care whether the deltas were fragmented.
fn tool_call(name: &str, arguments_json: &str) -> Vec<ResponseEvent> {
    vec![
        ResponseEvent::OutputItemAdded {
            item: OutputItem {
                kind: "function_call".to_string(),
                id: Some("item_1".to_string()),
                name: Some(name.to_string()),
                call_id: Some("call_1".to_string()),
                arguments: None,
            },
        },
        ResponseEvent::FunctionCallArgumentsDone {
            item_id: "item_1".to_string(),
            arguments: Some(arguments_json.to_string()),
        },
    ]
}

async fn handler_with_orchestrator(
    events: Vec<ResponseEvent>,
) -> (DavHandler<MemoryBackend>, Arc<FakeTransport>) {
    let handler = DavBuilder::new(Backend::Memory).build_memory().await;
    let transport = Arc::new(FakeTransport::new(events));
    let orchestrator = Arc::new(Orchestrator::new(
        handler.fs(),
        transport.clone() as Arc<dyn LlmTransport>,
        None,
        Arc::new(Tracker::new()),
        "test-model".to_string(),
    ));
    (handler.with_orchestrator(orchestrator), transport)
}

#[tokio::test]
async fn empty_put_triggers_exactly_one_fabrication() {
    let (handler, transport) =
        handler_with_orchestrator(tool_call("emit_file_content", r#"{"content":"fabricated hello"}"#)).await;

    let put = Request::builder().method("PUT").uri("/hello.txt").body(empty_body()).unwrap();
    let resp = handler.handle(put).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let get = Request::builder().method("GET").uri("/hello.txt").body(empty_body()).unwrap();
    let (status, body) = body_string(handler.handle(get).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fabricated hello");
    assert_eq!(transport.requests_seen(), 1);
}

#[tokio::test]
async fn missing_get_fabricates_and_persists() {
    let (handler, transport) =
        handler_with_orchestrator(tool_call("emit_file_content", r#"{"content":"# hello"}"#)).await;

    let get = Request::builder().method("GET").uri("/generated.md").body(empty_body()).unwrap();
    let (status, body) = body_string(handler.handle(get).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "# hello");
    assert_eq!(transport.requests_seen(), 1);

    let path = Path::parse("/generated.md").unwrap();
    assert!(handler.fs().exists(&path).await);
}

#[tokio::test]
async fn propfind_on_empty_directory_fabricates_once() {
    let (handler, transport) = handler_with_orchestrator(tool_call(
        "emit_fs_listing",
        r#"{"folder":["blank"],"entries":[{"kind":"file","name":"a.txt","content":"hi"}]}"#,
    ))
    .await;

    let mkcol = Request::builder().method("MKCOL").uri("/blank").body(empty_body()).unwrap();
    assert_eq!(handler.handle(mkcol).await.status(), StatusCode::CREATED);

    let propfind = || {
        Request::builder()
            .method("PROPFIND")
            .uri("/blank")
            .header("depth", "1")
            .body(empty_body())
            .unwrap()
    };

    let (status, body) = body_string(handler.handle(propfind()).await).await;
    assert_eq!(status, StatusCode::from_u16(207).unwrap());
    assert!(body.contains("a.txt"));
    assert_eq!(transport.requests_seen(), 1);

    // Second PROPFIND sees a non-empty directory: no further LLM calls.
    let (status2, body2) = body_string(handler.handle(propfind()).await).await;
    assert_eq!(status2, StatusCode::from_u16(207).unwrap());
    assert!(body2.contains("a.txt"));
    assert_eq!(transport.requests_seen(), 1);
}

#[tokio::test]
async fn move_directory_without_depth_is_dialect_gated() {
    // Finder UA: the dialect absorbs the missing Depth header.
    let finder_handler = DavBuilder::new(Backend::Memory)
        .dialect(Arc::new(FinderDialect))
        .build_memory()
        .await;
    let mkcol = Request::builder().method("MKCOL").uri("/a").body(empty_body()).unwrap();
    assert_eq!(finder_handler.handle(mkcol).await.status(), StatusCode::CREATED);

    let mv = Request::builder()
        .method("MOVE")
        .uri("/a")
        .header("destination", "/b")
        .header("user-agent", "WebDAVFS/3.0 (Darwin) CFNetwork")
        .body(empty_body())
        .unwrap();
    let resp = finder_handler.handle(mv).await;
    assert!(resp.status() == StatusCode::CREATED || resp.status() == StatusCode::NO_CONTENT);

    // curl UA against the same dialect: no relaxation, 400.
    let curl_handler = DavBuilder::new(Backend::Memory)
        .dialect(Arc::new(FinderDialect))
        .build_memory()
        .await;
    let mkcol2 = Request::builder().method("MKCOL").uri("/a").body(empty_body()).unwrap();
    assert_eq!(curl_handler.handle(mkcol2).await.status(), StatusCode::CREATED);

    let mv2 = Request::builder()
        .method("MOVE")
        .uri("/a")
        .header("destination", "/b")
        .header("user-agent", "curl/8.0")
        .body(empty_body())
        .unwrap();
    assert_eq!(curl_handler.handle(mv2).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ignore_filter_hides_litter_from_propfind_and_get() {
    let handler = DavBuilder::new(Backend::Memory).build_memory().await;
    handler.fs().write_file(&Path::parse("/a.txt").unwrap(), b"hi".to_vec(), None).await.unwrap();
    handler
        .fs()
        .write_file(&Path::parse("/.DS_Store").unwrap(), b"junk".to_vec(), None)
        .await
        .unwrap();

    let propfind = Request::builder()
        .method("PROPFIND")
        .uri("/")
        .header("depth", "1")
        .body(empty_body())
        .unwrap();
    let (_, body) = body_string(handler.handle(propfind).await).await;
    assert!(body.contains("a.txt"));
    assert!(!body.contains(".DS_Store"));

    let get = Request::builder().method("GET").uri("/.DS_Store").body(empty_body()).unwrap();
    assert_eq!(handler.handle(get).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_listing_fabrications_coalesce_to_one_llm_call() {
    let fs = Arc::new(MemoryBackend::new());
    let transport = Arc::new(FakeTransport::new(tool_call(
        "emit_fs_listing",
        r#"{"folder":["x"],"entries":[{"kind":"file","name":"f.txt","content":"hi"}]}"#,
    )));
    let orchestrator = Arc::new(Orchestrator::new(
        fs.clone(),
        transport.clone() as Arc<dyn LlmTransport>,
        None,
        Arc::new(Tracker::new()),
        "test-model".to_string(),
    ));

    let path = Path::parse("/x").unwrap();
    tokio::join!(
        orchestrator.fabricate_listing(path.clone(), None),
        orchestrator.fabricate_listing(path.clone(), None),
    );

    assert_eq!(transport.requests_seen(), 1);
}

#[tokio::test]
async fn orderpatch_reorders_propfind_children() {
    let handler = DavBuilder::new(Backend::Memory).build_memory().await;
    handler.fs().write_file(&Path::parse("/b.txt").unwrap(), b"b".to_vec(), None).await.unwrap();
    handler.fs().write_file(&Path::parse("/a.txt").unwrap(), b"a".to_vec(), None).await.unwrap();

    let orderpatch_body = br#"<?xml version="1.0"?>
        <D:orderpatch xmlns:D="DAV:">
        <D:ordering-type><D:custom/></D:ordering-type>
        <D:order-member><D:segment>a.txt</D:segment></D:order-member>
        <D:order-member><D:segment>b.txt</D:segment></D:order-member>
        </D:orderpatch>"#;
    let orderpatch = Request::builder()
        .method("ORDERPATCH")
        .uri("/")
        .body(text_body(std::str::from_utf8(orderpatch_body).unwrap()))
        .unwrap();
    assert_eq!(handler.handle(orderpatch).await.status(), StatusCode::OK);

    let propfind = Request::builder()
        .method("PROPFIND")
        .uri("/")
        .header("depth", "1")
        .body(empty_body())
        .unwrap();
    let (_, body) = body_string(handler.handle(propfind).await).await;
    let a_pos = body.find("a.txt").unwrap();
    let b_pos = body.find("b.txt").unwrap();
    assert!(a_pos < b_pos, "a.txt should be listed before b.txt after ORDERPATCH");
}
