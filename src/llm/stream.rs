//! Streaming Tool-Call Runner (component D, spec.md §4.4): reconstructs
//! complete tool invocations out of a stream of fragments, calling back
//! into the orchestrator's FS executor as soon as one is complete.

use std::collections::HashMap;
use std::future::Future;

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::events::{OutputItem, ResponseEvent};

#[derive(Default, Clone)]
struct PendingCall {
    name: String,
    buf: String,
}

/// Behavior knobs for [`run_tool_call_stream`]. `end_after_first`
/// matches spec.md §4.4 step 5 exactly — when true (the default), the
/// runner stops and attempts to abort the transport as soon as the
/// callback yields a result.
pub struct RunnerOptions {
    pub end_after_first: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        RunnerOptions { end_after_first: true }
    }
}

fn parse_object(raw: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if value.is_object() {
        Some(value)
    } else {
        None
    }
}

/// Drive `events` to completion (or early abort), invoking
/// `on_function_call(name, arguments)` for every complete tool call
/// seen. The callback is async since applying a tool call means
/// writing through the persistence adapter. Returns the first
/// non-`None` callback result when `opts.end_after_first`, else the
/// last one observed.
///
/// `abort` is fired (best-effort — the transport may ignore it) the
/// moment the runner decides to stop early.
pub async fn run_tool_call_stream<S, F, Fut, T>(
    mut events: S,
    mut on_function_call: F,
    opts: RunnerOptions,
    abort: Option<oneshot::Sender<()>>,
) -> Option<T>
where
    S: Stream<Item = ResponseEvent> + Unpin,
    F: FnMut(String, Value) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let mut pending: HashMap<String, PendingCall> = HashMap::new();
    let mut result = None;

    while let Some(event) = events.next().await {
        trace!(?event, "stream event");
        match event {
            ResponseEvent::OutputItemAdded { item } => {
                register_if_function_call(&mut pending, &item);
            }
            ResponseEvent::FunctionCallArgumentsDelta { item_id, delta } => {
                if let Some(entry) = pending.get_mut(&item_id) {
                    entry.buf.push_str(&delta);
                }
            }
            ResponseEvent::FunctionCallArgumentsDone { item_id, arguments } => {
                let Some(entry) = pending.get(&item_id) else {
                    continue;
                };
                let raw = arguments.as_deref().unwrap_or(&entry.buf);
                let name = entry.name.clone();
                if let Some(params) = parse_object(raw) {
                    if let Some(value) = on_function_call(name, params).await {
                        result = Some(value);
                        if opts.end_after_first {
                            if let Some(abort) = abort {
                                let _ = abort.send(());
                            }
                            break;
                        }
                    }
                }
            }
            ResponseEvent::OutputItemDone { item } => {
                if item.kind == "function_call" {
                    if let (Some(name), Some(arguments)) = (&item.name, &item.arguments) {
                        if let Some(params) = parse_object(arguments) {
                            if let Some(value) = on_function_call(name.clone(), params).await {
                                result = Some(value);
                                if opts.end_after_first {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            ResponseEvent::OutputTextDelta { .. } | ResponseEvent::OutputTextDone { .. } => {}
            ResponseEvent::Unknown => {}
        }
    }

    debug!(produced_result = result.is_some(), "stream.complete");
    result
}

fn register_if_function_call(pending: &mut HashMap<String, PendingCall>, item: &OutputItem) {
    if item.kind == "function_call" {
        if let Some(id) = &item.id {
            pending.insert(
                id.clone(),
                PendingCall {
                    name: item.name.clone().unwrap_or_default(),
                    buf: String::new(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn added(id: &str, name: &str) -> ResponseEvent {
        ResponseEvent::OutputItemAdded {
            item: OutputItem {
                kind: "function_call".to_string(),
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                call_id: Some(id.to_string()),
                arguments: None,
            },
        }
    }

    #[tokio::test]
    async fn assembles_arguments_from_deltas() {
        let events = vec![
            added("item_1", "emit_file_content"),
            ResponseEvent::FunctionCallArgumentsDelta {
                item_id: "item_1".to_string(),
                delta: r#"{"path":"#.to_string(),
            },
            ResponseEvent::FunctionCallArgumentsDelta {
                item_id: "item_1".to_string(),
                delta: r#"["a"],"content":"hi"}"#.to_string(),
            },
            ResponseEvent::FunctionCallArgumentsDone {
                item_id: "item_1".to_string(),
                arguments: None,
            },
        ];
        let result = run_tool_call_stream(
            stream::iter(events),
            |name, params| async move {
                assert_eq!(name, "emit_file_content");
                assert_eq!(params["content"], "hi");
                Some(())
            },
            RunnerOptions::default(),
            None,
        )
        .await;
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn prefers_explicit_arguments_over_accumulated_buffer() {
        let events = vec![
            added("item_1", "emit_file_content"),
            ResponseEvent::FunctionCallArgumentsDelta {
                item_id: "item_1".to_string(),
                delta: "garbage".to_string(),
            },
            ResponseEvent::FunctionCallArgumentsDone {
                item_id: "item_1".to_string(),
                arguments: Some(r#"{"content":"final"}"#.to_string()),
            },
        ];
        let result = run_tool_call_stream(
            stream::iter(events),
            |_name, params| async move { Some(params["content"].as_str().unwrap().to_string()) },
            RunnerOptions::default(),
            None,
        )
        .await;
        assert_eq!(result, Some("final".to_string()));
    }

    #[tokio::test]
    async fn malformed_json_is_silently_dropped() {
        let events = vec![
            added("item_1", "emit_file_content"),
            ResponseEvent::FunctionCallArgumentsDone {
                item_id: "item_1".to_string(),
                arguments: Some("not json".to_string()),
            },
        ];
        let result: Option<()> = run_tool_call_stream(
            stream::iter(events),
            |_name, _params| async move { Some(()) },
            RunnerOptions::default(),
            None,
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unknown_item_id_is_ignored() {
        let events = vec![ResponseEvent::FunctionCallArgumentsDone {
            item_id: "never-registered".to_string(),
            arguments: Some(r#"{"x":1}"#.to_string()),
        }];
        let result: Option<()> = run_tool_call_stream(
            stream::iter(events),
            |_name, _params| async move { Some(()) },
            RunnerOptions::default(),
            None,
        )
        .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn stops_after_first_result_when_end_after_first() {
        let events = vec![
            added("item_1", "emit_file_content"),
            ResponseEvent::FunctionCallArgumentsDone {
                item_id: "item_1".to_string(),
                arguments: Some(r#"{"content":"one"}"#.to_string()),
            },
            added("item_2", "emit_file_content"),
            ResponseEvent::FunctionCallArgumentsDone {
                item_id: "item_2".to_string(),
                arguments: Some(r#"{"content":"two"}"#.to_string()),
            },
        ];
        let mut calls = 0;
        let result = run_tool_call_stream(
            stream::iter(events),
            |_name, _params| {
                calls += 1;
                async move { Some(calls) }
            },
            RunnerOptions::default(),
            None,
        )
        .await;
        assert_eq!(result, Some(1));
        assert_eq!(calls, 1);
    }
}
