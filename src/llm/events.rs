//! The model's streaming output, collapsed into one tagged enum
//! (spec.md §9: "the event-type hierarchy... collapses cleanly into a
//! single tagged variant `ResponseEvent`").

use serde::Deserialize;

/// A single output slot the model is filling in — text, a tool call, or
/// something this crate doesn't know about yet.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub call_id: Option<String>,
    pub arguments: Option<String>,
}

/// One event from the streaming transport. Unrecognized `type` values
/// decode to `Unknown` rather than failing the whole stream — spec.md
/// §4.4's "unknown events... are silently ignored".
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseEvent {
    #[serde(rename = "output_item.added")]
    OutputItemAdded { item: OutputItem },

    #[serde(rename = "function_call_arguments.delta")]
    FunctionCallArgumentsDelta { item_id: String, delta: String },

    #[serde(rename = "function_call_arguments.done")]
    FunctionCallArgumentsDone {
        item_id: String,
        arguments: Option<String>,
    },

    #[serde(rename = "output_item.done")]
    OutputItemDone { item: OutputItem },

    #[serde(rename = "output_text.delta")]
    OutputTextDelta { delta: String },

    #[serde(rename = "output_text.done")]
    OutputTextDone { text: String },

    #[serde(other)]
    Unknown,
}
