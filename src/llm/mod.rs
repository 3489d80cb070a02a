//! The fabrication engine: a streaming LLM transport port, the event
//! taxonomy it speaks, the tool-call runner that reassembles complete
//! calls out of fragments, and the orchestrator that turns a
//! filesystem miss into one such call (spec.md §4.4, §4.5).

pub mod events;
pub mod image;
pub mod orchestrator;
pub mod prompt;
pub mod stream;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio::sync::oneshot;

use crate::error::DavResult;
pub use events::ResponseEvent;
pub use orchestrator::{FabricationStats, Orchestrator};

/// Which tool the model is required to call. The orchestrator always
/// forces a single named tool (spec.md §4.5: "tool selection forcing
/// the appropriate tool name") — this crate never needs the model to
/// choose freely among several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Forced(&'static str),
}

/// One fabrication request sent to the transport.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub tool_choice: ToolChoice,
    pub model: String,
}

/// The streaming LLM backend, treated as an opaque port (spec.md §4.4,
/// §9: "`LlmTransport` is an `async_trait` port"). Implementations own
/// whatever wire protocol they speak to the underlying model and
/// translate it into [`ResponseEvent`]s.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    /// Start a streaming completion. Returns the event stream plus an
    /// optional abort handle the tool-call runner can fire once it has
    /// what it needs (spec.md §4.4 step 5); a transport that can't
    /// cancel mid-stream returns `None`.
    async fn stream(
        &self,
        request: LlmRequest,
    ) -> DavResult<(BoxStream<'static, ResponseEvent>, Option<oneshot::Sender<()>>)>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    //! A scripted transport for tests (spec.md §4.4: "A `FakeTransport`
    //! scripted with a fixed event sequence lives in `#[cfg(test)]`"),
    //! also reachable from `tests/*.rs` integration tests under the
    //! `test-util` feature, since those compile against this crate as an
    //! ordinary dependency rather than with `--cfg test`.

    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream, StreamExt};
    use tokio::sync::oneshot;

    use crate::error::DavResult;

    use super::{LlmRequest, LlmTransport, ResponseEvent};

    /// Replays a fixed event sequence regardless of the request, and
    /// records every request it was asked to stream.
    pub struct FakeTransport {
        events: Vec<ResponseEvent>,
        seen: Mutex<Vec<LlmRequest>>,
    }

    impl FakeTransport {
        pub fn new(events: Vec<ResponseEvent>) -> FakeTransport {
            FakeTransport { events, seen: Mutex::new(Vec::new()) }
        }

        pub fn requests_seen(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmTransport for FakeTransport {
        async fn stream(
            &self,
            request: LlmRequest,
        ) -> DavResult<(BoxStream<'static, ResponseEvent>, Option<oneshot::Sender<()>>)> {
            self.seen.lock().unwrap().push(request);
            let events = self.events.clone();
            Ok((stream::iter(events).boxed(), None))
        }
    }
}
