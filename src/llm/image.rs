//! The image-generation backend, treated as an opaque port (spec.md
//! §1, §6: "image-generation backends... opaque `ImageProvider` port").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure from the image-generation backend. Kept separate from
/// `DavError` since it belongs to a port the engine treats as opaque
/// and always swallows (spec.md §7: "the fabrication orchestrator
/// swallows all LLM and provider errors").
#[derive(Debug, Error)]
#[error("image provider error: {0}")]
pub struct ProviderError(pub String);

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, Serialize)]
pub struct ImageRequestSizes {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ImageRequest {
    pub sizes: Vec<ImageRequestSizes>,
    pub style: Option<String>,
    pub negative: Option<String>,
    pub n: Option<u32>,
    pub seed: Option<u64>,
    pub source_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateArgs {
    pub repo_id: String,
    pub kind: String,
    pub prompt: String,
    pub request: ImageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageResult {
    pub size: Option<String>,
    pub url: String,
    pub caption: Option<String>,
    pub moderation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub results: Vec<ImageResult>,
}

/// Image backend port. The orchestrator calls `generate` when a tool
/// call's `mime` begins with `image/`, then decodes whichever `url`
/// comes back (spec.md §4.5: "bytes returned by the provider replace
/// the textual placeholder before writing").
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, args: GenerateArgs) -> ProviderResult<GenerateResponse>;
}

/// Decode a `data:` URL's payload to raw bytes. Returns `None` for
/// anything else (an `http(s)://` URL is left for the caller to fetch
/// separately — out of scope here, per spec.md's "raw transport framing...
/// is assumed").
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if meta.ends_with(";base64") {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(payload).ok()
    } else {
        Some(percent_encoding::percent_decode_str(payload).collect())
    }
}
