//! Fabrication Orchestrator (component E, spec.md §4.5): turns a
//! filesystem miss into a single LLM tool call and writes the result
//! through the persistence adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::SystemTime;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::fs::PersistenceAdapter;
use crate::path::Path;
use crate::tracker::{Tracker, TrackerEvent};

use super::image::{decode_data_url, GenerateArgs, ImageProvider, ImageRequest};
use super::prompt::{build_prompt, FabricationTarget};
use super::stream::{run_tool_call_stream, RunnerOptions};
use super::{LlmRequest, LlmTransport, ToolChoice};

#[derive(Debug, Deserialize)]
struct ListingEntry {
    kind: String,
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FsListingCall {
    folder: Vec<String>,
    entries: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
struct FileContentCall {
    #[serde(default)]
    path: Vec<String>,
    content: String,
    #[serde(default)]
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageFileCall {
    #[serde(default)]
    path: Vec<String>,
    prompt: String,
    #[serde(default)]
    mime: Option<String>,
}

/// Telemetry accumulated while applying one tool call's worth of
/// fabricated entries.
#[derive(Debug, Default, Clone)]
pub struct FabricationStats {
    pub dirs: usize,
    pub files: usize,
    pub bytes: usize,
    pub sample_names: Vec<String>,
}

type Coalesced<T> = Shared<BoxFuture<'static, Arc<T>>>;

/// Coalesces concurrent fabrications for the same target and applies
/// the model's tool calls to a persistence adapter.
pub struct Orchestrator<A: PersistenceAdapter + 'static> {
    inner: Arc<OrchestratorInner<A>>,
    listing_inflight: Arc<StdMutex<HashMap<String, Coalesced<()>>>>,
    file_inflight: Arc<StdMutex<HashMap<String, Coalesced<String>>>>,
}

impl<A: PersistenceAdapter + 'static> Orchestrator<A> {
    pub fn new(
        fs: Arc<A>,
        transport: Arc<dyn LlmTransport>,
        image_provider: Option<Arc<dyn ImageProvider>>,
        tracker: Arc<Tracker>,
        model: String,
    ) -> Orchestrator<A> {
        Orchestrator {
            inner: Arc::new(OrchestratorInner {
                fs,
                transport,
                image_provider,
                tracker,
                model,
            }),
            listing_inflight: Arc::new(StdMutex::new(HashMap::new())),
            file_inflight: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// `LISTING:<display-path>:DEPTH:<depth|null>` (spec.md §3).
    fn listing_key(path: &Path, depth: Option<&str>) -> String {
        format!(
            "LISTING:{}:DEPTH:{}",
            path.inflight_display(),
            depth.unwrap_or("null")
        )
    }

    /// `FILE:<display-path>:MIME:<mime|"">` (spec.md §3).
    fn file_key(path: &Path, mime_hint: Option<&str>) -> String {
        format!("FILE:{}:MIME:{}", path.inflight_display(), mime_hint.unwrap_or(""))
    }

    #[instrument(skip(self))]
    pub async fn fabricate_listing(&self, folder_path: Path, depth: Option<String>) {
        let key = Self::listing_key(&folder_path, depth.as_deref());

        let existing = { self.listing_inflight.lock().unwrap().get(&key).cloned() };
        let fut = match existing {
            Some(fut) => fut,
            None => {
                let inner = self.inner.clone();
                let map = self.listing_inflight.clone();
                let folder_for_task = folder_path.clone();
                let depth_for_task = depth.clone();
                let key_for_cleanup = key.clone();
                let shared: Coalesced<()> = async move {
                    inner.run_listing_fabrication(folder_for_task, depth_for_task).await;
                    map.lock().unwrap().remove(&key_for_cleanup);
                    Arc::new(())
                }
                .boxed()
                .shared();
                self.listing_inflight.lock().unwrap().insert(key, shared.clone());
                shared
            }
        };
        fut.await;
    }

    #[instrument(skip(self))]
    pub async fn fabricate_file_content(&self, file_path: Path, mime_hint: Option<String>) -> String {
        let key = Self::file_key(&file_path, mime_hint.as_deref());

        let existing = { self.file_inflight.lock().unwrap().get(&key).cloned() };
        let fut = match existing {
            Some(fut) => fut,
            None => {
                let inner = self.inner.clone();
                let map = self.file_inflight.clone();
                let path_for_task = file_path.clone();
                let mime_for_task = mime_hint.clone();
                let key_for_cleanup = key.clone();
                let shared: Coalesced<String> = async move {
                    let content = inner.run_file_fabrication(path_for_task, mime_for_task).await;
                    map.lock().unwrap().remove(&key_for_cleanup);
                    Arc::new(content)
                }
                .boxed()
                .shared();
                self.file_inflight.lock().unwrap().insert(key, shared.clone());
                shared
            }
        };
        (*fut.await).clone()
    }

    /// Run once at engine startup if the root is empty (spec.md §4.5
    /// "Bootstrap"). Errors are swallowed with a warning; absence of an
    /// orchestrator entirely is handled by the caller simply not
    /// calling this.
    pub async fn bootstrap_if_empty(&self) {
        match self.inner.fs.readdir(&Path::root()).await {
            Ok(entries) if entries.is_empty() => {
                self.fabricate_listing(Path::root(), Some("1".to_string())).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "bootstrap readdir failed, skipping"),
        }
    }
}

/// The pieces an in-flight fabrication task needs, split out so the
/// task future doesn't have to borrow the orchestrator (which would
/// outlive the call that spawned it).
struct OrchestratorInner<A: PersistenceAdapter + 'static> {
    fs: Arc<A>,
    transport: Arc<dyn LlmTransport>,
    image_provider: Option<Arc<dyn ImageProvider>>,
    tracker: Arc<Tracker>,
    model: String,
}

impl<A: PersistenceAdapter + 'static> OrchestratorInner<A> {
    async fn run_listing_fabrication(&self, folder_path: Path, depth: Option<String>) {
        let target = FabricationTarget::Listing { depth: depth.as_deref() };
        let prompt = build_prompt(&folder_path, &target);
        self.emit_start("listing", &folder_path, depth.clone(), &prompt).await;

        let request = LlmRequest {
            prompt: prompt.clone(),
            tool_choice: ToolChoice::Forced("emit_fs_listing"),
            model: self.model.clone(),
        };
        let (events, abort) = match self.transport.stream(request).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "llm transport failed for listing");
                self.emit_end("listing", &folder_path, &FabricationStats::default()).await;
                return;
            }
        };

        let fs = self.fs.clone();
        let image_provider = self.image_provider.clone();
        let folder_for_closure = folder_path.clone();
        let applied = run_tool_call_stream(
            events,
            move |name, params| {
                let fs = fs.clone();
                let image_provider = image_provider.clone();
                let folder = folder_for_closure.clone();
                async move {
                    if name != "emit_fs_listing" {
                        return None;
                    }
                    let call: FsListingCall = serde_json::from_value(params).ok()?;
                    let stats = apply_listing(&fs, &folder, call, &image_provider).await;
                    Some(stats)
                }
            },
            RunnerOptions::default(),
            abort,
        )
        .await;

        let stats = applied.unwrap_or_else(|| {
            warn!(path = %folder_path, "listing fabrication produced no usable tool call");
            FabricationStats::default()
        });
        self.emit_end("listing", &folder_path, &stats).await;
    }

    async fn run_file_fabrication(&self, file_path: Path, mime_hint: Option<String>) -> String {
        let target = FabricationTarget::FileContent { mime_hint: mime_hint.as_deref() };
        let prompt = build_prompt(&file_path, &target);
        self.emit_start("file", &file_path, mime_hint.clone(), &prompt).await;

        let request = LlmRequest {
            prompt: prompt.clone(),
            tool_choice: ToolChoice::Forced("emit_file_content"),
            model: self.model.clone(),
        };
        let (events, abort) = match self.transport.stream(request).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "llm transport failed for file content");
                self.emit_end("file", &file_path, &FabricationStats::default()).await;
                return String::new();
            }
        };

        let fs = self.fs.clone();
        let image_provider = self.image_provider.clone();
        let path_for_closure = file_path.clone();
        let content = run_tool_call_stream(
            events,
            move |name, params| {
                let fs = fs.clone();
                let image_provider = image_provider.clone();
                let path = path_for_closure.clone();
                async move {
                    match name.as_str() {
                        "emit_file_content" => {
                            let call: FileContentCall = serde_json::from_value(params).ok()?;
                            let written = call.content.clone();
                            let _ = fs.write_file(&path, call.content.into_bytes(), call.mime).await;
                            Some(written)
                        }
                        "emit_image_file" if image_provider.is_some() => {
                            let call: ImageFileCall = serde_json::from_value(params).ok()?;
                            let provider = image_provider.as_ref().unwrap();
                            let mime = call.mime.clone().unwrap_or_else(|| "image/png".to_string());
                            if let Some(bytes) = generate_image_bytes(provider.as_ref(), &call.prompt, &mime).await {
                                let _ = fs.write_file(&path, bytes, Some(mime)).await;
                            }
                            Some(String::new())
                        }
                        _ => None,
                    }
                }
            },
            RunnerOptions::default(),
            abort,
        )
        .await;

        let stats = FabricationStats {
            files: 1,
            bytes: content.as_deref().map(str::len).unwrap_or(0),
            ..Default::default()
        };
        self.emit_end("file", &file_path, &stats).await;
        content.unwrap_or_default()
    }

    async fn emit_start(&self, context: &str, path: &Path, hint: Option<String>, prompt: &str) {
        self.tracker
            .push(TrackerEvent::LlmStart {
                context: context.to_string(),
                path: path.display_path(),
                depth_or_mime: hint,
                model: self.model.clone(),
                prompt_preview: prompt.chars().take(200).collect(),
                at: SystemTime::now(),
            })
            .await;
    }

    async fn emit_end(&self, context: &str, path: &Path, stats: &FabricationStats) {
        self.tracker
            .push(TrackerEvent::LlmEnd {
                context: context.to_string(),
                path: path.display_path(),
                tool_calls_applied: stats.dirs + stats.files,
                bytes_written: stats.bytes,
                at: SystemTime::now(),
            })
            .await;
    }
}

/// The FS executor for `emit_fs_listing`: `ensure_dir(folder)` then, per
/// entry, either `ensure_dir` (directories) or `write_file` (files),
/// routing `image/*` entries through the image provider first
/// (spec.md §4.5).
async fn apply_listing<A: PersistenceAdapter + 'static>(
    fs: &Arc<A>,
    folder: &Path,
    call: FsListingCall,
    image_provider: &Option<Arc<dyn ImageProvider>>,
) -> FabricationStats {
    let _ = &call.folder;
    let mut stats = FabricationStats::default();
    let _ = fs.ensure_dir(folder).await;
    for entry in call.entries {
        let child = folder.child(entry.name.clone());
        match entry.kind.as_str() {
            "dir" => {
                let _ = fs.ensure_dir(&child).await;
                stats.dirs += 1;
            }
            _ => {
                let bytes = resolve_entry_bytes(&entry, image_provider).await;
                stats.bytes += bytes.len();
                let _ = fs.write_file(&child, bytes, entry.mime.clone()).await;
                stats.files += 1;
            }
        }
        if stats.sample_names.len() < 5 {
            stats.sample_names.push(entry.name);
        }
    }
    stats
}

async fn resolve_entry_bytes(entry: &ListingEntry, image_provider: &Option<Arc<dyn ImageProvider>>) -> Vec<u8> {
    if let Some(mime) = &entry.mime {
        if mime.starts_with("image/") {
            if let Some(provider) = image_provider {
                if let Some(bytes) = generate_image_bytes(provider.as_ref(), &entry.content, mime).await {
                    return bytes;
                }
            }
        }
    }
    entry.content.clone().into_bytes()
}

async fn generate_image_bytes(provider: &dyn ImageProvider, prompt: &str, mime: &str) -> Option<Vec<u8>> {
    let args = GenerateArgs {
        repo_id: "fabrication".to_string(),
        kind: mime.to_string(),
        prompt: prompt.to_string(),
        request: ImageRequest::default(),
    };
    let response = provider.generate(args).await.ok()?;
    let first = response.results.into_iter().next()?;
    decode_data_url(&first.url)
}

