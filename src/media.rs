//! Per-scene media attachment.
//!
//! Scenes are fanned out over a `JoinSet`, bounded by a semaphore. Each task
//! first takes credits from the [`CreditGate`], then asks the
//! [`MediaProvider`] for an asset. Results land in a pre-sized vector indexed
//! by scene position, so one failing scene never hides or cancels another.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::subtitles::style::VisualKind;
use crate::subtitles::timeline::{Scene, TimelineResponse};
use crate::ui::prelude::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MediaError {
    #[error("media provider failed for {scene_id}: {message}")]
    Provider { scene_id: String, message: String },
    #[error("invalid media url for {scene_id}: {url:?}")]
    InvalidUrl { scene_id: String, url: String },
    #[error("media task for scene {index} did not finish")]
    TaskLost { index: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreditError {
    #[error("insufficient credits: {required} required, {available} available")]
    Insufficient { required: u64, available: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "UPPERCASE")]
pub enum MediaAsset {
    Image(String),
    Video(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The provider has nothing for this scene.
    NoMedia,
    /// The scene already carries media and `force` was not set.
    AlreadyPresent,
    Credits(CreditError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMedia => write!(f, "no media available"),
            SkipReason::AlreadyPresent => write!(f, "scene already has media"),
            SkipReason::Credits(err) => write!(f, "{err}"),
        }
    }
}

/// Result of one scene's media task.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOutcome {
    Attached(MediaAsset),
    Skipped(SkipReason),
    Failed(MediaError),
}

/// What a provider needs to know about a scene.
#[derive(Debug, Clone)]
pub struct SceneMediaRequest {
    pub index: usize,
    pub scene_id: String,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl From<&Scene> for SceneMediaRequest {
    fn from(scene: &Scene) -> Self {
        Self {
            index: scene.index,
            scene_id: scene.scene_id.clone(),
            text: scene.voice.text.clone(),
            start: scene.start,
            end: scene.end,
        }
    }
}

#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// `Ok(None)` means nothing to attach for this scene.
    async fn fetch(&self, scene: &SceneMediaRequest) -> Result<Option<MediaAsset>, MediaError>;
}

#[async_trait]
pub trait CreditGate: Send + Sync {
    async fn consume(&self, scene_id: &str, amount: u64) -> Result<(), CreditError>;

    /// Give back credits taken for a scene whose media failed.
    async fn refund(&self, _scene_id: &str, _amount: u64) {}
}

/// In-memory credit balance.
#[derive(Debug)]
pub struct CreditBalance {
    available: AtomicU64,
}

impl CreditBalance {
    pub fn new(available: u64) -> Self {
        Self {
            available: AtomicU64::new(available),
        }
    }

    pub fn available(&self) -> u64 {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditGate for CreditBalance {
    async fn consume(&self, _scene_id: &str, amount: u64) -> Result<(), CreditError> {
        self.available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(amount)
            })
            .map(|_| ())
            .map_err(|available| CreditError::Insufficient {
                required: amount,
                available,
            })
    }

    async fn refund(&self, _scene_id: &str, amount: u64) {
        self.available.fetch_add(amount, Ordering::SeqCst);
    }
}

/// Gate that never refuses.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unmetered;

#[async_trait]
impl CreditGate for Unmetered {
    async fn consume(&self, _scene_id: &str, _amount: u64) -> Result<(), CreditError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Provider backed by a JSON manifest mapping scene IDs to URLs, e.g.
/// `{"scene_0": {"imageUrl": "https://..."}}`.
#[derive(Debug, Clone, Default)]
pub struct ManifestMediaProvider {
    entries: HashMap<String, ManifestEntry>,
}

impl ManifestMediaProvider {
    pub fn new(entries: HashMap<String, ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries = serde_json::from_str(json).context("parsing media manifest")?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading media manifest {}", path.display()))?;
        Self::from_json(&contents)
    }
}

fn checked_url(scene_id: &str, url: &str) -> Result<String, MediaError> {
    let url = url.trim();
    if url.is_empty() || url.contains(char::is_whitespace) {
        return Err(MediaError::InvalidUrl {
            scene_id: scene_id.to_string(),
            url: url.to_string(),
        });
    }
    Ok(url.to_string())
}

#[async_trait]
impl MediaProvider for ManifestMediaProvider {
    async fn fetch(&self, scene: &SceneMediaRequest) -> Result<Option<MediaAsset>, MediaError> {
        let Some(entry) = self.entries.get(&scene.scene_id) else {
            return Ok(None);
        };
        // Video wins, matching how scenes pick their visual kind
        if let Some(url) = &entry.video_url {
            return checked_url(&scene.scene_id, url).map(|url| Some(MediaAsset::Video(url)));
        }
        if let Some(url) = &entry.image_url {
            return checked_url(&scene.scene_id, url).map(|url| Some(MediaAsset::Image(url)));
        }
        Err(MediaError::Provider {
            scene_id: scene.scene_id.clone(),
            message: "manifest entry has neither imageUrl nor videoUrl".to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaOptions {
    pub concurrency: usize,
    pub cost_per_scene: u64,
    /// Replace media already present on a scene.
    pub force: bool,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            cost_per_scene: 1,
            force: false,
        }
    }
}

async fn run_scene_task(
    request: SceneMediaRequest,
    provider: Arc<dyn MediaProvider>,
    credits: Arc<dyn CreditGate>,
    semaphore: Arc<Semaphore>,
    cost: u64,
) -> MediaOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return MediaOutcome::Failed(MediaError::TaskLost {
            index: request.index,
        });
    };

    if let Err(err) = credits.consume(&request.scene_id, cost).await {
        return MediaOutcome::Skipped(SkipReason::Credits(err));
    }

    match provider.fetch(&request).await {
        Ok(Some(asset)) => MediaOutcome::Attached(asset),
        Ok(None) => {
            credits.refund(&request.scene_id, cost).await;
            MediaOutcome::Skipped(SkipReason::NoMedia)
        }
        Err(err) => {
            credits.refund(&request.scene_id, cost).await;
            MediaOutcome::Failed(err)
        }
    }
}

/// Fan out media requests for every scene and attach what comes back.
/// Returns one outcome per scene, in scene order.
pub async fn attach_media(
    timeline: &mut TimelineResponse,
    provider: Arc<dyn MediaProvider>,
    credits: Arc<dyn CreditGate>,
    options: &MediaOptions,
) -> Vec<MediaOutcome> {
    let scene_count = timeline.scenes.len();
    let mut outcomes: Vec<Option<MediaOutcome>> = vec![None; scene_count];
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut join_set: JoinSet<(usize, MediaOutcome)> = JoinSet::new();

    for (position, scene) in timeline.scenes.iter().enumerate() {
        if scene.visual.kind != VisualKind::None && !options.force {
            outcomes[position] = Some(MediaOutcome::Skipped(SkipReason::AlreadyPresent));
            continue;
        }

        let request = SceneMediaRequest::from(scene);
        let provider = Arc::clone(&provider);
        let credits = Arc::clone(&credits);
        let semaphore = Arc::clone(&semaphore);
        let cost = options.cost_per_scene;
        join_set.spawn(async move {
            let outcome = run_scene_task(request, provider, credits, semaphore, cost).await;
            (position, outcome)
        });
    }

    while let Some(task_result) = join_set.join_next().await {
        match task_result {
            Ok((position, outcome)) => outcomes[position] = Some(outcome),
            Err(err) => emit(
                Level::Warn,
                "media.task.join_error",
                &format!("Media task ended abnormally: {err}"),
                None,
            ),
        }
    }

    let outcomes: Vec<MediaOutcome> = outcomes
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| {
            outcome.unwrap_or(MediaOutcome::Failed(MediaError::TaskLost { index }))
        })
        .collect();

    for (scene, outcome) in timeline.scenes.iter_mut().zip(&outcomes) {
        match outcome {
            MediaOutcome::Attached(MediaAsset::Image(url)) => scene.set_image(url.clone()),
            MediaOutcome::Attached(MediaAsset::Video(url)) => scene.set_video(url.clone()),
            MediaOutcome::Skipped(reason) => emit(
                Level::Debug,
                "media.scene.skipped",
                &format!("{}: {reason}", scene.scene_id),
                None,
            ),
            MediaOutcome::Failed(err) => emit(
                Level::Warn,
                "media.scene.failed",
                &err.to_string(),
                Some(json!({ "scene": scene.scene_id })),
            ),
        }
    }

    outcomes
}

/// Counts of attached, skipped and failed scenes.
pub fn summarize(outcomes: &[MediaOutcome]) -> (usize, usize, usize) {
    outcomes.iter().fold((0, 0, 0), |(a, s, f), outcome| match outcome {
        MediaOutcome::Attached(_) => (a + 1, s, f),
        MediaOutcome::Skipped(_) => (a, s + 1, f),
        MediaOutcome::Failed(_) => (a, s, f + 1),
    })
}
