use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::navigator::CollectionNavigator;
use crate::player::StoryPlayer;
use crate::{AppError, DEFAULT_PORTION_SECONDS, MAX_VIDEO_SECONDS, PLAYER_CACHE_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoryId(pub u64);

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortionId(pub u64);

impl std::fmt::Display for PortionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaContent {
    Image { url: Url },
    Video { url: Url },
}

impl MediaContent {
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video { .. })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        match self {
            Self::Image { url } | Self::Video { url } => url,
        }
    }
}

/// One timed media unit within a story. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub id: PortionId,
    pub content: MediaContent,
    #[serde(default)]
    pub duration_secs: Option<f32>,
}

impl Portion {
    #[must_use]
    pub fn new(id: PortionId, content: MediaContent, duration_secs: Option<f32>) -> Self {
        Self {
            id,
            content,
            duration_secs,
        }
    }

    /// Effective playback duration: the requested duration, falling back to
    /// [`DEFAULT_PORTION_SECONDS`], with video capped at
    /// [`MAX_VIDEO_SECONDS`]. Non-finite or non-positive requests fall back
    /// to the default.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let requested = self.duration_secs.unwrap_or(DEFAULT_PORTION_SECONDS);
        let secs = if requested.is_finite() && requested > 0.0 {
            requested
        } else {
            DEFAULT_PORTION_SECONDS
        };
        let secs = if self.content.is_video() {
            secs.min(MAX_VIDEO_SECONDS)
        } else {
            secs
        };
        Duration::from_secs_f32(secs)
    }
}

/// An ordered set of timed media portions belonging to one user. Immutable
/// once loaded, except for appending freshly posted portions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub user: User,
    #[serde(default)]
    pub portions: Vec<Portion>,
}

impl Story {
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.portions.is_empty()
    }

    /// Next free portion id within this story. Portion ids are assigned by
    /// the core, unique per story.
    #[must_use]
    pub fn next_portion_id(&self) -> PortionId {
        PortionId(
            self.portions
                .iter()
                .map(|p| p.id.0)
                .max()
                .map_or(0, |max| max + 1),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A portion posted while a drag gesture was in flight; applied when the
/// gesture ends so the story list stays a frozen snapshot mid-gesture.
#[derive(Debug, Clone)]
pub struct DeferredAppend {
    pub story_id: StoryId,
    pub content: MediaContent,
    pub duration_secs: Option<f32>,
}

pub struct Model {
    pub load_state: LoadState,
    pub stories: Vec<Story>,
    pub viewer_open: bool,
    pub navigator: CollectionNavigator,
    /// Player cache keyed by story id. Entries are created when a story
    /// becomes current and evicted explicitly when it leaves the active
    /// window or the collection closes.
    pub players: HashMap<StoryId, StoryPlayer>,
    /// Stories fully watched this session; ordering hint for the icon row.
    pub seen: HashSet<StoryId>,
    pub scene_active: bool,
    pub dialog_visible: bool,
    pub notice_visible: bool,
    /// Generation counter for animation-frame callbacks. Bumped on every
    /// start/pause/resume/story-change; a frame pulse carrying an older
    /// epoch is stale and discarded.
    pub frame_epoch: u64,
    pub last_frame_ms: Option<u64>,
    pub deferred_appends: Vec<DeferredAppend>,
    pub deferred_stories: Option<Vec<Story>>,
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            load_state: LoadState::default(),
            stories: Vec::new(),
            viewer_open: false,
            navigator: CollectionNavigator::default(),
            players: HashMap::new(),
            seen: HashSet::new(),
            scene_active: true,
            dialog_visible: false,
            notice_visible: false,
            frame_epoch: 0,
            last_frame_ms: None,
            deferred_appends: Vec::new(),
            deferred_stories: None,
            active_error: None,
        }
    }
}

impl Model {
    #[must_use]
    pub fn current_story(&self) -> Option<&Story> {
        self.stories.get(self.navigator.current_index())
    }

    #[must_use]
    pub fn current_story_id(&self) -> Option<StoryId> {
        self.current_story().map(|s| s.id)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&StoryPlayer> {
        let id = self.current_story_id()?;
        self.players.get(&id)
    }

    pub fn current_player_mut(&mut self) -> Option<&mut StoryPlayer> {
        let id = self.current_story_id()?;
        self.players.get_mut(&id)
    }

    /// Logical OR of every pause source: overlay surfaces, scene phase, and
    /// an in-flight drag gesture.
    #[must_use]
    pub fn interruption_active(&self) -> bool {
        self.dialog_visible
            || self.notice_visible
            || !self.scene_active
            || self.navigator.is_dragging()
    }

    /// Invalidate any in-flight frame callbacks and start a new frame
    /// generation.
    pub fn next_epoch(&mut self) -> u64 {
        self.frame_epoch = self.frame_epoch.wrapping_add(1);
        self.last_frame_ms = None;
        self.frame_epoch
    }

    /// Drop players for stories outside the active window
    /// (current ± [`PLAYER_CACHE_WINDOW`]).
    pub fn evict_players_outside_window(&mut self) {
        let current = self.navigator.current_index();
        let lo = current.saturating_sub(PLAYER_CACHE_WINDOW);
        let hi = current.saturating_add(PLAYER_CACHE_WINDOW);
        let keep: HashSet<StoryId> = self
            .stories
            .iter()
            .enumerate()
            .filter(|(i, _)| (lo..=hi).contains(i))
            .map(|(_, s)| s.id)
            .collect();
        self.players.retain(|id, _| keep.contains(id));
    }

    pub fn evict_all_players(&mut self) {
        self.players.clear();
    }

    pub fn mark_seen(&mut self, id: StoryId) {
        self.seen.insert(id);
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }
}
