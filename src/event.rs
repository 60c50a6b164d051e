use crate::capabilities::FramePulse;
use crate::model::{MediaContent, StoryId};

/// The story-feed HTTP exchange, converted at the capability boundary so
/// transport types stay out of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoriesFetchResult {
    Response { status: u16, body: Option<Vec<u8>> },
    Error(String),
}

/// Everything that can happen to the core: shell signals (lifecycle, drag,
/// overlay visibility, taps), capability responses, and the animation-frame
/// pulses that drive segment progress.
#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    AppStarted,
    RefreshRequested,
    StoriesLoaded(StoriesFetchResult),

    /// Scene phase from the host: `active = false` while backgrounded.
    /// Pauses and resumes playback, never restarts it.
    ScenePhaseChanged { active: bool },
    DialogVisibilityChanged { visible: bool },
    NoticeVisibilityChanged { visible: bool },

    StoryIconTapped { story_id: StoryId },
    /// The shell finished its closing transition (or the user dismissed the
    /// viewer directly).
    ViewerDismissed,

    DragChanged { translation: f32, viewport_width: f32 },
    DragEnded { translation: f32, viewport_width: f32 },
    TapForward,
    TapBackward,

    FrameArrived(FramePulse),

    /// Freshly captured media finished processing and joins the story.
    PortionPosted {
        story_id: StoryId,
        content: MediaContent,
        duration_secs: Option<f32>,
    },

    ViewportChanged { is_full_width: bool },

    DismissError,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::RefreshRequested => "refresh_requested",
            Self::StoriesLoaded(_) => "stories_loaded",
            Self::ScenePhaseChanged { .. } => "scene_phase_changed",
            Self::DialogVisibilityChanged { .. } => "dialog_visibility_changed",
            Self::NoticeVisibilityChanged { .. } => "notice_visibility_changed",
            Self::StoryIconTapped { .. } => "story_icon_tapped",
            Self::ViewerDismissed => "viewer_dismissed",
            Self::DragChanged { .. } => "drag_changed",
            Self::DragEnded { .. } => "drag_ended",
            Self::TapForward => "tap_forward",
            Self::TapBackward => "tap_backward",
            Self::FrameArrived(_) => "frame_arrived",
            Self::PortionPosted { .. } => "portion_posted",
            Self::ViewportChanged { .. } => "viewport_changed",
            Self::DismissError => "dismiss_error",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RefreshRequested
                | Self::StoryIconTapped { .. }
                | Self::ViewerDismissed
                | Self::DragChanged { .. }
                | Self::DragEnded { .. }
                | Self::TapForward
                | Self::TapBackward
                | Self::PortionPosted { .. }
                | Self::DismissError
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
