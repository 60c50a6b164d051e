#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod model;
pub mod navigator;
pub mod player;
pub mod segment;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app::{App, PortionView, SegmentView, StoryIcon, UserFacingError, ViewModel, ViewerView};
pub use capabilities::{Capabilities, Effect, FramePulse, FrameRequest, PresenterOperation};
pub use event::{Event, StoriesFetchResult};
pub use model::{
    LoadState, MediaContent, Model, Portion, PortionId, Story, StoryId, User, UserId,
};
pub use navigator::{CollectionNavigator, DragOutcome};
pub use player::{PlayerSignal, StoryPlayer};
pub use segment::{SegmentStatus, SegmentTimer};

/// Playback duration applied when a portion does not specify one.
pub const DEFAULT_PORTION_SECONDS: f32 = 5.0;
/// Hard cap on video portion playback, regardless of clip length.
pub const MAX_VIDEO_SECONDS: f32 = 15.0;
/// Normalized drag offset beyond which a boundary drag closes the collection.
pub const CLOSE_DRAG_THRESHOLD: f32 = 0.2;
/// Players are kept alive for the current story and this many neighbors on
/// each side; everything further out is evicted.
pub const PLAYER_CACHE_WINDOW: usize = 1;

pub const STORIES_ENDPOINT: &str = "https://api.storyline.app/v1/stories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    InvalidData,
    Network,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidData => "INVALID_DATA",
            Self::Network => "NETWORK_ERROR",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network)
    }
}

/// The only failures this core surfaces come from the story source; every
/// in-core input is clamped or ignored instead of rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::NotFound => "No stories are available right now.".into(),
            ErrorKind::InvalidData => {
                "Stories could not be read. Please try again later.".into()
            }
            ErrorKind::Network => {
                "Unable to load stories. Please check your connection and try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Error)]
pub enum StorySourceError {
    #[error("story feed not found")]
    NotFound,
    #[error("story feed could not be decoded: {0}")]
    InvalidData(String),
    #[error("story feed unreachable: {0}")]
    Network(String),
}

impl From<StorySourceError> for AppError {
    fn from(e: StorySourceError) -> Self {
        let kind = match &e {
            StorySourceError::NotFound => ErrorKind::NotFound,
            StorySourceError::InvalidData(_) => ErrorKind::InvalidData,
            StorySourceError::Network(_) => ErrorKind::Network,
        };
        AppError::new(kind, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;

        #[test]
        fn source_errors_map_to_kinds() {
            let e: AppError = StorySourceError::NotFound.into();
            assert_eq!(e.kind, ErrorKind::NotFound);

            let e: AppError = StorySourceError::InvalidData("bad json".into()).into();
            assert_eq!(e.kind, ErrorKind::InvalidData);

            let e: AppError = StorySourceError::Network("timeout".into()).into();
            assert_eq!(e.kind, ErrorKind::Network);
        }

        #[test]
        fn only_network_is_retryable() {
            assert!(ErrorKind::Network.is_retryable());
            assert!(!ErrorKind::NotFound.is_retryable());
            assert!(!ErrorKind::InvalidData.is_retryable());
        }

        #[test]
        fn user_facing_messages_do_not_leak_internals() {
            let e = AppError::new(ErrorKind::Network, "connection reset by peer");
            assert!(!e.user_facing_message().contains("peer"));
        }
    }
}
