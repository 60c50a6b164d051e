use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::capabilities::Capabilities;
use crate::event::{Event, StoriesFetchResult};
use crate::model::{
    DeferredAppend, LoadState, MediaContent, Model, Portion, PortionId, Story, StoryId,
};
use crate::navigator::DragOutcome;
use crate::player::{PlayerSignal, StoryPlayer};
use crate::segment::SegmentStatus;
use crate::{AppError, StorySourceError, STORIES_ENDPOINT};

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), "handling event");

        match event {
            Event::Noop => {}

            Event::AppStarted => {
                Self::send_stories_request(model, caps);
                caps.render.render();
            }

            Event::RefreshRequested => {
                if model.load_state.is_loading() {
                    return;
                }
                Self::send_stories_request(model, caps);
                caps.render.render();
            }

            Event::StoriesLoaded(result) => {
                match result {
                    StoriesFetchResult::Response { status, body } => {
                        match Self::decode_stories(status, body) {
                            Ok(stories) => {
                                if model.navigator.is_dragging() {
                                    // The gesture sees a frozen snapshot;
                                    // apply the new list at drag end.
                                    model.deferred_stories = Some(stories);
                                } else {
                                    Self::install_stories(model, caps, stories);
                                }
                            }
                            Err(e) => Self::fail_load(model, e),
                        }
                    }
                    StoriesFetchResult::Error(message) => {
                        Self::fail_load(model, StorySourceError::Network(message));
                    }
                }
                caps.render.render();
            }

            Event::ScenePhaseChanged { active } => {
                model.scene_active = active;
                Self::reconcile_interruptions(model, caps);
                caps.render.render();
            }

            Event::DialogVisibilityChanged { visible } => {
                model.dialog_visible = visible;
                Self::reconcile_interruptions(model, caps);
                caps.render.render();
            }

            Event::NoticeVisibilityChanged { visible } => {
                model.notice_visible = visible;
                Self::reconcile_interruptions(model, caps);
                caps.render.render();
            }

            Event::StoryIconTapped { story_id } => {
                let was_current =
                    model.viewer_open && model.current_story_id() == Some(story_id);
                if !model.navigator.set_current_story(story_id, &model.stories) {
                    return;
                }
                model.viewer_open = true;
                if was_current && model.players.contains_key(&story_id) {
                    // Became current again without an index change: re-issue
                    // the current portion so the bar reflects a fresh
                    // arrival, instead of rebuilding the whole sequence.
                    if let Some(player) = model.players.get_mut(&story_id) {
                        player.restart_current();
                    }
                    Self::resync_playback(model, caps);
                } else {
                    Self::activate_current(model, caps);
                }
                caps.render.render();
            }

            Event::ViewerDismissed => {
                Self::dismiss_viewer(model);
                caps.render.render();
            }

            Event::DragChanged { translation, .. } => {
                if !model.viewer_open {
                    return;
                }
                let was_dragging = model.navigator.is_dragging();
                model.navigator.drag_changed(translation);
                if !was_dragging {
                    Self::reconcile_interruptions(model, caps);
                }
                caps.render.render();
            }

            Event::DragEnded {
                translation,
                viewport_width,
            } => {
                if !model.viewer_open {
                    return;
                }
                let normalized = if viewport_width > 0.0 {
                    translation / viewport_width
                } else {
                    0.0
                };
                let outcome = model.navigator.handle_drag_end(normalized, &model.stories);
                model.navigator.drag_cleared();

                if let Some(stories) = model.deferred_stories.take() {
                    Self::install_stories(model, caps, stories);
                }
                let appends: Vec<DeferredAppend> = model.deferred_appends.drain(..).collect();
                for append in appends {
                    Self::apply_append(model, append);
                }

                match outcome {
                    DragOutcome::Close(story_id) => {
                        Self::close_collection(model, caps, story_id);
                    }
                    DragOutcome::MovedToPrevious | DragOutcome::MovedToNext => {
                        Self::activate_current(model, caps);
                    }
                    DragOutcome::Settled => Self::reconcile_interruptions(model, caps),
                }
                caps.render.render();
            }

            Event::TapForward => {
                if !model.viewer_open || model.navigator.is_dragging() {
                    return;
                }
                let Some(player) = model.current_player_mut() else {
                    return;
                };
                match player.skip_to_next() {
                    PlayerSignal::StoryComplete => Self::advance_story_or_close(model, caps),
                    _ => Self::resync_playback(model, caps),
                }
                caps.render.render();
            }

            Event::TapBackward => {
                if !model.viewer_open || model.navigator.is_dragging() {
                    return;
                }
                let Some(player) = model.current_player_mut() else {
                    return;
                };
                player.skip_to_previous();
                Self::resync_playback(model, caps);
                caps.render.render();
            }

            Event::FrameArrived(pulse) => {
                if !model.viewer_open || pulse.epoch != model.frame_epoch {
                    debug!(
                        pulse = pulse.epoch,
                        current = model.frame_epoch,
                        "discarding stale frame pulse"
                    );
                    return;
                }
                let dt = model.last_frame_ms.map_or(Duration::ZERO, |prev| {
                    Duration::from_millis(pulse.timestamp_ms.saturating_sub(prev))
                });
                model.last_frame_ms = Some(pulse.timestamp_ms);

                let Some(player) = model.current_player_mut() else {
                    return;
                };
                match player.tick(dt) {
                    PlayerSignal::Running | PlayerSignal::Advanced => {
                        caps.animator.request_frame(model.frame_epoch, Event::FrameArrived);
                        caps.render.render();
                    }
                    PlayerSignal::StoryComplete => {
                        Self::advance_story_or_close(model, caps);
                        caps.render.render();
                    }
                    PlayerSignal::Idle => {}
                }
            }

            Event::PortionPosted {
                story_id,
                content,
                duration_secs,
            } => {
                let append = DeferredAppend {
                    story_id,
                    content,
                    duration_secs,
                };
                if model.navigator.is_dragging() {
                    model.deferred_appends.push(append);
                    return;
                }
                Self::apply_append(model, append);
                caps.render.render();
            }

            Event::ViewportChanged { is_full_width } => {
                model.navigator.set_viewport_full_width(is_full_width);
                caps.render.render();
            }

            Event::DismissError => {
                model.clear_error();
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let mut icons: Vec<StoryIcon> = model
            .stories
            .iter()
            .map(|s| StoryIcon {
                story_id: s.id,
                user_name: s.user.name.clone(),
                avatar: s.user.avatar.clone(),
                has_content: s.has_content(),
                seen: model.seen.contains(&s.id),
            })
            .collect();
        // Unseen stories lead the row; the sort is stable, so feed order is
        // preserved within each group.
        icons.sort_by_key(|i| i.seen);

        let viewer = if model.viewer_open {
            model.current_story().and_then(|story| {
                let player = model.players.get(&story.id)?;
                let segments = story
                    .portions
                    .iter()
                    .map(|p| SegmentView {
                        portion_id: p.id,
                        fraction: player.fraction(p.id),
                        status: player.status(p.id),
                    })
                    .collect();
                let current_portion = player
                    .current_portion_id()
                    .and_then(|pid| story.portions.iter().find(|p| p.id == pid))
                    .map(|p| PortionView {
                        portion_id: p.id,
                        content: p.content.clone(),
                        duration_secs: p.duration().as_secs_f32(),
                    });
                Some(ViewerView {
                    story_id: story.id,
                    user_name: story.user.name.clone(),
                    segments,
                    current_portion,
                    paused: player.is_paused(),
                    dragging: model.navigator.is_dragging(),
                    uses_cubic_rotation: model.navigator.uses_cubic_rotation(),
                })
            })
        } else {
            None
        };

        ViewModel {
            is_loading: model.load_state.is_loading(),
            icons,
            viewer,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}

impl App {
    fn send_stories_request(model: &mut Model, caps: &Capabilities) {
        model.load_state = LoadState::Loading;
        caps.http.get(STORIES_ENDPOINT).send(|result| {
            let outcome = match result {
                Ok(mut response) => StoriesFetchResult::Response {
                    status: response.status().into(),
                    body: response.take_body(),
                },
                Err(e) => StoriesFetchResult::Error(e.to_string()),
            };
            Event::StoriesLoaded(outcome)
        });
    }

    fn decode_stories(
        status: u16,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<Story>, StorySourceError> {
        if status == 404 {
            return Err(StorySourceError::NotFound);
        }
        if !(200..300).contains(&status) {
            return Err(StorySourceError::Network(format!(
                "unexpected status {status}"
            )));
        }
        let bytes =
            body.ok_or_else(|| StorySourceError::InvalidData("empty response body".into()))?;
        serde_json::from_slice(&bytes).map_err(|e| StorySourceError::InvalidData(e.to_string()))
    }

    fn install_stories(model: &mut Model, caps: &Capabilities, stories: Vec<Story>) {
        model.load_state = LoadState::Loaded;
        model.clear_error();
        model.stories = stories;
        let count = model.stories.len();
        model.navigator.reconcile_count(count);

        // Players survive a refresh only while their story's shape is
        // unchanged; anything else is transient state for a stale snapshot.
        let shape: HashMap<StoryId, usize> = model
            .stories
            .iter()
            .map(|s| (s.id, s.portions.len()))
            .collect();
        model
            .players
            .retain(|id, player| shape.get(id).is_some_and(|len| *len == player.len()));
        model.seen.retain(|id| shape.contains_key(id));

        if model.viewer_open {
            if count == 0 {
                Self::dismiss_viewer(model);
            } else if model
                .current_story_id()
                .is_some_and(|id| !model.players.contains_key(&id))
            {
                Self::activate_current(model, caps);
            }
        }
    }

    fn fail_load(model: &mut Model, error: StorySourceError) {
        warn!(%error, "story feed load failed");
        model.load_state = LoadState::Failed;
        model.stories.clear();
        model.navigator.reconcile_count(0);
        if model.viewer_open {
            Self::dismiss_viewer(model);
        } else {
            model.evict_all_players();
        }
        model.set_error(AppError::from(error));
    }

    /// Activate the player for the story the navigator points at, creating
    /// it if the story just entered the active window. Empty stories report
    /// completion immediately and fall through to the next story.
    fn activate_current(model: &mut Model, caps: &Capabilities) {
        let Some(story) = model.current_story().cloned() else {
            Self::dismiss_viewer(model);
            return;
        };
        let story_id = story.id;
        let signal = model
            .players
            .entry(story_id)
            .or_insert_with(|| StoryPlayer::new(&story))
            .activate();

        match signal {
            PlayerSignal::StoryComplete => Self::advance_story_or_close(model, caps),
            _ => {
                model.evict_players_outside_window();
                Self::resync_playback(model, caps);
            }
        }
    }

    /// Consume a story-complete signal: advance to the next story, or close
    /// the collection on the completed story's id when it is the last one.
    fn advance_story_or_close(model: &mut Model, caps: &Capabilities) {
        let Some(story_id) = model.current_story_id() else {
            Self::dismiss_viewer(model);
            return;
        };
        model.mark_seen(story_id);

        let count = model.stories.len();
        if model.navigator.current_index() + 1 >= count {
            Self::close_collection(model, caps, story_id);
        } else {
            model.navigator.move_to_next(count);
            Self::activate_current(model, caps);
        }
    }

    fn close_collection(model: &mut Model, caps: &Capabilities, story_id: StoryId) {
        Self::dismiss_viewer(model);
        caps.presenter.close_collection(story_id);
    }

    fn dismiss_viewer(model: &mut Model) {
        model.viewer_open = false;
        model.next_epoch();
        model.evict_all_players();
        model.navigator.drag_cleared();
    }

    /// Re-evaluate the combined pause predicate against the current player,
    /// with idempotent transitions. A pause invalidates in-flight frame
    /// callbacks; a resume starts a fresh frame generation.
    fn reconcile_interruptions(model: &mut Model, caps: &Capabilities) {
        if !model.viewer_open {
            return;
        }
        let want_pause = model.interruption_active();
        let Some(player) = model.current_player_mut() else {
            return;
        };
        if want_pause {
            if player.pause_all() {
                model.next_epoch();
            }
        } else if player.resume_all() {
            let epoch = model.next_epoch();
            caps.animator.request_frame(epoch, Event::FrameArrived);
        }
    }

    /// After a skip or activation: the freshly started portion must respect
    /// the pause predicate, and the frame loop needs a new generation.
    fn resync_playback(model: &mut Model, caps: &Capabilities) {
        if model.interruption_active() {
            if let Some(player) = model.current_player_mut() {
                player.pause_all();
            }
            model.next_epoch();
        } else {
            let epoch = model.next_epoch();
            caps.animator.request_frame(epoch, Event::FrameArrived);
        }
    }

    fn apply_append(model: &mut Model, append: DeferredAppend) {
        let Some(story) = model.stories.iter_mut().find(|s| s.id == append.story_id) else {
            debug!(story = %append.story_id, "dropping portion for unknown story");
            return;
        };
        let portion = Portion::new(story.next_portion_id(), append.content, append.duration_secs);
        story.portions.push(portion.clone());
        if let Some(player) = model.players.get_mut(&append.story_id) {
            player.append_portion(&portion);
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoryIcon {
    pub story_id: StoryId,
    pub user_name: String,
    pub avatar: Option<Url>,
    pub has_content: bool,
    pub seen: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SegmentView {
    pub portion_id: PortionId,
    pub fraction: f32,
    pub status: SegmentStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PortionView {
    pub portion_id: PortionId,
    pub content: MediaContent,
    pub duration_secs: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewerView {
    pub story_id: StoryId,
    pub user_name: String,
    pub segments: Vec<SegmentView>,
    pub current_portion: Option<PortionView>,
    pub paused: bool,
    pub dragging: bool,
    pub uses_cubic_rotation: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.kind.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub is_loading: bool,
    pub icons: Vec<StoryIcon>,
    pub viewer: Option<ViewerView>,
    pub error: Option<UserFacingError>,
}
