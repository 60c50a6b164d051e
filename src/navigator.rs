use tracing::debug;

use crate::model::{Story, StoryId};
use crate::CLOSE_DRAG_THRESHOLD;

/// Ephemeral gesture state: the index snapshot taken at drag start plus the
/// latest translation. Discarded when the drag ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub origin_index: usize,
    pub translation: f32,
}

/// What a finished drag asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Collapse the collection onto the given story.
    Close(StoryId),
    MovedToPrevious,
    MovedToNext,
    /// Small drag: no index change, the view springs back.
    Settled,
}

/// Owns the current story index within the visible collection and turns
/// horizontal drag displacement into story switches or a close signal at
/// the boundaries.
#[derive(Debug, Clone, Default)]
pub struct CollectionNavigator {
    current: usize,
    drag: Option<DragState>,
    uses_cubic_rotation: bool,
}

impl CollectionNavigator {
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub const fn drag(&self) -> Option<DragState> {
        self.drag
    }

    /// Geometry feedback from the shell: the cubic-rotation transition
    /// applies only while the story viewport spans the full display width.
    #[must_use]
    pub const fn uses_cubic_rotation(&self) -> bool {
        self.uses_cubic_rotation
    }

    pub fn set_viewport_full_width(&mut self, full_width: bool) {
        self.uses_cubic_rotation = full_width;
    }

    /// Explicit jump (icon tap). Unknown ids are ignored.
    pub fn set_current_story(&mut self, id: StoryId, stories: &[Story]) -> bool {
        match stories.iter().position(|s| s.id == id) {
            Some(index) => {
                self.current = index;
                true
            }
            None => {
                debug!(story = %id, "ignoring jump to unknown story");
                false
            }
        }
    }

    /// Increment the index, clamped to the last story. Returns whether the
    /// index changed; a boundary call is a no-op.
    pub fn move_to_next(&mut self, count: usize) -> bool {
        if count == 0 || self.current + 1 >= count {
            return false;
        }
        self.current += 1;
        true
    }

    /// Decrement the index, clamped to the first story.
    pub fn move_to_previous(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// A later fetch with a different story count is reconciled by clamping
    /// the index, never by an error.
    pub fn reconcile_count(&mut self, count: usize) {
        if count == 0 {
            self.current = 0;
        } else {
            self.current = self.current.min(count - 1);
        }
    }

    /// Record an in-progress drag translation. The first change snapshots
    /// the index and raises the drag-in-progress flag; while it is up, the
    /// story list is treated as a frozen snapshot and taps are not
    /// processed.
    pub fn drag_changed(&mut self, translation: f32) {
        match &mut self.drag {
            Some(state) => state.translation = translation,
            None => {
                self.drag = Some(DragState {
                    origin_index: self.current,
                    translation,
                });
            }
        }
    }

    pub fn drag_cleared(&mut self) {
        self.drag = None;
    }

    /// Decide what a finished drag means. `normalized` is the final
    /// translation divided by the viewport width, positive when dragged
    /// right (revealing the previous story):
    ///
    /// - beyond +0.2 on the first story, or −0.2 on the last, the
    ///   collection closes on that story's own id;
    /// - otherwise a drag that rounds to a page moves by sign;
    /// - anything smaller springs back.
    pub fn handle_drag_end(&mut self, normalized: f32, stories: &[Story]) -> DragOutcome {
        let count = stories.len();
        if count == 0 {
            return DragOutcome::Settled;
        }
        let last = count - 1;

        if self.current == 0 && normalized > CLOSE_DRAG_THRESHOLD {
            return DragOutcome::Close(stories[0].id);
        }
        if self.current == last && normalized < -CLOSE_DRAG_THRESHOLD {
            return DragOutcome::Close(stories[last].id);
        }

        if normalized.round() != 0.0 {
            if normalized >= 0.0 {
                if self.move_to_previous() {
                    return DragOutcome::MovedToPrevious;
                }
            } else if self.move_to_next(count) {
                return DragOutcome::MovedToNext;
            }
        }
        DragOutcome::Settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaContent, Portion, PortionId, User, UserId};
    use url::Url;

    fn stories(count: u64) -> Vec<Story> {
        (0..count)
            .map(|i| Story {
                id: StoryId(i + 100),
                user: User {
                    id: UserId(i),
                    name: format!("user-{i}"),
                    avatar: None,
                },
                portions: vec![Portion::new(
                    PortionId(0),
                    MediaContent::Image {
                        url: Url::parse("https://cdn.storyline.app/a.jpg").unwrap(),
                    },
                    None,
                )],
            })
            .collect()
    }

    #[test]
    fn drag_past_threshold_at_first_story_closes_on_its_id() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();

        assert_eq!(
            nav.handle_drag_end(0.25, &stories),
            DragOutcome::Close(StoryId(100))
        );
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn drag_past_threshold_at_last_story_closes_on_its_id() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(3);
        nav.move_to_next(3);

        assert_eq!(
            nav.handle_drag_end(-0.25, &stories),
            DragOutcome::Close(StoryId(102))
        );
    }

    #[test]
    fn half_page_drag_in_the_middle_moves_to_previous() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(3);

        assert_eq!(nav.handle_drag_end(0.5, &stories), DragOutcome::MovedToPrevious);
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn small_drag_settles_without_moving_or_closing() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(3);

        assert_eq!(nav.handle_drag_end(0.05, &stories), DragOutcome::Settled);
        assert_eq!(nav.handle_drag_end(-0.05, &stories), DragOutcome::Settled);
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn below_threshold_boundary_drag_settles() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();

        // 0.15 is under the close threshold and rounds to zero pages.
        assert_eq!(nav.handle_drag_end(0.15, &stories), DragOutcome::Settled);
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn leftward_drag_at_first_story_moves_to_next() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();

        assert_eq!(nav.handle_drag_end(-0.6, &stories), DragOutcome::MovedToNext);
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn multi_page_fling_still_moves_a_single_story() {
        let stories = stories(5);
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(5);
        nav.move_to_next(5);

        assert_eq!(nav.handle_drag_end(1.7, &stories), DragOutcome::MovedToPrevious);
        assert_eq!(nav.current_index(), 1);

        assert_eq!(nav.handle_drag_end(-2.3, &stories), DragOutcome::MovedToNext);
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn single_story_collection_closes_in_both_directions() {
        let stories = stories(1);
        let mut nav = CollectionNavigator::default();

        assert_eq!(
            nav.handle_drag_end(0.3, &stories),
            DragOutcome::Close(StoryId(100))
        );
        assert_eq!(
            nav.handle_drag_end(-0.3, &stories),
            DragOutcome::Close(StoryId(100))
        );
    }

    #[test]
    fn moves_clamp_at_the_boundaries() {
        let mut nav = CollectionNavigator::default();
        assert!(!nav.move_to_previous());
        assert!(!nav.move_to_next(1));

        assert!(nav.move_to_next(2));
        assert!(!nav.move_to_next(2));
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn jump_by_id_ignores_unknown_stories() {
        let stories = stories(3);
        let mut nav = CollectionNavigator::default();

        assert!(nav.set_current_story(StoryId(102), &stories));
        assert_eq!(nav.current_index(), 2);

        assert!(!nav.set_current_story(StoryId(999), &stories));
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn reconcile_clamps_after_a_shrinking_fetch() {
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(5);
        nav.move_to_next(5);
        nav.move_to_next(5);
        nav.move_to_next(5);
        assert_eq!(nav.current_index(), 4);

        nav.reconcile_count(2);
        assert_eq!(nav.current_index(), 1);

        nav.reconcile_count(0);
        assert_eq!(nav.current_index(), 0);
    }

    #[test]
    fn drag_snapshot_is_taken_at_drag_start() {
        let mut nav = CollectionNavigator::default();
        nav.move_to_next(3);

        nav.drag_changed(-12.0);
        nav.drag_changed(-80.0);
        let drag = nav.drag().unwrap();
        assert_eq!(drag.origin_index, 1);
        assert!((drag.translation - -80.0).abs() < f32::EPSILON);

        nav.drag_cleared();
        assert!(!nav.is_dragging());
    }
}
