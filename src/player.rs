use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::model::{Portion, PortionId, Story, StoryId};
use crate::segment::{SegmentStatus, SegmentTimer};

/// What the player wants its owner to do after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    /// Nothing is animating; no further frames are needed.
    Idle,
    /// The current segment is animating; keep the frame loop going.
    Running,
    /// The current segment finished and the next portion started.
    Advanced,
    /// The last portion finished; the story is complete.
    StoryComplete,
}

#[derive(Debug, Clone)]
struct SegmentSlot {
    portion_id: PortionId,
    timer: SegmentTimer,
}

/// Drives one story's portion sequence: owns the current portion index and
/// the per-portion status map, and runs exactly one segment timer at a
/// time. Created when its story enters the active window, discarded when it
/// leaves; all state is transient.
pub struct StoryPlayer {
    story_id: StoryId,
    slots: Vec<SegmentSlot>,
    current: usize,
    statuses: HashMap<PortionId, SegmentStatus>,
}

impl StoryPlayer {
    #[must_use]
    pub fn new(story: &Story) -> Self {
        let slots = story
            .portions
            .iter()
            .map(|p| SegmentSlot {
                portion_id: p.id,
                timer: SegmentTimer::new(p.duration()),
            })
            .collect();
        Self {
            story_id: story.id,
            slots,
            current: 0,
            statuses: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn story_id(&self) -> StoryId {
        self.story_id
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_portion_id(&self) -> Option<PortionId> {
        self.slots.get(self.current).map(|s| s.portion_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn status(&self, portion_id: PortionId) -> SegmentStatus {
        self.statuses
            .get(&portion_id)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn fraction(&self, portion_id: PortionId) -> f32 {
        self.slots
            .iter()
            .find(|s| s.portion_id == portion_id)
            .map_or(0.0, |s| s.timer.fraction())
    }

    /// Whether the current portion is sitting in `Paused`.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.current_portion_id()
            .is_some_and(|id| self.status(id).is_paused())
    }

    /// Re-arm the whole sequence: every portion back to `Uninitialized` in
    /// order, then the first portion driven to `Started` (or `Restarted`
    /// when its timer had already been initialized). An empty sequence
    /// performs no animation and immediately reports completion.
    pub fn activate(&mut self) -> PlayerSignal {
        if self.slots.is_empty() {
            return PlayerSignal::StoryComplete;
        }

        for slot in &mut self.slots {
            slot.timer.initialize();
        }
        let previously_driven: Vec<PortionId> = self
            .statuses
            .iter()
            .filter(|(_, s)| s.is_initialized())
            .map(|(id, _)| *id)
            .collect();
        self.statuses.clear();
        for slot in &self.slots {
            self.statuses
                .insert(slot.portion_id, SegmentStatus::Uninitialized);
        }

        self.current = 0;
        self.start_portion(0, &previously_driven);
        PlayerSignal::Running
    }

    fn start_portion(&mut self, index: usize, previously_driven: &[PortionId]) {
        let Some(id) = self.slots.get(index).map(|s| s.portion_id) else {
            return;
        };
        let already_driven = previously_driven.contains(&id)
            || self
                .statuses
                .get(&id)
                .copied()
                .unwrap_or_default()
                .is_initialized();
        let status = if already_driven {
            SegmentStatus::Restarted
        } else {
            SegmentStatus::Started
        };
        self.slots[index].timer.start();
        self.statuses.insert(id, status);
    }

    /// Re-issue `Started`/`Restarted` for the current portion. Called when
    /// this story becomes the collection's current story again; never for a
    /// mere foreground transition, which only resumes.
    pub fn restart_current(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        self.start_portion(self.current, &[]);
    }

    /// Handle a completion notification for the portion at `index`. Stale
    /// notifications (for any index other than the current one) leave all
    /// state untouched.
    pub fn on_segment_finished(&mut self, index: usize) -> PlayerSignal {
        if index != self.current {
            debug!(
                story = %self.story_id,
                stale = index,
                current = self.current,
                "discarding stale segment completion"
            );
            return self.running_state();
        }

        let Some(slot) = self.slots.get_mut(index) else {
            return PlayerSignal::Idle;
        };
        slot.timer.finish();
        let id = slot.portion_id;
        self.statuses.insert(id, SegmentStatus::Finished);

        if self.current + 1 < self.slots.len() {
            self.current += 1;
            self.start_portion(self.current, &[]);
            PlayerSignal::Advanced
        } else {
            PlayerSignal::StoryComplete
        }
    }

    /// Advance the current segment by one animation-frame delta. Only the
    /// current portion's timer ever runs, so completions within a story are
    /// strictly sequential.
    pub fn tick(&mut self, dt: Duration) -> PlayerSignal {
        if self.slots.is_empty() {
            return PlayerSignal::StoryComplete;
        }
        let index = self.current;
        let running = self
            .current_portion_id()
            .is_some_and(|id| self.status(id).is_running());
        if !running {
            return PlayerSignal::Idle;
        }

        let completed = self.slots[index].timer.advance(dt);
        if completed {
            self.on_segment_finished(index)
        } else {
            PlayerSignal::Running
        }
    }

    /// Pause the current portion. Non-current portions are untouched; they
    /// are never running. Returns whether a transition happened.
    pub fn pause_all(&mut self) -> bool {
        let Some(id) = self.current_portion_id() else {
            return false;
        };
        if !self.status(id).is_running() {
            return false;
        }
        self.slots[self.current].timer.pause();
        self.statuses.insert(id, SegmentStatus::Paused);
        true
    }

    /// Resume the current portion if paused, preserving its elapsed
    /// fraction. Returns whether a transition happened.
    pub fn resume_all(&mut self) -> bool {
        let Some(id) = self.current_portion_id() else {
            return false;
        };
        if !self.status(id).is_paused() {
            return false;
        }
        self.slots[self.current].timer.resume();
        self.statuses.insert(id, SegmentStatus::Resumed);
        true
    }

    /// Tap navigation forward: finish the current segment and follow the
    /// same advance/story-complete rules as natural completion.
    pub fn skip_to_next(&mut self) -> PlayerSignal {
        if self.slots.is_empty() {
            return PlayerSignal::StoryComplete;
        }
        self.slots[self.current].timer.finish();
        self.on_segment_finished(self.current)
    }

    /// Tap navigation backward: reset the current portion and step back,
    /// clamped at the first portion (which restarts instead).
    pub fn skip_to_previous(&mut self) -> PlayerSignal {
        if self.slots.is_empty() {
            return PlayerSignal::Idle;
        }
        let id = self.slots[self.current].portion_id;
        self.slots[self.current].timer.initialize();
        self.statuses.insert(id, SegmentStatus::Uninitialized);

        if self.current > 0 {
            self.current -= 1;
        }
        self.start_portion(self.current, &[]);
        PlayerSignal::Running
    }

    /// Track a freshly appended portion: a new segment slot at the end of
    /// the sequence, uninitialized until playback reaches it.
    pub fn append_portion(&mut self, portion: &Portion) {
        self.slots.push(SegmentSlot {
            portion_id: portion.id,
            timer: SegmentTimer::new(portion.duration()),
        });
        self.statuses
            .insert(portion.id, SegmentStatus::Uninitialized);
    }

    fn running_state(&self) -> PlayerSignal {
        let running = self
            .current_portion_id()
            .is_some_and(|id| self.status(id).is_running());
        if running {
            PlayerSignal::Running
        } else {
            PlayerSignal::Idle
        }
    }
}
