//! The playback sync controller: a small reactive state machine that keeps a
//! "current caption" cursor aligned with an advancing playback clock.
//!
//! The controller is single-threaded and event-driven. Two independent producers
//! feed it: a playback-time ticker (bounded cadence, never faster than display
//! refresh) and track-level cue-change notifications. Both are delivered as
//! ordinary method calls; all mutation happens synchronously inside them.
//!
//! Cue-change and time-update events may interleave in any order, so every
//! handler recomputes the current block and spoken flags from scratch instead of
//! patching incrementally. The view model is rebuilt and published once per
//! settled state change via an explicit [`ViewModelSink`].
//!
//! Platform concerns (text tracks, the scroll container) are reached only
//! through the [`TrackAdapter`] and [`Viewport`] capability traits, so the whole
//! state machine is unit-testable with fakes.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::colors::SpeakerColorMap;
use crate::convert::cues_to_segments;
use crate::cue::Cue;
use crate::grouping::{
    CaptionBlock, Position, coalesce_segments, group_cues, group_segments,
};
use crate::locator::{debug_check_time_ordered, find_block_for_cue};
use crate::opts::{GroupingMode, Opts};

/// Platform capability: the active text track.
///
/// Implemented by the platform adapter (DOM, native player, or a test fake).
/// The controller only ever reads cues and manages per-cue exit watches through
/// this trait.
pub trait TrackAdapter {
    /// The track's cue list, or `None` while the platform is still parsing it.
    /// Tracks may announce themselves before their cues are populated.
    fn cues(&self) -> Option<Vec<Cue>>;

    /// Start delivering an exit notification for this cue (via
    /// [`SyncController::on_cue_exit`]).
    fn watch_cue_exit(&mut self, cue_id: &str);

    /// Stop delivering exit notifications for this cue. Every watch must be
    /// dropped before the controller attaches to another cue or track;
    /// a dangling watch is both a resource leak and a correctness bug.
    fn unwatch_cue_exit(&mut self, cue_id: &str);
}

/// Platform capability: the scroll container holding the rendered captions.
pub trait Viewport {
    /// Whether the block's bounding region overlaps the visible scroll region.
    fn is_visible(&self, block_id: &str) -> bool;

    /// Move the viewport so the block is visible.
    fn scroll_to(&mut self, block_id: &str, behavior: ScrollBehavior);
}

/// How a requested scroll should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Animated follow while the user is reading along.
    Smooth,

    /// Immediate reposition, used for explicit jump requests.
    Instant,
}

/// Consumer of settled view models, implemented by the presentation layer.
pub trait ViewModelSink {
    fn publish(&mut self, view: &ViewModel);
}

/// The controller's scroll decision, surfaced to the presentation layer.
///
/// The engine never wrestles scroll position away from a user who has
/// intentionally scrolled elsewhere: once `JumpAvailable` is raised, no smooth
/// follow happens until an explicit jump request clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollIntent {
    None,
    Smooth,
    JumpAvailable,
}

/// One segment as the presentation layer renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(rename = "startTime")]
    pub start_seconds: f64,
    #[serde(rename = "endTime")]
    pub end_seconds: f64,
    pub body: String,

    /// Whether playback has reached this segment's start.
    pub spoken: bool,
}

/// One caption block as the presentation layer renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub position: Position,

    /// Whether playback has moved past the block's last cue.
    pub complete: bool,

    pub segments: Vec<SegmentView>,
}

/// The render-facing output of the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub blocks: Vec<BlockView>,
    #[serde(rename = "currentBlockId", skip_serializing_if = "Option::is_none")]
    pub current_block_id: Option<String>,
    #[serde(rename = "scrollIntent")]
    pub scroll_intent: ScrollIntent,
}

/// The controller's mutable state, rebuilt rather than patched on every event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncState {
    /// The most recent active cue reported by the track.
    pub current_cue: Option<Cue>,

    /// The block owning the current cue, per the locator.
    pub current_block_id: Option<String>,

    /// Cues whose exit notification has fired.
    pub completed_cue_ids: HashSet<String>,

    /// Whether the manual "jump to current" affordance is showing.
    pub show_jump_affordance: bool,
}

/// The playback sync controller.
///
/// Owns the caption blocks and speaker color map for the lifetime of one track;
/// a track change discards and rebuilds everything. Nothing carries across
/// tracks.
pub struct SyncController<A: TrackAdapter, V: Viewport, S: ViewModelSink> {
    adapter: A,
    viewport: V,
    sink: S,
    opts: Opts,

    colors: SpeakerColorMap,
    blocks: Vec<CaptionBlock>,
    state: SyncState,

    /// The cue we currently hold an exit watch on.
    watched_cue: Option<String>,

    /// Set when a track announced itself before its cues were parsed; retried
    /// on subsequent time updates.
    awaiting_cues: bool,

    /// Last observed playback position in seconds.
    current_time: f64,

    /// Scroll intent for the next publish; `Smooth` is transient per event.
    scroll_intent: ScrollIntent,
}

impl<A: TrackAdapter, V: Viewport, S: ViewModelSink> SyncController<A, V, S> {
    pub fn new(adapter: A, viewport: V, sink: S, opts: Opts) -> Self {
        let colors = opts.color_map();
        Self {
            adapter,
            viewport,
            sink,
            opts,
            colors,
            blocks: Vec::new(),
            state: SyncState::default(),
            watched_cue: None,
            awaiting_cues: false,
            current_time: 0.0,
            scroll_intent: ScrollIntent::None,
        }
    }

    /// The current state, primarily for tests and diagnostics.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// The current blocks, primarily for tests and diagnostics.
    pub fn blocks(&self) -> &[CaptionBlock] {
        &self.blocks
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// A new text track became the active caption source.
    ///
    /// All state from the previous track is discarded, the color map resets, and
    /// blocks are rebuilt from the new track's cues. If the platform has not yet
    /// parsed the cue list, the rebuild is deferred to upcoming time updates and
    /// nothing is published until it succeeds.
    pub fn on_track_add(&mut self) {
        self.detach_watch();
        self.state = SyncState::default();
        self.colors.reset();
        self.blocks.clear();
        self.scroll_intent = ScrollIntent::None;

        if !self.try_rebuild() {
            debug!("track announced before cues were parsed; deferring rebuild");
            self.awaiting_cues = true;
            return;
        }
        self.publish();
    }

    /// The active track was removed. Nothing carries across tracks.
    pub fn on_track_remove(&mut self) {
        self.detach_watch();
        self.state = SyncState::default();
        self.colors.reset();
        self.blocks.clear();
        self.awaiting_cues = false;
        self.scroll_intent = ScrollIntent::None;
        self.publish();
    }

    /// The track reported a change in its set of active cues.
    ///
    /// Tracks may report several simultaneously-active cues; the most recent
    /// (last) one wins. The exit watch moves from the old cue to the new one
    /// before any recomputation.
    pub fn on_cue_change(&mut self, active: &[Cue]) {
        let Some(cue) = active.last() else {
            return;
        };

        let changed = self
            .state
            .current_cue
            .as_ref()
            .is_none_or(|current| current.id != cue.id);

        if changed {
            self.detach_watch();
            self.adapter.watch_cue_exit(&cue.id);
            self.watched_cue = Some(cue.id.clone());
            self.state.current_cue = Some(cue.clone());
        }

        self.recompute_current_block();
        self.publish();
    }

    /// A watched cue's exit notification fired.
    pub fn on_cue_exit(&mut self, cue_id: &str) {
        self.state.completed_cue_ids.insert(cue_id.to_string());
        if self.watched_cue.as_deref() == Some(cue_id) {
            self.adapter.unwatch_cue_exit(cue_id);
            self.watched_cue = None;
        }
    }

    /// The playback clock advanced.
    ///
    /// Also the retry point for a track that announced itself before its cues
    /// were parsed. Spoken flags and block completeness are recomputed from
    /// scratch during publish, which makes this handler idempotent under
    /// reordering with [`Self::on_cue_change`].
    pub fn on_time_update(&mut self, seconds: f64) {
        self.current_time = seconds;

        if self.awaiting_cues {
            if !self.try_rebuild() {
                return;
            }
            self.awaiting_cues = false;
        }

        self.recompute_current_block();
        self.publish();
    }

    /// The scroll container scrolled (user- or engine-initiated).
    ///
    /// Visibility of the current block is recomputed and the jump affordance
    /// toggled accordingly; it may turn on without any cue change when the user
    /// scrolls away from an already-current block.
    pub fn on_scroll(&mut self) {
        let Some(block_id) = self.state.current_block_id.clone() else {
            return;
        };
        let visible = self.viewport.is_visible(&block_id);
        if self.state.show_jump_affordance == visible {
            self.state.show_jump_affordance = !visible;
            self.publish();
        }
    }

    /// The user explicitly asked to jump back to the current caption.
    ///
    /// Performs an instant (non-smooth) scroll and clears the affordance. This
    /// is the only way an automatic follow resumes after the user scrolled away.
    pub fn request_jump(&mut self) {
        let Some(block_id) = self.state.current_block_id.clone() else {
            return;
        };
        self.viewport.scroll_to(&block_id, ScrollBehavior::Instant);
        self.state.show_jump_affordance = false;
        self.publish();
    }

    fn detach_watch(&mut self) {
        if let Some(id) = self.watched_cue.take() {
            self.adapter.unwatch_cue_exit(&id);
        }
    }

    /// Rebuild blocks from the adapter's cue list. Returns false while the
    /// platform has not yet produced cues.
    fn try_rebuild(&mut self) -> bool {
        let Some(cues) = self.adapter.cues() else {
            return false;
        };
        if cues.is_empty() {
            return false;
        }

        self.colors.reset();
        self.blocks = match self.opts.grouping {
            GroupingMode::Feed => group_cues(&cues, &mut self.colors),
            GroupingMode::Transcript => {
                let segments = coalesce_segments(&cues_to_segments(&cues));
                let mut blocks = group_segments(&segments, &mut self.colors);
                attach_cues_by_time(&mut blocks, &cues);
                blocks
            }
        };
        debug_check_time_ordered(&self.blocks);
        debug!(blocks = self.blocks.len(), "rebuilt caption blocks");

        self.recompute_current_block();
        true
    }

    /// Re-derive the current block from the current cue, from scratch, and run
    /// the scroll-intent decision when the block changed.
    fn recompute_current_block(&mut self) {
        let next = self
            .state
            .current_cue
            .as_ref()
            .and_then(|cue| find_block_for_cue(&self.blocks, cue))
            .map(|idx| self.blocks[idx].id.clone());

        if next == self.state.current_block_id {
            return;
        }

        let previous = self.state.current_block_id.take();
        self.state.current_block_id = next.clone();

        let Some(next_id) = next else {
            return;
        };

        // Auto-follow only while the user is reading along. If the viewport was
        // scrolled away from the previous current block, raise the affordance
        // instead and wait for an explicit jump.
        if self.state.show_jump_affordance {
            return;
        }

        let was_following = previous
            .map(|id| self.viewport.is_visible(&id))
            .unwrap_or(true);

        if was_following {
            self.viewport.scroll_to(&next_id, ScrollBehavior::Smooth);
            self.scroll_intent = ScrollIntent::Smooth;
        } else {
            self.state.show_jump_affordance = true;
        }
    }

    /// Build the render-facing view model from scratch and hand it to the sink.
    fn publish(&mut self) {
        let current = self.state.current_block_id.as_deref();

        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                let is_current = Some(block.id.as_str()) == current;
                BlockView {
                    id: block.id.clone(),
                    speaker: block.speaker.clone(),
                    color: block.color.clone(),
                    position: block.position,
                    complete: self.current_time > block.end_seconds(),
                    segments: block
                        .segments
                        .iter()
                        .map(|s| SegmentView {
                            speaker: s.speaker.clone(),
                            start_seconds: s.start_seconds,
                            end_seconds: s.end_seconds,
                            body: s.body.clone(),
                            spoken: is_current && s.start_seconds <= self.current_time,
                        })
                        .collect(),
                }
            })
            .collect();

        let scroll_intent = if self.state.show_jump_affordance {
            ScrollIntent::JumpAvailable
        } else {
            // Smooth is transient: it reports the follow performed by this event.
            std::mem::replace(&mut self.scroll_intent, ScrollIntent::None)
        };

        let view = ViewModel {
            blocks,
            current_block_id: self.state.current_block_id.clone(),
            scroll_intent,
        };
        self.sink.publish(&view);
    }
}

/// Attach each cue to the segment-grouped block whose time range contains its
/// start, so the locator's id match works in transcript mode too.
fn attach_cues_by_time(blocks: &mut [CaptionBlock], cues: &[Cue]) {
    for cue in cues {
        let owner = blocks.iter_mut().find(|b| {
            b.start_seconds() <= cue.start_seconds && cue.start_seconds <= b.end_seconds()
        });
        if let Some(block) = owner {
            block.cues.push(cue.clone());
        }
    }
}
