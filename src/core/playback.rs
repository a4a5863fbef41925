//! Playback scheduler: a cooperative Idle/Playing state machine.
//!
//! Every user action arrives as a [`PlaybackCommand`] message and goes through
//! [`PlaybackScheduler::apply`]. The tick system re-enters once per display
//! frame with the ticket issued by the previous transition; tickets minted
//! before a pause, scrub, cancel or reload carry an old epoch and are dropped.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable playback parameters (`[playback]` in `~/.sectorflowrc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Time each snapshot stays on screen while playing.
    pub frame_ms: u64,
    /// Duration of the animated move between two snapshots.
    pub transition_ms: u64,
    /// Start playing as soon as the first dataset is baked.
    pub autoplay: bool,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            frame_ms: 2500,
            transition_ms: 1200,
            autoplay: false,
        }
    }
}

impl PlaybackParams {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
}

/// User or dependency driven request. Sent as a message, applied in order.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Toggle,
    /// Jump to an index (clamped). Stops playback.
    Scrub(usize),
    /// Scrub relative to the current index (clamped, no wrap). Stops playback.
    Step(isize),
    /// Drop any scheduled tick and go idle. Idempotent.
    Cancel,
    /// The dataset changed: cancel, adopt the new length, rewind to 0.
    Reload { snapshot_count: usize },
}

/// Handle for one scheduled tick. Only valid for the epoch it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Frame duration elapsed; the index moved to the contained value.
    Advanced(usize),
    /// Not yet time; the next tick has been scheduled.
    Waiting,
    /// The ticket predates a cancellation and was discarded.
    Stale,
}

#[derive(Resource, Debug, Clone)]
pub struct PlaybackScheduler {
    current_index: usize,
    snapshot_count: usize,
    phase: PlaybackPhase,
    frame_duration: Duration,
    last_advance: Duration,
    epoch: u64,
    pending: Option<TickTicket>,
}

impl PlaybackScheduler {
    pub fn new(snapshot_count: usize, frame_duration: Duration) -> Self {
        Self {
            current_index: 0,
            snapshot_count,
            phase: PlaybackPhase::Idle,
            frame_duration,
            last_advance: Duration::ZERO,
            epoch: 0,
            pending: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Timestamp of the last index advance (or of the play that started the run).
    pub fn last_advance(&self) -> Duration {
        self.last_advance
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    /// Single transition function for every command. Returns true when the
    /// phase or index changed.
    pub fn apply(&mut self, command: PlaybackCommand, now: Duration) -> bool {
        let before = (self.phase, self.current_index);
        match command {
            PlaybackCommand::Play => self.play(now),
            PlaybackCommand::Pause | PlaybackCommand::Cancel => self.cancel(),
            PlaybackCommand::Toggle => {
                if self.is_playing() {
                    self.cancel();
                } else {
                    self.play(now);
                }
            }
            PlaybackCommand::Scrub(index) => self.scrub(index),
            PlaybackCommand::Step(delta) => {
                let target = self.current_index.saturating_add_signed(delta);
                self.scrub(target);
            }
            PlaybackCommand::Reload { snapshot_count } => {
                self.cancel();
                self.snapshot_count = snapshot_count;
                self.current_index = 0;
            }
        }
        before != (self.phase, self.current_index)
    }

    fn play(&mut self, now: Duration) {
        if self.is_playing() || self.snapshot_count == 0 {
            return;
        }
        self.phase = PlaybackPhase::Playing;
        self.last_advance = now;
        self.schedule();
    }

    fn scrub(&mut self, index: usize) {
        self.cancel();
        self.current_index = index.min(self.snapshot_count.saturating_sub(1));
    }

    /// Go idle and invalidate every outstanding ticket. Safe to call repeatedly.
    fn cancel(&mut self) {
        if self.is_playing() || self.pending.is_some() {
            self.epoch = self.epoch.wrapping_add(1);
        }
        self.phase = PlaybackPhase::Idle;
        self.pending = None;
    }

    fn schedule(&mut self) {
        self.pending = Some(TickTicket { epoch: self.epoch });
    }

    /// Hand out the ticket for the next frame, if one is scheduled.
    pub fn take_pending(&mut self) -> Option<TickTicket> {
        self.pending.take()
    }

    /// Run one scheduled tick at time `now`.
    pub fn tick(&mut self, ticket: TickTicket, now: Duration) -> TickOutcome {
        if ticket.epoch != self.epoch || !self.is_playing() {
            return TickOutcome::Stale;
        }
        let elapsed = now.saturating_sub(self.last_advance);
        if elapsed < self.frame_duration {
            self.schedule();
            return TickOutcome::Waiting;
        }
        self.current_index = if self.current_index + 1 >= self.snapshot_count {
            0
        } else {
            self.current_index + 1
        };
        self.last_advance = now;
        self.schedule();
        TickOutcome::Advanced(self.current_index)
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(0, PlaybackParams::default().frame_duration())
    }
}

/// Applies queued playback commands in arrival order.
pub fn playback_command_system(
    time: Res<Time>,
    mut scheduler: ResMut<PlaybackScheduler>,
    mut requests: MessageReader<PlaybackCommand>,
) {
    for command in requests.read() {
        let now = time.elapsed();
        if scheduler.apply(*command, now) {
            debug!(
                "[PLAYBACK] {:?} → {:?} @ {}",
                command,
                scheduler.phase(),
                scheduler.current_index()
            );
        }
    }
}

/// Re-entered every display frame: redeems the pending ticket, if any.
pub fn playback_tick_system(time: Res<Time>, mut scheduler: ResMut<PlaybackScheduler>) {
    let Some(ticket) = scheduler.take_pending() else {
        return;
    };
    if let TickOutcome::Advanced(index) = scheduler.tick(ticket, time.elapsed()) {
        debug!("[PLAYBACK] advanced to {}", index);
    }
}
