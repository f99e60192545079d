// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Non-blocking audible cues.
//!
//! A [`BuzzerTask`] walks a fixed melody one note at a time from the cooperative loop:
//!
//! | State     | On tick                                                           |
//! |-----------|-------------------------------------------------------------------|
//! | `Idle`    | nothing                                                           |
//! | `Playing` | once the current note's duration has elapsed, emit it and advance |
//! | `Waiting` | after the hold interval, go `Idle`                                |
//!
//! The autonomy sequencer uses [`CuePlayer::is_idle`] as a transition guard, so a cue also works
//! as a timer. Only one cue is current at a time; starting another preempts it.

use crate::config::{CUE_HOLD_MS, NOTE_UNIT_MS, TONE_LENGTH_MS};

/// Output for square-wave tones.
pub trait ToneSink {
    /// Sound `freq_hz` for `duration_ms`, replacing any tone still playing.
    fn tone(&mut self, freq_hz: u16, duration_ms: u32);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub freq_hz: u16,
    /// Gap before this note is emitted, in units of [`NOTE_UNIT_MS`].
    pub beats: u8,
}

impl Note {
    pub const fn new(freq_hz: u16, beats: u8) -> Self {
        Self { freq_hz, beats }
    }

    #[inline]
    pub fn duration_ms(&self) -> u32 {
        self.beats as u32 * NOTE_UNIT_MS
    }
}

/// Rising arpeggio played when the robot stops at a marker.
pub static STATUS_MELODY: [Note; 8] = [
    Note::new(523, 1),
    Note::new(659, 1),
    Note::new(784, 1),
    Note::new(1047, 1),
    Note::new(784, 1),
    Note::new(659, 1),
    Note::new(784, 1),
    Note::new(1047, 2),
];

/// Two-tone warble played while an obstacle blocks the path.
pub static ALARM_MELODY: [Note; 8] = [
    Note::new(1760, 1),
    Note::new(1318, 1),
    Note::new(1760, 1),
    Note::new(1318, 1),
    Note::new(1760, 1),
    Note::new(1318, 1),
    Note::new(1760, 1),
    Note::new(1318, 1),
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Playing,
    Waiting,
}

pub struct BuzzerTask {
    melody: &'static [Note],
    cursor: usize,
    state: TaskState,
    last_update: u32,
    hold_ms: u32,
}

impl BuzzerTask {
    pub const fn new(melody: &'static [Note]) -> Self {
        Self {
            melody,
            cursor: 0,
            state: TaskState::Idle,
            last_update: 0,
            hold_ms: CUE_HOLD_MS,
        }
    }

    pub fn with_hold(mut self, hold_ms: u32) -> Self {
        self.hold_ms = hold_ms;
        self
    }

    /// Restart from the first note.
    pub fn start(&mut self, now: u32) {
        self.cursor = 0;
        self.state = TaskState::Playing;
        self.last_update = now;
    }

    pub fn update<T: ToneSink>(&mut self, now: u32, sink: &mut T) {
        if self.state == TaskState::Playing {
            match self.melody.get(self.cursor) {
                Some(note) => {
                    if now.wrapping_sub(self.last_update) >= note.duration_ms() {
                        sink.tone(note.freq_hz, TONE_LENGTH_MS);
                        self.last_update = now;
                        self.cursor += 1;
                        if self.cursor >= self.melody.len() {
                            self.state = TaskState::Waiting;
                        }
                    }
                }
                None => {
                    self.state = TaskState::Waiting;
                    self.last_update = now;
                }
            }
        }

        if self.state == TaskState::Waiting && now.wrapping_sub(self.last_update) >= self.hold_ms {
            self.state = TaskState::Idle;
        }
    }

    /// Silence without waiting out the hold.
    #[inline]
    pub fn cancel(&mut self) {
        self.state = TaskState::Idle;
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == TaskState::Idle
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cue {
    Status,
    Alarm,
}

/// Owns every cue and tracks which one, if any, is current.
pub struct CuePlayer {
    status: BuzzerTask,
    alarm: BuzzerTask,
    current: Option<Cue>,
}

impl CuePlayer {
    pub fn new() -> Self {
        Self {
            status: BuzzerTask::new(&STATUS_MELODY),
            alarm: BuzzerTask::new(&ALARM_MELODY),
            current: None,
        }
    }

    fn task_mut(&mut self, cue: Cue) -> &mut BuzzerTask {
        match cue {
            Cue::Status => &mut self.status,
            Cue::Alarm => &mut self.alarm,
        }
    }

    fn task(&self, cue: Cue) -> &BuzzerTask {
        match cue {
            Cue::Status => &self.status,
            Cue::Alarm => &self.alarm,
        }
    }

    /// Make `cue` current and start it from the top. Any other current cue is cancelled.
    pub fn start(&mut self, cue: Cue, now: u32) {
        if let Some(prev) = self.current.replace(cue) {
            if prev != cue {
                self.task_mut(prev).cancel();
            }
        }
        self.task_mut(cue).start(now);
    }

    /// Advance the current cue, if any.
    pub fn update<T: ToneSink>(&mut self, now: u32, sink: &mut T) {
        if let Some(cue) = self.current {
            self.task_mut(cue).update(now, sink);
        }
    }

    /// True if no cue is current or the current one has finished its hold.
    pub fn is_idle(&self) -> bool {
        self.current.map_or(true, |cue| self.task(cue).is_idle())
    }

    /// Forget the current cue once it is idle.
    pub fn release(&mut self) {
        if self.is_idle() {
            self.current = None;
        }
    }

    /// Cancel and forget the current cue.
    pub fn stop(&mut self) {
        if let Some(cue) = self.current.take() {
            self.task_mut(cue).cancel();
        }
    }

    #[inline]
    pub fn current(&self) -> Option<Cue> {
        self.current
    }

    pub fn state_of(&self, cue: Cue) -> TaskState {
        self.task(cue).state()
    }
}

impl Default for CuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        tones: Vec<(u16, u32)>,
    }

    impl ToneSink for Recorder {
        fn tone(&mut self, freq_hz: u16, duration_ms: u32) {
            self.tones.push((freq_hz, duration_ms));
        }
    }

    static EVEN: [Note; 8] = [Note::new(440, 1); 8];

    #[test]
    fn eight_notes_then_hold_then_idle() {
        let d = NOTE_UNIT_MS;
        let t0 = 1_000;
        let mut task = BuzzerTask::new(&EVEN);
        let mut sink = Recorder::default();
        task.start(t0);

        let mut waiting_at = None;
        let mut idle_at = None;
        for now in t0..t0 + 8 * d + CUE_HOLD_MS + 10 {
            task.update(now, &mut sink);
            if waiting_at.is_none() && task.state() == TaskState::Waiting {
                waiting_at = Some(now);
            }
            if idle_at.is_none() && task.state() == TaskState::Idle {
                idle_at = Some(now);
            }
        }

        assert_eq!(sink.tones.len(), 8);
        assert_eq!(waiting_at, Some(t0 + 8 * d));
        assert_eq!(idle_at, Some(t0 + 8 * d + CUE_HOLD_MS));
    }

    #[test]
    fn idle_task_ignores_ticks() {
        let mut task = BuzzerTask::new(&EVEN);
        let mut sink = Recorder::default();
        for now in 0..5_000 {
            task.update(now, &mut sink);
        }
        assert!(sink.tones.is_empty());
        assert!(task.is_idle());
    }

    #[test]
    fn restart_rewinds_cursor() {
        let mut task = BuzzerTask::new(&EVEN).with_hold(0);
        let mut sink = Recorder::default();
        task.start(0);
        task.update(NOTE_UNIT_MS, &mut sink);
        task.update(2 * NOTE_UNIT_MS, &mut sink);
        assert_eq!(sink.tones.len(), 2);

        task.start(10_000);
        for i in 1..=8 {
            task.update(10_000 + i * NOTE_UNIT_MS, &mut sink);
        }
        assert_eq!(sink.tones.len(), 10);
        assert!(task.is_idle());
    }

    #[test]
    fn starting_a_cue_preempts_the_current_one() {
        let mut player = CuePlayer::new();
        let mut sink = Recorder::default();
        assert!(player.is_idle());

        player.start(Cue::Status, 0);
        player.update(NOTE_UNIT_MS, &mut sink);
        assert!(!player.is_idle());

        player.start(Cue::Alarm, 200);
        assert_eq!(player.current(), Some(Cue::Alarm));
        assert_eq!(player.state_of(Cue::Status), TaskState::Idle);
        assert_eq!(player.state_of(Cue::Alarm), TaskState::Playing);

        player.stop();
        assert!(player.is_idle());
        assert_eq!(player.current(), None);
    }

    #[test]
    fn release_only_after_idle() {
        let mut player = CuePlayer::new();
        let mut sink = Recorder::default();
        player.start(Cue::Status, 0);
        player.release();
        assert_eq!(player.current(), Some(Cue::Status));

        let end = STATUS_MELODY.iter().map(Note::duration_ms).sum::<u32>() + CUE_HOLD_MS;
        for now in 0..=end {
            player.update(now, &mut sink);
        }
        assert!(player.is_idle());
        player.release();
        assert_eq!(player.current(), None);
    }
}
