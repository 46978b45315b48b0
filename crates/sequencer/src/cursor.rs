//! Synchronous stage transitions, shared by manual actions and timer ticks.

use shared::{
    domain::Stage,
    protocol::{SequencerEvent, Transition},
};

/// Current stage plus the auto-play flag. Both change together in a single
/// call, so callers never observe one updated without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCursor {
    stage: Stage,
    auto_play: bool,
}

impl Default for StageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl StageCursor {
    pub fn new() -> Self {
        Self {
            stage: Stage::INITIAL,
            auto_play: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    /// Stays put at `Output`.
    pub fn next(&mut self) -> Vec<SequencerEvent> {
        match self.stage.next() {
            Some(to) => self.move_to(to, Transition::Next).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Stays put at `Input`.
    pub fn previous(&mut self) -> Vec<SequencerEvent> {
        match self.stage.previous() {
            Some(to) => self.move_to(to, Transition::Previous).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn jump_to(&mut self, stage: Stage) -> Vec<SequencerEvent> {
        let mut events: Vec<_> = self.set_auto_play(false).into_iter().collect();
        events.extend(self.move_to(stage, Transition::JumpTo));
        events
    }

    pub fn reset(&mut self) -> Vec<SequencerEvent> {
        let mut events: Vec<_> = self.set_auto_play(false).into_iter().collect();
        events.extend(self.move_to(Stage::INITIAL, Transition::Reset));
        events
    }

    /// Enabling at the terminal stage leaves the flag cleared.
    pub fn set_auto_play(&mut self, enabled: bool) -> Option<SequencerEvent> {
        let enabled = enabled && !self.stage.is_terminal();
        if self.auto_play == enabled {
            return None;
        }
        self.auto_play = enabled;
        Some(SequencerEvent::AutoPlayChanged { enabled })
    }

    pub fn toggle_auto_play(&mut self) -> Option<SequencerEvent> {
        self.set_auto_play(!self.auto_play)
    }

    /// One auto-play step. Landing on (or already sitting at) `Output` clears
    /// the flag in the same step.
    pub fn tick(&mut self) -> Vec<SequencerEvent> {
        if !self.auto_play {
            return Vec::new();
        }
        let mut events = Vec::new();
        if let Some(to) = self.stage.next() {
            events.extend(self.move_to(to, Transition::Tick));
        }
        if self.stage.is_terminal() {
            events.extend(self.set_auto_play(false));
        }
        events
    }

    fn move_to(&mut self, to: Stage, cause: Transition) -> Option<SequencerEvent> {
        let from = self.stage;
        if from == to {
            return None;
        }
        self.stage = to;
        Some(SequencerEvent::StageChanged { from, to, cause })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_forward_and_stops_at_output() {
        let mut cursor = StageCursor::new();
        for expected in &Stage::ALL[1..] {
            assert_eq!(cursor.next().len(), 1);
            assert_eq!(cursor.stage(), *expected);
        }
        assert!(cursor.next().is_empty());
        assert_eq!(cursor.stage(), Stage::Output);
    }

    #[test]
    fn previous_walks_back_and_stops_at_input() {
        let mut cursor = StageCursor::new();
        cursor.jump_to(Stage::Output);
        for _ in 0..5 {
            cursor.previous();
        }
        assert_eq!(cursor.stage(), Stage::Input);
        assert!(cursor.previous().is_empty());
    }

    #[test]
    fn jump_and_reset_clear_auto_play() {
        let mut cursor = StageCursor::new();
        cursor.set_auto_play(true);
        let events = cursor.jump_to(Stage::Shuffle);
        assert!(!cursor.auto_play());
        assert_eq!(
            events,
            vec![
                SequencerEvent::AutoPlayChanged { enabled: false },
                SequencerEvent::StageChanged {
                    from: Stage::Input,
                    to: Stage::Shuffle,
                    cause: Transition::JumpTo,
                },
            ]
        );

        cursor.set_auto_play(true);
        cursor.reset();
        assert_eq!(cursor.stage(), Stage::Input);
        assert!(!cursor.auto_play());
    }

    #[test]
    fn manual_steps_keep_auto_play() {
        let mut cursor = StageCursor::new();
        cursor.set_auto_play(true);
        cursor.next();
        cursor.previous();
        assert!(cursor.auto_play());
    }

    #[test]
    fn enabling_at_output_is_a_no_op() {
        let mut cursor = StageCursor::new();
        cursor.jump_to(Stage::Output);
        assert_eq!(cursor.toggle_auto_play(), None);
        assert!(!cursor.auto_play());
        assert_eq!(cursor.stage(), Stage::Output);
    }

    #[test]
    fn tick_reaching_output_clears_flag_together() {
        let mut cursor = StageCursor::new();
        cursor.jump_to(Stage::Reduce);
        cursor.set_auto_play(true);
        let events = cursor.tick();
        assert_eq!(cursor.stage(), Stage::Output);
        assert!(!cursor.auto_play());
        assert_eq!(events.len(), 2);
        assert!(cursor.tick().is_empty());
    }

    #[test]
    fn tick_at_output_after_manual_next_only_clears_flag() {
        let mut cursor = StageCursor::new();
        cursor.jump_to(Stage::Reduce);
        cursor.set_auto_play(true);
        cursor.next();
        assert!(cursor.auto_play());
        assert_eq!(
            cursor.tick(),
            vec![SequencerEvent::AutoPlayChanged { enabled: false }]
        );
        assert_eq!(cursor.stage(), Stage::Output);
    }

    #[test]
    fn tick_without_auto_play_does_nothing() {
        let mut cursor = StageCursor::new();
        assert!(cursor.tick().is_empty());
        assert_eq!(cursor.stage(), Stage::Input);
    }
}
