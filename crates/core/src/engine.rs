use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channels::selection::{parse_channel_command, ChannelSelection};
use crate::channels::state::{ChannelState, ChannelStateTracker};
use crate::cue::cue::{Cue, CueNumber};
use crate::cue::cue_store::CueStore;
use crate::error::{ConsoleError, Result};
use crate::snapshot::{CueRow, EngineSnapshot};

pub const MAX_CHANNELS: usize = 512;

const DEFAULT_CUE_DESCRIPTION: &str = "Put a short note here";
const DEFAULT_FADE_SECS: f64 = 1.0;

/// Rows shown before the current cue in the display window.
const CUE_WINDOW_LEAD: usize = 3;
/// Rows shown after the first row of the display window.
const CUE_WINDOW_SPAN: usize = 10;

/// Fixed rig configuration. Not changed while the console runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub channel_count: usize,
    pub frame_period: Duration,
}

impl EngineConfig {
    pub fn frame_period_secs(&self) -> f64 {
        self.frame_period.as_secs_f64()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Only seen while a show is being swapped in or the console is torn down.
    NotReady,
    Standby,
    TransitioningForward,
    TransitioningBackward,
}

impl EngineState {
    pub fn is_transitioning(self) -> bool {
        matches!(
            self,
            EngineState::TransitioningForward | EngineState::TransitioningBackward
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EngineState::NotReady => "not ready",
            EngineState::Standby => "in standby",
            EngineState::TransitioningForward => "fading forward",
            EngineState::TransitioningBackward => "fading backward",
        };
        f.write_str(label)
    }
}

/// Display label only; fade direction per channel always comes from the
/// levels being compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Everything the output loop and operator commands share: the cue list,
/// the playhead, channel states and the two frame buffers.
pub struct Engine {
    config: EngineConfig,
    cues: CueStore,
    channels: ChannelStateTracker,
    state: EngineState,
    current_cue_index: usize,
    elapsed_transition_time: f64,
    current_output: Vec<u8>,
    previous_output: Vec<u8>,
}

impl Engine {
    /// Create an engine holding the default single-cue show, in standby.
    pub fn new(config: EngineConfig) -> Self {
        let channel_count = config.channel_count;
        let mut engine = Self {
            config,
            cues: CueStore::new(),
            channels: ChannelStateTracker::new(channel_count),
            state: EngineState::NotReady,
            current_cue_index: 0,
            elapsed_transition_time: 0.0,
            current_output: vec![0; channel_count],
            previous_output: vec![0; channel_count],
        };
        engine.install_cues(CueStore::from_sorted(engine.default_cues()).unwrap_or_default());
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning()
    }

    pub fn cues(&self) -> &CueStore {
        &self.cues
    }

    pub fn current_cue_index(&self) -> usize {
        self.current_cue_index
    }

    pub fn current_cue(&self) -> Option<&Cue> {
        self.cues.get(self.current_cue_index)
    }

    /// Live levels, the only thing transmitted.
    pub fn output(&self) -> &[u8] {
        &self.current_output
    }

    pub fn channel_states(&self) -> &[ChannelState] {
        self.channels.states()
    }

    pub fn elapsed_transition_time(&self) -> f64 {
        self.elapsed_transition_time
    }

    pub fn suggest_next_number(&self) -> Option<CueNumber> {
        self.cues.suggest_next_number(self.current_cue_index)
    }

    /// Fade to the next cue. `Ok(None)` when already on the last cue.
    pub fn go(&mut self) -> Result<Option<usize>> {
        self.require_playback("go")?;
        let target = self.current_cue_index + 1;
        if target >= self.cues.len() {
            log::debug!("Go ignored, already on the last cue");
            return Ok(None);
        }
        self.begin_transition(target, Direction::Forward).map(Some)
    }

    /// Fade to the previous cue. `Ok(None)` when already on the first cue.
    pub fn back(&mut self) -> Result<Option<usize>> {
        self.require_playback("go back")?;
        if self.current_cue_index == 0 {
            log::debug!("Back ignored, already on the first cue");
            return Ok(None);
        }
        self.begin_transition(self.current_cue_index - 1, Direction::Backward)
            .map(Some)
    }

    /// Fade straight to the cue with this number, skipping anything between.
    pub fn go_to(&mut self, number: CueNumber) -> Result<usize> {
        self.require_playback("go to a cue")?;
        let target = self
            .cues
            .lookup_index(number)
            .ok_or(ConsoleError::NotFound(number))?;
        self.begin_transition(target, Direction::Forward)
    }

    fn begin_transition(&mut self, target: usize, direction: Direction) -> Result<usize> {
        let (Some(from), Some(to)) = (self.cues.get(self.current_cue_index), self.cues.get(target))
        else {
            return Err(ConsoleError::InvalidInput(format!(
                "cue index {} is out of range",
                target
            )));
        };
        log::info!("Fading from cue {} to cue {}", from.number, to.number);

        self.channels.reclassify(&from.values, &to.values);
        self.previous_output.copy_from_slice(&self.current_output);
        self.current_cue_index = target;
        self.elapsed_transition_time = 0.0;
        self.state = match direction {
            Direction::Forward => EngineState::TransitioningForward,
            Direction::Backward => EngineState::TransitioningBackward,
        };
        Ok(target)
    }

    /// Move the running fade on by `dt` seconds. Returns true on the tick
    /// that completes the fade.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.state.is_transitioning() {
            return false;
        }
        let Some(target) = self.cues.get(self.current_cue_index) else {
            self.state = EngineState::Standby;
            return false;
        };

        self.elapsed_transition_time += dt;
        let elapsed = self.elapsed_transition_time;

        for (channel, state) in self.channels.states().iter().enumerate() {
            let goal = target.values[channel];
            self.current_output[channel] = match state {
                ChannelState::Rising => {
                    interpolate(self.previous_output[channel], goal, elapsed, target.up_time)
                }
                ChannelState::Falling => {
                    interpolate(self.previous_output[channel], goal, elapsed, target.down_time)
                }
                ChannelState::NoChange => goal,
                ChannelState::Captured => continue,
            };
        }

        // Half a frame of slack so the last tick lands on the target.
        if elapsed < target.fade_time() - self.config.frame_period_secs() / 2.0 {
            return false;
        }

        for (channel, state) in self.channels.states().iter().enumerate() {
            if !state.is_captured() {
                self.current_output[channel] = target.values[channel];
            }
        }
        self.elapsed_transition_time = 0.0;
        self.state = EngineState::Standby;
        log::info!("Fade to cue {} complete", target.number);
        true
    }

    /// Store the live output as a cue. Without a number, the suggested next
    /// number is used. The recorded cue becomes the current cue.
    pub fn record_cue(
        &mut self,
        number: Option<CueNumber>,
        up_time: f64,
        down_time: f64,
        description: impl Into<String>,
    ) -> Result<(usize, CueNumber)> {
        self.require_standby("record a cue")?;
        let number = number
            .or_else(|| self.suggest_next_number())
            .unwrap_or(CueNumber::ZERO);

        let cue = Cue::new(
            number,
            self.current_output.clone(),
            up_time,
            down_time,
            description,
            self.config.frame_period_secs(),
        );
        let index = self.cues.insert_or_overwrite(cue);
        self.channels.clear();
        self.current_cue_index = index;
        log::info!("Recorded cue {} at position {}", number, index);
        Ok((index, number))
    }

    /// Return every captured channel to the current cue's level.
    pub fn release_all(&mut self) -> Result<Vec<usize>> {
        self.require_standby("release channels")?;
        let Some(cue) = self.cues.get(self.current_cue_index) else {
            return Ok(Vec::new());
        };
        let released = self.channels.release_all(&cue.values, &mut self.current_output);
        log::debug!("Released {} captured channels", released.len());
        Ok(released)
    }

    /// Capture the channels named by `spec` (the part before `*`) at `level`.
    pub fn set_channels(&mut self, spec: &str, level: u8) -> Result<ChannelSelection> {
        self.require_standby("set channels")?;
        let selection = ChannelSelection::parse(spec, self.config.channel_count)?;
        self.channels.capture(&selection, level, &mut self.current_output);
        Ok(selection)
    }

    /// Capture from a full `<channels>*<level>` entry.
    pub fn apply_channel_command(&mut self, input: &str) -> Result<(ChannelSelection, u8)> {
        self.require_standby("set channels")?;
        let (selection, level) = parse_channel_command(input, self.config.channel_count)?;
        self.channels.capture(&selection, level, &mut self.current_output);
        Ok((selection, level))
    }

    /// Delete a cue. The last remaining cue cannot be deleted. Returns the
    /// index the cue occupied.
    pub fn delete_cue(&mut self, number: CueNumber) -> Result<usize> {
        self.require_standby("delete a cue")?;
        if self.cues.lookup_index(number).is_none() {
            return Err(ConsoleError::NotFound(number));
        }
        if self.cues.len() == 1 {
            return Err(ConsoleError::InvalidInput(
                "a show needs at least one cue".to_string(),
            ));
        }
        let removed = self
            .cues
            .remove(number)
            .ok_or(ConsoleError::NotFound(number))?;
        if removed <= self.current_cue_index {
            self.current_cue_index = self.current_cue_index.saturating_sub(1);
        }
        log::info!("Deleted cue {}", number);
        Ok(removed)
    }

    /// Replace the cue list and snap straight to its first cue.
    ///
    /// Validation happens before anything changes, so a rejected show leaves
    /// the current one running.
    pub fn load_cues(&mut self, cues: Vec<Cue>) -> Result<()> {
        if self.state.is_transitioning() {
            return Err(ConsoleError::InvalidState {
                operation: "load a show",
                state: self.state,
            });
        }
        if cues.is_empty() {
            return Err(ConsoleError::InvalidInput("show contains no cues".to_string()));
        }
        let channel_count = self.config.channel_count;
        if let Some(cue) = cues.iter().find(|cue| cue.values.len() != channel_count) {
            return Err(ConsoleError::InvalidInput(format!(
                "cue {} has {} channels, rig has {}",
                cue.number,
                cue.values.len(),
                channel_count
            )));
        }

        let min_fade = self.config.frame_period_secs();
        let cues = cues
            .into_iter()
            .map(|cue| {
                Cue::new(
                    cue.number,
                    cue.values,
                    cue.up_time,
                    cue.down_time,
                    cue.description,
                    min_fade,
                )
            })
            .collect();
        let store = CueStore::from_sorted(cues).map_err(ConsoleError::InvalidInput)?;

        self.install_cues(store);
        Ok(())
    }

    /// Start over with the default single-cue show.
    pub fn new_show(&mut self) -> Result<()> {
        let cues = self.default_cues();
        self.load_cues(cues)
    }

    /// Mark the engine as not ready; used while the console shuts down.
    pub fn teardown(&mut self) {
        self.state = EngineState::NotReady;
        self.elapsed_transition_time = 0.0;
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let progress = match self.current_cue() {
            Some(cue) if self.state.is_transitioning() => {
                (self.elapsed_transition_time / cue.fade_time()).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        };

        EngineSnapshot {
            state: self.state,
            output: self.current_output.clone(),
            channel_states: self.channels.states().to_vec(),
            current_cue_index: self.current_cue_index,
            current_cue: self.current_cue().map(|cue| cue.number),
            transition_progress: progress,
            cue_window: self.cue_window(),
            suggested_next_number: self.suggest_next_number(),
        }
    }

    fn cue_window(&self) -> Vec<CueRow> {
        let Some(last) = self.cues.len().checked_sub(1) else {
            return Vec::new();
        };
        let first = self.current_cue_index.saturating_sub(CUE_WINDOW_LEAD);
        let end = (first + CUE_WINDOW_SPAN).min(last);
        self.cues.cues()[first.min(end)..=end]
            .iter()
            .enumerate()
            .map(|(offset, cue)| CueRow {
                number: cue.number,
                up_time: cue.up_time,
                down_time: cue.down_time,
                description: cue.description.clone(),
                is_current: first + offset == self.current_cue_index,
            })
            .collect()
    }

    fn install_cues(&mut self, cues: CueStore) {
        self.state = EngineState::NotReady;
        self.cues = cues;
        self.channels.clear();
        self.current_cue_index = 0;
        self.elapsed_transition_time = 0.0;
        match self.cues.get(0) {
            Some(first) => self.current_output.copy_from_slice(&first.values),
            None => self.current_output.fill(0),
        }
        self.previous_output.copy_from_slice(&self.current_output);
        self.state = EngineState::Standby;
    }

    fn default_cues(&self) -> Vec<Cue> {
        vec![Cue::new(
            CueNumber::ZERO,
            vec![0; self.config.channel_count],
            DEFAULT_FADE_SECS,
            DEFAULT_FADE_SECS,
            DEFAULT_CUE_DESCRIPTION,
            self.config.frame_period_secs(),
        )]
    }

    fn require_playback(&self, operation: &'static str) -> Result<()> {
        if self.state == EngineState::NotReady {
            log::warn!("Refusing to {} while {}", operation, self.state);
            return Err(ConsoleError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn require_standby(&self, operation: &'static str) -> Result<()> {
        if self.state != EngineState::Standby {
            log::warn!("Refusing to {} while {}", operation, self.state);
            return Err(ConsoleError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}

fn interpolate(from: u8, to: u8, elapsed: f64, duration: f64) -> u8 {
    let fraction = if duration > 0.0 {
        (elapsed / duration).min(1.0)
    } else {
        1.0
    };
    let level = from as f64 * (1.0 - fraction) + to as f64 * fraction;
    level.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 0.05;

    fn config(channel_count: usize) -> EngineConfig {
        EngineConfig {
            channel_count,
            frame_period: Duration::from_millis(50),
        }
    }

    fn cue(tenths: u16, values: Vec<u8>, up: f64, down: f64) -> Cue {
        Cue::new(CueNumber::from_tenths(tenths), values, up, down, "", FRAME)
    }

    /// cue 0 = [0,0,0,0]; cue 1 = [255,0,128,0] up 2.0 down 1.0; cue 2 = [0,50,128,0]
    fn engine() -> Engine {
        let mut engine = Engine::new(config(4));
        engine
            .load_cues(vec![
                cue(0, vec![0, 0, 0, 0], 1.0, 1.0),
                cue(10, vec![255, 0, 128, 0], 2.0, 1.0),
                cue(20, vec![0, 50, 128, 0], 1.0, 0.5),
            ])
            .unwrap();
        engine
    }

    fn run_to_standby(engine: &mut Engine) -> usize {
        let mut ticks = 0;
        while engine.is_transitioning() {
            engine.advance(FRAME);
            ticks += 1;
            assert!(ticks < 10_000, "fade never completed");
        }
        ticks
    }

    #[test]
    fn test_new_engine_holds_default_show() {
        let engine = Engine::new(config(8));
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.cues().len(), 1);
        assert_eq!(engine.output(), &[0; 8]);
        assert_eq!(engine.current_cue().unwrap().description, "Put a short note here");
    }

    #[test]
    fn test_go_classifies_and_fades() {
        let mut engine = engine();
        assert_eq!(engine.go().unwrap(), Some(1));
        assert_eq!(engine.state(), EngineState::TransitioningForward);
        assert_eq!(
            engine.channel_states(),
            &[
                ChannelState::Rising,
                ChannelState::NoChange,
                ChannelState::Rising,
                ChannelState::NoChange
            ]
        );

        // Half of the two second up time.
        assert!(!engine.advance(1.0));
        assert_eq!(engine.output(), &[128, 0, 64, 0]);

        assert!(engine.advance(1.0));
        assert_eq!(engine.output(), &[255, 0, 128, 0]);
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.elapsed_transition_time(), 0.0);
    }

    #[test]
    fn test_frame_by_frame_fade_lands_exactly() {
        let mut engine = engine();
        engine.go().unwrap();
        for _ in 0..20 {
            engine.advance(FRAME);
        }
        let output = engine.output().to_vec();
        assert!((127..=128).contains(&output[0]), "{:?}", output);
        assert!((63..=64).contains(&output[2]), "{:?}", output);

        // 2.0s up time at 50ms frames: 40 ticks in total.
        assert_eq!(run_to_standby(&mut engine), 20);
        assert_eq!(engine.output(), &[255, 0, 128, 0]);
    }

    #[test]
    fn test_falling_channels_use_down_time() {
        let mut engine = engine();
        engine.go().unwrap();
        run_to_standby(&mut engine);

        engine.go().unwrap();
        assert_eq!(engine.channel_states()[0], ChannelState::Falling);
        assert_eq!(engine.channel_states()[1], ChannelState::Rising);
        // Down time 0.5s: channel 0 is halfway after 0.25s, channel 1 a quarter up.
        engine.advance(0.25);
        assert_eq!(engine.output()[0], 128);
        assert_eq!(engine.output()[1], 13);
        run_to_standby(&mut engine);
        assert_eq!(engine.output(), &[0, 50, 128, 0]);
    }

    #[test]
    fn test_go_on_last_and_back_on_first_are_noops() {
        let mut engine = engine();
        assert_eq!(engine.back().unwrap(), None);
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.current_cue_index(), 0);

        engine.go_to(CueNumber::from_tenths(20)).unwrap();
        run_to_standby(&mut engine);
        let before = engine.output().to_vec();
        assert_eq!(engine.go().unwrap(), None);
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.current_cue_index(), 2);
        assert_eq!(engine.output(), before.as_slice());
    }

    #[test]
    fn test_back_fades_backward() {
        let mut engine = engine();
        engine.go().unwrap();
        run_to_standby(&mut engine);
        assert_eq!(engine.back().unwrap(), Some(0));
        assert_eq!(engine.state(), EngineState::TransitioningBackward);
        assert_eq!(engine.channel_states()[0], ChannelState::Falling);
        run_to_standby(&mut engine);
        assert_eq!(engine.output(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_goto_jumps_directly() {
        let mut engine = engine();
        assert_eq!(engine.go_to(CueNumber::from_tenths(20)).unwrap(), 2);
        // Compared against cue 0, not cue 1.
        assert_eq!(engine.channel_states()[0], ChannelState::NoChange);
        run_to_standby(&mut engine);
        assert_eq!(engine.output(), &[0, 50, 128, 0]);
    }

    #[test]
    fn test_goto_missing_cue_changes_nothing() {
        let mut engine = engine();
        let err = engine.go_to(CueNumber::from_tenths(15)).unwrap_err();
        assert!(matches!(err, ConsoleError::NotFound(_)));
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.current_cue_index(), 0);
    }

    #[test]
    fn test_go_mid_fade_restarts_from_live_output() {
        let mut engine = engine();
        engine.go().unwrap();
        engine.advance(1.0);
        assert_eq!(engine.output()[0], 128);

        engine.go().unwrap();
        assert_eq!(engine.current_cue_index(), 2);
        assert_eq!(engine.elapsed_transition_time(), 0.0);
        // Cue 1 -> cue 2 is falling on channel 0, starting from the live 128.
        engine.advance(0.25);
        assert_eq!(engine.output()[0], 64);
    }

    #[test]
    fn test_captured_channels_ignore_transitions() {
        let mut engine = engine();
        engine.set_channels("2", 200).unwrap();
        engine.go().unwrap();
        engine.advance(0.5);
        assert_eq!(engine.output()[1], 200);
        run_to_standby(&mut engine);
        assert_eq!(engine.output(), &[255, 200, 128, 0]);
        assert_eq!(engine.channel_states()[1], ChannelState::Captured);

        engine.go().unwrap();
        run_to_standby(&mut engine);
        assert_eq!(engine.output()[1], 200);
    }

    #[test]
    fn test_release_all_restores_current_cue() {
        let mut engine = engine();
        engine.go().unwrap();
        run_to_standby(&mut engine);
        engine.apply_channel_command("1+4*9").unwrap();
        assert_eq!(engine.output(), &[9, 0, 128, 9]);

        assert_eq!(engine.release_all().unwrap(), vec![0, 3]);
        assert_eq!(engine.output(), &[255, 0, 128, 0]);
        assert!(engine.channel_states().iter().all(|s| !s.is_captured()));
    }

    #[test]
    fn test_record_captures_live_output() {
        let mut engine = engine();
        engine.set_channels("1-3", 77).unwrap();
        let (index, number) = engine
            .record_cue(Some(CueNumber::from_tenths(5)), 3.0, 4.0, "warm")
            .unwrap();

        assert_eq!((index, number.tenths()), (1, 5));
        assert_eq!(engine.current_cue_index(), 1);
        let recorded = engine.cues().get(1).unwrap();
        assert_eq!(recorded.values, vec![77, 77, 77, 0]);
        assert_eq!(recorded.description, "warm");
        assert!(engine
            .channel_states()
            .iter()
            .all(|state| *state == ChannelState::NoChange));
    }

    #[test]
    fn test_record_without_number_uses_suggestion() {
        let mut engine = engine();
        let (_, number) = engine.record_cue(None, 1.0, 1.0, "").unwrap();
        // Between 0.0 and 1.0: the midpoint.
        assert_eq!(number.tenths(), 5);
    }

    #[test]
    fn test_standby_only_commands_refused_mid_fade() {
        let mut engine = engine();
        engine.go().unwrap();
        let output = engine.output().to_vec();

        assert!(matches!(
            engine.record_cue(None, 1.0, 1.0, ""),
            Err(ConsoleError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.set_channels("1", 10),
            Err(ConsoleError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.release_all(),
            Err(ConsoleError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.load_cues(vec![cue(0, vec![0; 4], 1.0, 1.0)]),
            Err(ConsoleError::InvalidState { .. })
        ));
        assert_eq!(engine.cues().len(), 3);
        assert_eq!(engine.output(), output.as_slice());
    }

    #[test]
    fn test_malformed_channel_entry_changes_nothing() {
        let mut engine = engine();
        assert!(matches!(
            engine.apply_channel_command("1-3"),
            Err(ConsoleError::InvalidInput(_))
        ));
        assert!(engine.set_channels("x", 10).is_err());
        assert_eq!(engine.output(), &[0, 0, 0, 0]);
        assert_eq!(engine.channel_states(), &[ChannelState::NoChange; 4]);
    }

    #[test]
    fn test_load_rejects_bad_shows_atomically() {
        let mut engine = engine();
        engine.go().unwrap();
        run_to_standby(&mut engine);

        assert!(engine.load_cues(Vec::new()).is_err());
        assert!(engine.load_cues(vec![cue(0, vec![0; 3], 1.0, 1.0)]).is_err());
        assert!(engine
            .load_cues(vec![
                cue(10, vec![0; 4], 1.0, 1.0),
                cue(0, vec![0; 4], 1.0, 1.0)
            ])
            .is_err());
        assert_eq!(engine.cues().len(), 3);
        assert_eq!(engine.current_cue_index(), 1);
        assert_eq!(engine.output(), &[255, 0, 128, 0]);
    }

    #[test]
    fn test_load_snaps_to_first_cue() {
        let mut engine = engine();
        engine.set_channels("/", 10).unwrap();
        engine
            .load_cues(vec![cue(30, vec![1, 2, 3, 4], 0.0, 1.0)])
            .unwrap();
        assert_eq!(engine.state(), EngineState::Standby);
        assert_eq!(engine.output(), &[1, 2, 3, 4]);
        assert_eq!(engine.channel_states(), &[ChannelState::NoChange; 4]);
        // Zero fade times from a file are raised to one frame.
        assert_eq!(engine.current_cue().unwrap().up_time, FRAME);
    }

    #[test]
    fn test_delete_cue_keeps_playhead() {
        let mut engine = engine();
        engine.go_to(CueNumber::from_tenths(20)).unwrap();
        run_to_standby(&mut engine);

        assert_eq!(engine.delete_cue(CueNumber::from_tenths(10)).unwrap(), 1);
        assert_eq!(engine.current_cue().unwrap().number.tenths(), 20);

        assert_eq!(engine.delete_cue(CueNumber::from_tenths(20)).unwrap(), 1);
        assert_eq!(engine.current_cue_index(), 0);

        assert!(matches!(
            engine.delete_cue(CueNumber::from_tenths(20)),
            Err(ConsoleError::NotFound(_))
        ));
        assert!(matches!(
            engine.delete_cue(CueNumber::ZERO),
            Err(ConsoleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_not_ready_refuses_playback() {
        let mut engine = engine();
        engine.teardown();
        assert!(matches!(
            engine.go(),
            Err(ConsoleError::InvalidState { .. })
        ));
        assert!(!engine.advance(FRAME));
    }

    #[test]
    fn test_snapshot_window() {
        let mut engine = Engine::new(config(2));
        let cues = (0..20).map(|n| cue(n * 10, vec![0, 0], 1.0, 1.0)).collect();
        engine.load_cues(cues).unwrap();
        engine.go_to(CueNumber::from_tenths(50)).unwrap();
        engine.advance(0.5);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.cue_window.len(), 11);
        assert_eq!(snapshot.cue_window[0].number.tenths(), 20);
        assert!(snapshot.cue_window[3].is_current);
        assert_eq!(snapshot.current_cue.map(|n| n.tenths()), Some(50));
        assert!((snapshot.transition_progress - 0.5).abs() < 1e-6);
    }
}
