use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::channels::selection::ChannelSelection;
use crate::config::Settings;
use crate::cue::cue::CueNumber;
use crate::engine::{Engine, EngineConfig, EngineState};
use crate::error::{ConsoleError, Result};
use crate::messages::{ConsoleCommand, ConsoleEvent};
use crate::output::{FrameSink, LoopStats, OutputHandle, SharedEngine};
use crate::show::show::{Show, SHOW_FORMAT_VERSION};
use crate::show::show_manager::ShowManager;
use crate::snapshot::EngineSnapshot;

const UNTITLED_SHOW: &str = "Untitled Show";

/// The operator-facing console: owns the shared engine, the show files and
/// the running output loop.
///
/// Every command takes the engine lock for its whole body, so commands are
/// serialized against each other and against the output loop.
pub struct LightingConsole {
    show_name: String,
    show_created_at: DateTime<Utc>,
    settings: Settings,
    config: EngineConfig,
    engine: SharedEngine,
    show_manager: ShowManager,
    output: Option<OutputHandle>,
}

impl LightingConsole {
    pub fn new(settings: Settings) -> Result<Self> {
        let config = settings
            .engine_config()
            .map_err(|e| ConsoleError::InvalidInput(e.to_string()))?;
        let show_manager = ShowManager::new(settings.show_directory.clone());

        log::info!(
            "Console ready: {} channels, frame period {:?}",
            config.channel_count,
            config.frame_period
        );

        Ok(Self {
            show_name: UNTITLED_SHOW.to_string(),
            show_created_at: Utc::now(),
            settings,
            config,
            engine: Arc::new(Mutex::new(Engine::new(config))),
            show_manager,
            output: None,
        })
    }

    /// Start transmitting frames to `sink`. Must be called from within a
    /// tokio runtime.
    pub fn start(&mut self, sink: Box<dyn FrameSink>) -> Result<()> {
        if self.is_running() {
            return Err(ConsoleError::InvalidInput(
                "output is already running".to_string(),
            ));
        }
        self.output = Some(OutputHandle::spawn(
            Arc::clone(&self.engine),
            sink,
            self.config.frame_period,
        ));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.output
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Shared engine handle, for displays that poll on their own schedule.
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn show_name(&self) -> &str {
        &self.show_name
    }

    pub fn show_path(&self) -> Option<&Path> {
        self.show_manager.current_path()
    }

    /// Fade to the next cue. `Ok(None)` when already on the last cue.
    pub fn go(&self) -> Result<Option<(usize, CueNumber)>> {
        let mut engine = self.engine.lock();
        let index = engine.go()?;
        Ok(index.and_then(|index| engine.cues().get(index).map(|cue| (index, cue.number))))
    }

    /// Fade to the previous cue. `Ok(None)` when already on the first cue.
    pub fn back(&self) -> Result<Option<(usize, CueNumber)>> {
        let mut engine = self.engine.lock();
        let index = engine.back()?;
        Ok(index.and_then(|index| engine.cues().get(index).map(|cue| (index, cue.number))))
    }

    pub fn goto(&self, number: CueNumber) -> Result<usize> {
        self.engine.lock().go_to(number)
    }

    /// Record the live output. Missing fade times use the configured
    /// defaults.
    pub fn record_cue(
        &self,
        number: Option<CueNumber>,
        up_time: Option<f64>,
        down_time: Option<f64>,
        description: &str,
    ) -> Result<(usize, CueNumber)> {
        let up_time = up_time.unwrap_or(self.settings.default_up_time);
        let down_time = down_time.unwrap_or(self.settings.default_down_time);
        self.engine
            .lock()
            .record_cue(number, up_time, down_time, description)
    }

    pub fn set_channels(&self, spec: &str, level: u8) -> Result<ChannelSelection> {
        self.engine.lock().set_channels(spec, level)
    }

    /// Apply a typed `<channels>*<level>` entry.
    pub fn apply_channel_command(&self, input: &str) -> Result<(ChannelSelection, u8)> {
        self.engine.lock().apply_channel_command(input)
    }

    pub fn release_all(&self) -> Result<Vec<usize>> {
        self.engine.lock().release_all()
    }

    pub fn delete_cue(&self, number: CueNumber) -> Result<usize> {
        self.engine.lock().delete_cue(number)
    }

    /// Replace the running show with the default one.
    pub fn new_show(&mut self, name: &str) -> Result<()> {
        self.engine.lock().new_show()?;
        self.show_name = if name.trim().is_empty() {
            UNTITLED_SHOW.to_string()
        } else {
            name.trim().to_string()
        };
        self.show_created_at = Utc::now();
        self.show_manager.clear_current();
        log::info!("Started new show '{}'", self.show_name);
        Ok(())
    }

    /// Install a show. Nothing changes unless the whole show is accepted.
    pub fn load_show_data(&mut self, show: Show) -> Result<()> {
        if show.format_version != SHOW_FORMAT_VERSION {
            return Err(ConsoleError::Persistence(format!(
                "show format version {} is not supported",
                show.format_version
            )));
        }
        if show.channel_count != self.config.channel_count {
            return Err(ConsoleError::Persistence(format!(
                "show '{}' is for {} channels, rig has {}",
                show.name, show.channel_count, self.config.channel_count
            )));
        }

        let name = show.name.clone();
        let created_at = show.created_at;
        {
            let mut engine = self.engine.lock();
            if engine.state() != EngineState::Standby {
                return Err(ConsoleError::InvalidState {
                    operation: "load a show",
                    state: engine.state(),
                });
            }
            engine.load_cues(show.into_cues())?;
        }

        self.show_name = name;
        self.show_created_at = created_at;
        Ok(())
    }

    /// The running show as a saveable record.
    pub fn save_show_data(&self) -> Show {
        let engine = self.engine.lock();
        let mut show = Show::new(
            self.show_name.clone(),
            self.config.channel_count,
            engine.cues().cues(),
        );
        show.created_at = self.show_created_at;
        show
    }

    pub fn load_show(&mut self, path: &Path) -> Result<()> {
        let show = self
            .show_manager
            .load_show(path)
            .map_err(persistence_error)?;
        self.load_show_data(show)?;
        self.show_manager.set_current_path(path);

        log::info!("Loaded show '{}' from {}", self.show_name, path.display());
        Ok(())
    }

    /// Save to `path`, or wherever the show was last loaded from or saved to.
    pub fn save_show(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let show = self.save_show_data();
        self.show_manager
            .save_show(&show, path)
            .map_err(persistence_error)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.engine.lock().snapshot()
    }

    /// Stop the output loop, close the transport and mark the engine not
    /// ready. Safe to call when the loop never started.
    pub async fn shutdown(&mut self) -> Result<LoopStats> {
        log::info!("Shutting down lighting console...");
        let result = match self.output.take() {
            Some(handle) => handle.shutdown().await,
            None => Ok(LoopStats::default()),
        };
        self.engine.lock().teardown();
        log::info!("Lighting console shutdown complete");
        result
    }

    pub async fn process_command(&mut self, command: ConsoleCommand) -> Result<ConsoleEvent> {
        use ConsoleCommand::*;

        log::debug!("Processing command: {:?}", command);

        let event = match command {
            Go => match self.go()? {
                Some((cue_index, number)) => ConsoleEvent::TransitionStarted { cue_index, number },
                None => ConsoleEvent::NoChange,
            },
            Back => match self.back()? {
                Some((cue_index, number)) => ConsoleEvent::TransitionStarted { cue_index, number },
                None => ConsoleEvent::NoChange,
            },
            GoTo { number } => {
                let cue_index = self.goto(number)?;
                ConsoleEvent::TransitionStarted { cue_index, number }
            }
            RecordCue {
                number,
                up_time,
                down_time,
                description,
            } => {
                let (index, number) = self.record_cue(number, up_time, down_time, &description)?;
                ConsoleEvent::CueRecorded { index, number }
            }
            SetChannels { input } => {
                let (selection, level) = self.apply_channel_command(&input)?;
                ConsoleEvent::ChannelsCaptured {
                    channels: selection.indices().collect(),
                    level,
                }
            }
            ReleaseAll => ConsoleEvent::ChannelsReleased {
                channels: self.release_all()?,
            },
            DeleteCue { number } => {
                let index = self.delete_cue(number)?;
                ConsoleEvent::CueDeleted { index, number }
            }
            NewShow { name } => {
                self.new_show(&name)?;
                ConsoleEvent::ShowCreated {
                    name: self.show_name.clone(),
                }
            }
            LoadShow { path } => {
                if let Err(e) = self.load_show(&path) {
                    log::error!("Failed to load show {}: {}", path.display(), e);
                    return Err(e);
                }
                ConsoleEvent::ShowLoaded {
                    name: self.show_name.clone(),
                    cue_count: self.engine.lock().cues().len(),
                }
            }
            SaveShow { path } => match self.save_show(path.as_deref()) {
                Ok(path) => ConsoleEvent::ShowSaved { path },
                Err(e) => {
                    log::error!("Failed to save show: {}", e);
                    return Err(e);
                }
            },
            Snapshot => ConsoleEvent::Snapshot {
                snapshot: self.snapshot(),
            },
            Shutdown => ConsoleEvent::ShutdownComplete {
                stats: self.shutdown().await?,
            },
        };
        Ok(event)
    }
}

fn persistence_error(err: anyhow::Error) -> ConsoleError {
    ConsoleError::Persistence(format!("{:#}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::state::ChannelState;

    fn settings(channel_count: usize) -> Settings {
        Settings {
            channel_count,
            ..Settings::default()
        }
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(matches!(
            LightingConsole::new(settings(0)),
            Err(ConsoleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_record_uses_default_fades() {
        let mut defaults = settings(4);
        defaults.default_up_time = 3.0;
        defaults.default_down_time = 4.5;
        let console = LightingConsole::new(defaults).unwrap();

        console.set_channels("1", 255).unwrap();
        let (index, number) = console.record_cue(None, None, Some(2.0), "").unwrap();
        assert_eq!((index, number), (1, CueNumber::from_tenths(10)));

        let engine = console.engine();
        let engine = engine.lock();
        let cue = engine.cues().get(1).unwrap();
        assert_eq!(cue.up_time, 3.0);
        assert_eq!(cue.down_time, 2.0);
    }

    #[test]
    fn test_load_show_data_rejects_channel_mismatch() {
        let mut console = LightingConsole::new(settings(4)).unwrap();
        console.set_channels("2", 50).unwrap();

        let foreign = LightingConsole::new(settings(6)).unwrap().save_show_data();
        let err = console.load_show_data(foreign).unwrap_err();
        assert!(matches!(err, ConsoleError::Persistence(_)));

        // Captured channel survives the refused load.
        let snapshot = console.snapshot();
        assert_eq!(snapshot.channel_states[1], ChannelState::Captured);
        assert_eq!(snapshot.output, vec![0, 50, 0, 0]);
    }

    #[test]
    fn test_load_show_data_refused_while_fading() {
        let mut console = LightingConsole::new(settings(2)).unwrap();
        console.set_channels("/", 100).unwrap();
        console.record_cue(None, None, None, "up").unwrap();
        let show = console.save_show_data();
        console.back().unwrap();

        assert!(matches!(
            console.load_show_data(show),
            Err(ConsoleError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_new_show_resets_name_and_cues() {
        let mut console = LightingConsole::new(settings(2)).unwrap();
        console.record_cue(None, None, None, "").unwrap();
        console.new_show("  Matinee ").unwrap();

        assert_eq!(console.show_name(), "Matinee");
        assert_eq!(console.engine().lock().cues().len(), 1);

        console.new_show("").unwrap();
        assert_eq!(console.show_name(), UNTITLED_SHOW);
    }

    #[tokio::test]
    async fn test_shutdown_without_output() {
        let mut console = LightingConsole::new(settings(2)).unwrap();
        let stats = console.shutdown().await.unwrap();
        assert_eq!(stats, LoopStats::default());
        assert_eq!(console.snapshot().state, EngineState::NotReady);
        assert!(matches!(console.go(), Err(ConsoleError::InvalidState { .. })));
    }
}
