use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::{from_reader, to_writer_pretty};

use super::show::{Show, SHOW_EXTENSION, SHOW_FORMAT_VERSION};

/// Reads and writes show files in a shows directory.
pub struct ShowManager {
    shows_directory: PathBuf,
    current_path: Option<PathBuf>,
}

impl ShowManager {
    pub fn new(shows_directory: impl Into<PathBuf>) -> Self {
        Self {
            shows_directory: shows_directory.into(),
            current_path: None,
        }
    }

    pub fn shows_directory(&self) -> &Path {
        &self.shows_directory
    }

    /// Path of the show most recently loaded or saved.
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Remember where the running show lives, once it is actually in use.
    pub fn set_current_path(&mut self, path: impl Into<PathBuf>) {
        self.current_path = Some(path.into());
    }

    /// Forget the current path, e.g. after starting a new show.
    pub fn clear_current(&mut self) {
        self.current_path = None;
    }

    /// Default file path for a show name inside the shows directory.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let sanitized: String = name
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        let stem = if sanitized.is_empty() { "untitled" } else { &sanitized };
        self.shows_directory
            .join(format!("{}.{}", stem, SHOW_EXTENSION))
    }

    /// Save to `path`, or to the current path, or to a path derived from the
    /// show name. The file is written beside the target and renamed into
    /// place so an interrupted save leaves the old file intact.
    pub fn save_show(&mut self, show: &Show, path: Option<&Path>) -> Result<PathBuf> {
        let path = match (path, &self.current_path) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(current)) => current.clone(),
            (None, None) => self.path_for(&show.name),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let staging = path.with_extension(format!("{}.tmp", SHOW_EXTENSION));
        {
            let file = File::create(&staging)
                .with_context(|| format!("creating {}", staging.display()))?;
            let mut writer = BufWriter::new(file);
            to_writer_pretty(&mut writer, show).context("serializing show")?;
            writer.flush().context("writing show")?;
        }
        fs::rename(&staging, &path)
            .with_context(|| format!("moving show into {}", path.display()))?;

        log::info!("Saved show '{}' to {}", show.name, path.display());
        self.current_path = Some(path.clone());
        Ok(path)
    }

    /// Read and check a show file. The current path is left alone; callers
    /// set it once the show has been accepted.
    pub fn load_show(&self, path: &Path) -> Result<Show> {
        let file =
            File::open(path).with_context(|| format!("opening show file {}", path.display()))?;
        let show: Show = from_reader(BufReader::new(file))
            .with_context(|| format!("parsing show file {}", path.display()))?;

        if show.format_version != SHOW_FORMAT_VERSION {
            bail!(
                "show file {} has format version {}, expected {}",
                path.display(),
                show.format_version,
                SHOW_FORMAT_VERSION
            );
        }

        log::info!(
            "Read show '{}' with {} cues from {}",
            show.name,
            show.cues.len(),
            path.display()
        );
        Ok(show)
    }

    pub fn list_shows(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.shows_directory)
            .with_context(|| format!("listing {}", self.shows_directory.display()))?;

        let mut shows = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == SHOW_EXTENSION) {
                shows.push(path);
            }
        }
        shows.sort();
        Ok(shows)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::cue::cue::{Cue, CueNumber};

    fn sample_show() -> Show {
        let cues = vec![
            Cue::new(CueNumber::ZERO, vec![0, 0, 0], 1.0, 1.0, "preset", 0.05),
            Cue::new(CueNumber::from_tenths(15), vec![255, 16, 3], 2.5, 0.5, "wash", 0.05),
            Cue::new(CueNumber::from_tenths(20), vec![9, 9, 9], 99.9, 0.05, "", 0.05),
        ];
        Show::new("Opening Night", 3, &cues)
    }

    #[test]
    fn test_save_then_load_is_equivalent() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ShowManager::new(temp_dir.path());
        let show = sample_show();

        let path = manager.save_show(&show, None).unwrap();
        assert_eq!(path, temp_dir.path().join("opening_night.lxshow"));
        assert_eq!(manager.current_path(), Some(path.as_path()));

        let loaded = ShowManager::new(temp_dir.path()).load_show(&path).unwrap();
        assert_eq!(loaded, show);
        assert_eq!(loaded.into_cues(), show.clone().into_cues());
    }

    #[test]
    fn test_save_reuses_current_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ShowManager::new(temp_dir.path());
        let explicit = temp_dir.path().join("shows").join("custom.lxshow");

        manager.save_show(&sample_show(), Some(&explicit)).unwrap();
        let again = manager.save_show(&sample_show(), None).unwrap();
        assert_eq!(again, explicit);
        assert!(!explicit.with_extension("lxshow.tmp").exists());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ShowManager::new(temp_dir.path());
        let mut show = sample_show();
        show.format_version = 99;
        let path = manager.save_show(&show, None).unwrap();

        let err = manager.load_show(&path).unwrap_err();
        assert!(err.to_string().contains("format version 99"));
    }

    #[test]
    fn test_load_reports_missing_and_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ShowManager::new(temp_dir.path());
        assert!(manager.load_show(&temp_dir.path().join("nope.lxshow")).is_err());

        let corrupt = temp_dir.path().join("corrupt.lxshow");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(manager.load_show(&corrupt).is_err());
        assert_eq!(manager.current_path(), None);
    }

    #[test]
    fn test_list_shows_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ShowManager::new(temp_dir.path());
        manager.save_show(&sample_show(), None).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();

        let shows = manager.list_shows().unwrap();
        assert_eq!(shows, vec![temp_dir.path().join("opening_night.lxshow")]);
    }
}
