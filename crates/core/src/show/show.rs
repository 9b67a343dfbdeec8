use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cue::cue::{Cue, CueNumber};

/// Current on-disk schema version.
pub const SHOW_FORMAT_VERSION: u32 = 1;

pub const SHOW_EXTENSION: &str = "lxshow";

/// A saved show: the cue list plus enough metadata to refuse files that do
/// not fit the rig.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Show {
    pub format_version: u32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub channel_count: usize,
    pub cues: Vec<CueRecord>,
}

/// One cue as stored in a show file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CueRecord {
    pub number: CueNumber,
    pub up_time: f64,
    pub down_time: f64,
    #[serde(default)]
    pub description: String,
    pub values: Vec<u8>,
}

impl Show {
    pub fn new(name: impl Into<String>, channel_count: usize, cues: &[Cue]) -> Self {
        let now = Utc::now();
        Self {
            format_version: SHOW_FORMAT_VERSION,
            name: name.into(),
            created_at: now,
            modified_at: now,
            channel_count,
            cues: cues.iter().map(CueRecord::from).collect(),
        }
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues.into_iter().map(Cue::from).collect()
    }
}

impl From<&Cue> for CueRecord {
    fn from(cue: &Cue) -> Self {
        Self {
            number: cue.number,
            up_time: cue.up_time,
            down_time: cue.down_time,
            description: cue.description.clone(),
            values: cue.values.clone(),
        }
    }
}

impl From<CueRecord> for Cue {
    fn from(record: CueRecord) -> Self {
        Cue {
            number: record.number,
            values: record.values,
            up_time: record.up_time,
            down_time: record.down_time,
            description: record.description,
        }
    }
}
