use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a record in the target store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// Want to read/watch at some point
    Backlog,
    /// Picked up but barely started
    Scheduled,
    /// Actively reading/watching
    #[serde(rename = "In progress")]
    InProgress,
    /// Finished
    Done,
    /// Abandoned
    Dropped,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Backlog => "Backlog",
            RecordStatus::Scheduled => "Scheduled",
            RecordStatus::InProgress => "In progress",
            RecordStatus::Done => "Done",
            RecordStatus::Dropped => "Dropped",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Backlog" => Ok(RecordStatus::Backlog),
            "Scheduled" => Ok(RecordStatus::Scheduled),
            "In progress" => Ok(RecordStatus::InProgress),
            "Done" => Ok(RecordStatus::Done),
            "Dropped" => Ok(RecordStatus::Dropped),
            other => Err(format!("Unknown record status: {}", other)),
        }
    }
}

/// Shelf/archive labels with meaning to the mapper.
/// Any other label (e.g. "Reading") carries no status on its own.
pub struct ArchiveLabel;

impl ArchiveLabel {
    pub const LATER: &'static str = "Later";
    pub const DROPPED: &'static str = "Dropped";
    pub const DONE: &'static str = "Done";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            RecordStatus::Backlog,
            RecordStatus::Scheduled,
            RecordStatus::InProgress,
            RecordStatus::Done,
            RecordStatus::Dropped,
        ] {
            assert_eq!(status.as_str().parse::<RecordStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_unknown_label() {
        assert!("Reading".parse::<RecordStatus>().is_err());
    }
}
