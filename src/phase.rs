//! Phases of a single fixture load.

/// Where a load is in its pipeline.
///
/// A load moves strictly forward through
/// `Idle -> ReadingFile -> Parsing -> Clearing -> Creating -> Writing -> Done`.
/// A failure in any phase moves it to `Failed`; there is no retry or resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    Idle,
    /// Reading the fixture file and resolving its format.
    ReadingFile,
    Parsing,
    /// Dropping the table if it already exists.
    Clearing,
    /// Creating the table and its column families.
    Creating,
    /// Bulk-applying the cells.
    Writing,
    Done,
    /// Terminal state after an error; the error itself is returned to the caller.
    Failed,
}

impl LoadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "idle",
            LoadPhase::ReadingFile => "reading_file",
            LoadPhase::Parsing => "parsing",
            LoadPhase::Clearing => "clearing",
            LoadPhase::Creating => "creating",
            LoadPhase::Writing => "writing",
            LoadPhase::Done => "done",
            LoadPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
