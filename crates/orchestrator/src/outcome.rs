//! Results of a diff operation.

use crate::error::{Error, JoinedError};
use entrypoint::Entrypoint;
use resource::{DiffSummary, ResourceChange};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// The diff of one entrypoint.
///
/// `error` is set when either side failed to render; `changes` is then
/// empty. Other entrypoints are unaffected.
#[derive(Debug, Clone)]
pub struct EntrypointDiff {
    pub entrypoint: Entrypoint,
    pub changes: Vec<ResourceChange>,
    pub error: Option<String>,
}

impl EntrypointDiff {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_changes(&self.changes)
    }
}

impl Serialize for EntrypointDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntrypointDiff", 3)?;
        state.serialize_field("entrypoint", &self.entrypoint)?;
        state.serialize_field("error", &self.error)?;
        state.serialize_field("diff", &self.changes)?;
        state.end()
    }
}

/// Terminal state of a diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Done,
    DoneWithErrors,
}

/// Everything a diff operation produced.
///
/// `diffs` holds one entry per entrypoint found in either tree, even when
/// `errors` is not empty. Cleanup failures are kept apart and never turn a
/// successful diff into a failed one.
#[derive(Debug, Default)]
pub struct DiffOutcome {
    pub diffs: Vec<EntrypointDiff>,
    pub errors: Vec<Error>,
    pub cleanup_errors: Vec<repocache::Error>,
}

impl DiffOutcome {
    pub fn state(&self) -> State {
        if self.errors.is_empty() {
            State::Done
        } else {
            State::DoneWithErrors
        }
    }

    /// Counts over every entrypoint.
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_changes(self.diffs.iter().flat_map(|d| &d.changes))
    }

    /// The diffs, or every error when there was at least one.
    pub fn into_result(self) -> Result<Vec<EntrypointDiff>, JoinedError> {
        if self.errors.is_empty() {
            Ok(self.diffs)
        } else {
            Err(JoinedError::new(self.errors))
        }
    }
}
