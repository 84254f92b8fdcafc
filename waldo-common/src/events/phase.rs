//! Lifecycle phases of a location-resolution session

use serde::{Deserialize, Serialize};

/// Phase a session is in
///
/// Phases advance linearly:
/// STARTING → EXTRACTING_ARTICLE → EXTRACTING_LOCATIONS → PROCESSING_LOCATIONS → FILTERING → COMPLETE
///
/// ERROR is reachable from any non-terminal phase. COMPLETE and ERROR are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    /// Job accepted, nothing fetched yet
    Starting,
    /// Fetching the article (URL) or accepting raw text
    ExtractingArticle,
    /// Asking the extraction model for place mentions
    ExtractingLocations,
    /// Geocoding and summarizing each candidate
    ProcessingLocations,
    /// Spatial-hierarchy deduplication
    Filtering,
    /// Finished with a result
    Complete,
    /// Finished without a result
    Error,
}

impl ProgressPhase {
    /// Position in the linear progression
    pub fn ordinal(self) -> u8 {
        match self {
            ProgressPhase::Starting => 0,
            ProgressPhase::ExtractingArticle => 1,
            ProgressPhase::ExtractingLocations => 2,
            ProgressPhase::ProcessingLocations => 3,
            ProgressPhase::Filtering => 4,
            ProgressPhase::Complete => 5,
            ProgressPhase::Error => 6,
        }
    }

    /// True for COMPLETE and ERROR
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressPhase::Complete | ProgressPhase::Error)
    }

    /// Whether an event in `next` may follow an event in `self`
    ///
    /// Repeating the current phase is allowed (several events per phase);
    /// going backwards or leaving a terminal phase is not.
    pub fn can_advance_to(self, next: ProgressPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == ProgressPhase::Error || next.ordinal() >= self.ordinal()
    }

    /// Wire name (matches the serde representation)
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressPhase::Starting => "starting",
            ProgressPhase::ExtractingArticle => "extracting_article",
            ProgressPhase::ExtractingLocations => "extracting_locations",
            ProgressPhase::ProcessingLocations => "processing_locations",
            ProgressPhase::Filtering => "filtering",
            ProgressPhase::Complete => "complete",
            ProgressPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
