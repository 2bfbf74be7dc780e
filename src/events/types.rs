//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Input collection events
    Intake(IntakeEvent),
    /// Profiling (decode + fingerprint + grids) events
    Profile(ProfileEvent),
    /// Pairwise comparison events
    Compare(CompareEvent),
    /// Detector-level events
    Pipeline(PipelineEvent),
}

/// Events while collecting input files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IntakeEvent {
    /// Collection has started
    Started { paths: Vec<PathBuf> },
    /// A file was accepted as input
    ImageAccepted { path: PathBuf, size: u64 },
    /// A file was skipped and why
    Skipped { path: PathBuf, reason: String },
    /// Collection completed
    Completed { total_images: usize },
}

/// Events during the profiling phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProfileEvent {
    /// Profiling has started
    Started { total_images: usize },
    /// Progress update during profiling
    Progress(ProfileProgress),
    /// An image was served from the profile cache
    CacheHit { index: usize },
    /// Profiling completed
    Completed {
        total_profiled: usize,
        cache_hits: usize,
    },
}

/// Progress information during profiling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileProgress {
    /// Number of images profiled so far
    pub completed: usize,
    /// Total number of images to profile
    pub total: usize,
    /// Number of cache hits
    pub cache_hits: usize,
}

/// Events during the comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started {
        total_images: usize,
        total_comparisons: usize,
    },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison completed
    Completed {
        total_groups: usize,
        total_matches: usize,
    },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of comparisons completed
    pub comparisons_completed: usize,
    /// Total number of comparisons needed
    pub total_comparisons: usize,
    /// Number of derivative pairs found so far
    pub matches_found: usize,
}

/// Detector-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// A run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Run completed successfully
    Completed { summary: PipelineSummary },
    /// Run failed
    Error { message: String },
}

/// Phases of a detector run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Profiling,
    Comparing,
    Grouping,
}

/// Summary of a detector run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images in the run
    pub total_images: usize,
    /// Groups with more than one member
    pub duplicate_groups: usize,
    /// Images judged derivative of another (excluding originals)
    pub derivative_count: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Profiling => write!(f, "Profiling"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Profile(ProfileEvent::Progress(ProfileProgress {
            completed: 10,
            total: 50,
            cache_hits: 2,
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Profile(ProfileEvent::Progress(p)) => {
                assert_eq!(p.completed, 10);
                assert_eq!(p.cache_hits, 2);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Profiling.to_string(), "Profiling");
        assert_eq!(PipelinePhase::Grouping.to_string(), "Grouping");
    }
}
