//! Batch clustering: all pairs, transitive groups, one original per group.

use super::{
    ClusterResult, DuplicateGroup, FusionStrategy, PairVerdict, PriorityStrategy, Thresholds,
    TransitiveGrouper, Verdict,
};
use crate::core::hasher::HashAlgorithmKind;
use crate::core::metrics::MetricResult;
use crate::core::profile::ImageProfile;
use crate::error::{DetectorError, MetricError};
use crate::events::{
    CompareEvent, CompareProgress, Event, EventSender, PipelineEvent, PipelinePhase,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Weights of the quality ranking: sharpness, byte size, resolution, in-group similarity
const QUALITY_WEIGHTS: [f64; 4] = [0.25, 0.15, 0.2, 0.4];

/// How the original of a group is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginalPolicy {
    /// Lowest batch index
    #[default]
    FirstIndex,
    /// Highest weighted score of sharpness, byte size, resolution and
    /// in-group similarity, plus a bonus for small hash distances.
    /// Ties go to the lowest index.
    QualityScore,
}

impl std::fmt::Display for OriginalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginalPolicy::FirstIndex => write!(f, "first-index"),
            OriginalPolicy::QualityScore => write!(f, "quality-score"),
        }
    }
}

/// Cluster profiles with the default fusion strategy and original policy.
pub fn cluster_profiles<P>(
    profiles: &[P],
    thresholds: &Thresholds,
) -> Result<ClusterResult, DetectorError>
where
    P: Borrow<ImageProfile> + Sync,
{
    let strategy = PriorityStrategy::new(*thresholds)?;
    cluster_profiles_with(
        profiles,
        &strategy,
        OriginalPolicy::default(),
        &crate::events::null_sender(),
    )
}

/// Cluster profiles: every unordered pair is fused in parallel, derivative
/// pairs become edges, and union-find merges them sequentially.
pub fn cluster_profiles_with<P>(
    profiles: &[P],
    strategy: &dyn FusionStrategy,
    policy: OriginalPolicy,
    events: &EventSender,
) -> Result<ClusterResult, DetectorError>
where
    P: Borrow<ImageProfile> + Sync,
{
    let start = Instant::now();
    let n = profiles.len();
    let total_comparisons = n.saturating_sub(1) * n / 2;

    events.send(Event::Compare(CompareEvent::Started {
        total_images: n,
        total_comparisons,
    }));

    // In-group similarity for quality ranking needs every pair's metrics
    let verdicts = evaluate_pairs(profiles, strategy, policy.needs_quality(), events)?;

    events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
        phase: PipelinePhase::Grouping,
    }));

    let mut grouper = TransitiveGrouper::new(n);
    for (i, j, verdict) in &verdicts {
        if verdict.is_derivative {
            grouper.union(*i, *j);
        }
    }

    let groups: Vec<DuplicateGroup> = {
        let lookup: HashMap<(usize, usize), &MetricResult> = match policy {
            OriginalPolicy::FirstIndex => HashMap::new(),
            OriginalPolicy::QualityScore => verdicts
                .iter()
                .map(|(i, j, verdict)| ((*i, *j), &verdict.metrics))
                .collect(),
        };

        grouper
            .groups()
            .into_iter()
            .map(|members| {
                let original_index = match policy {
                    OriginalPolicy::FirstIndex => members[0],
                    OriginalPolicy::QualityScore => rank_by_quality(&members, profiles, &lookup),
                };
                DuplicateGroup {
                    members,
                    original_index,
                }
            })
            .collect()
    };

    // Parallel collect preserves order, so pairs are already (i, j) sorted
    let pairs: Vec<PairVerdict> = verdicts
        .into_iter()
        .filter(|(_, _, verdict)| verdict.is_derivative)
        .map(|(first, second, verdict)| PairVerdict {
            first,
            second,
            verdict,
        })
        .collect();

    let result = ClusterResult {
        groups,
        pairs,
        total_images: n,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    debug!(
        images = n,
        comparisons = total_comparisons,
        matches = result.pairs.len(),
        policy = %policy,
        "clustered batch"
    );

    events.send(Event::Compare(CompareEvent::Completed {
        total_groups: result.duplicate_groups().count(),
        total_matches: result.pairs.len(),
    }));

    Ok(result)
}

/// Fuse every unordered pair in parallel, in (i, j) order.
///
/// Non-derivative pairs are dropped as they are produced unless `keep_all`
/// is set.
fn evaluate_pairs<P>(
    profiles: &[P],
    strategy: &dyn FusionStrategy,
    keep_all: bool,
    events: &EventSender,
) -> Result<Vec<(usize, usize, Verdict)>, MetricError>
where
    P: Borrow<ImageProfile> + Sync,
{
    let n = profiles.len();
    let total_comparisons = n.saturating_sub(1) * n / 2;
    let completed = AtomicUsize::new(0);
    let matches_found = AtomicUsize::new(0);
    let update_interval = (total_comparisons / 50).clamp(1, 1000);

    (0..n)
        .into_par_iter()
        .flat_map_iter(|i| ((i + 1)..n).map(move |j| (i, j)))
        .filter_map(|(i, j)| {
            let metrics = match profiles[i].borrow().measure(profiles[j].borrow()) {
                Ok(metrics) => metrics,
                Err(e) => return Some(Err(e)),
            };
            let verdict = strategy.fuse(metrics);

            if verdict.is_derivative {
                matches_found.fetch_add(1, Ordering::Relaxed);
            }
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % update_interval == 0 {
                events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                    comparisons_completed: done,
                    total_comparisons,
                    matches_found: matches_found.load(Ordering::Relaxed),
                })));
            }

            (keep_all || verdict.is_derivative).then_some(Ok((i, j, verdict)))
        })
        .collect()
}

/// Pick the member with the best weighted quality score
fn rank_by_quality<P>(
    members: &[usize],
    profiles: &[P],
    lookup: &HashMap<(usize, usize), &MetricResult>,
) -> usize
where
    P: Borrow<ImageProfile>,
{
    if members.len() == 1 {
        return members[0];
    }

    let pair = |a: usize, b: usize| lookup.get(&(a.min(b), a.max(b))).copied();

    let mut sharpness = Vec::with_capacity(members.len());
    let mut size = Vec::with_capacity(members.len());
    let mut resolution = Vec::with_capacity(members.len());
    let mut similarity = Vec::with_capacity(members.len());
    let mut hash_distance = Vec::with_capacity(members.len());

    for &index in members {
        let profile = profiles[index].borrow();
        sharpness.push(profile.sharpness.unwrap_or(0.0));
        size.push(profile.byte_len as f64);
        resolution.push(profile.resolution() as f64);

        let peers = members.iter().filter(|&&other| other != index);
        similarity.push(
            peers
                .clone()
                .filter_map(|&other| pair(index, other))
                .map(|m| m.similarity_score)
                .sum::<f64>(),
        );
        hash_distance.push(
            peers
                .filter_map(|&other| pair(index, other))
                .filter_map(|m| {
                    m.hash_distances
                        .get(&HashAlgorithmKind::Perceptual)
                        .or_else(|| m.hash_distances.get(&HashAlgorithmKind::Difference))
                })
                .map(|&d| f64::from(d))
                .sum::<f64>(),
        );
    }

    let components = [
        share_of_total(&sharpness),
        share_of_total(&size),
        share_of_total(&resolution),
        share_of_total(&similarity),
    ];
    let hash_distance = share_of_total(&hash_distance);

    let mut best = members[0];
    let mut best_score = f64::NEG_INFINITY;
    for (slot, &index) in members.iter().enumerate() {
        let weighted: f64 = QUALITY_WEIGHTS
            .iter()
            .zip(components.iter())
            .map(|(weight, values)| weight * values[slot])
            .sum();
        let score = weighted + 1.0 / (1.0 + hash_distance[slot]);

        // Strict comparison keeps the lowest index on ties
        if score > best_score {
            best_score = score;
            best = index;
        }
    }

    best
}

/// Each value divided by the total, or all zeros when the total is zero
fn share_of_total(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

impl OriginalPolicy {
    /// Whether profiles need quality metrics for this policy
    pub fn needs_quality(&self) -> bool {
        matches!(self, OriginalPolicy::QualityScore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::ImageBuffer;
    use crate::core::profile::Profiler;
    use crate::events::EventChannel;
    use image::{DynamicImage, GrayImage, Luma};

    /// 256x256 image of 4x4 cells, `1` cells bright
    fn cells(pattern: &str, lo: u8, hi: u8) -> DynamicImage {
        let bits: Vec<bool> = pattern.chars().map(|c| c == '1').collect();
        DynamicImage::ImageLuma8(GrayImage::from_fn(256, 256, |x, y| {
            let cell = (y / 64 * 4 + x / 64) as usize;
            Luma([if bits[cell] { hi } else { lo }])
        }))
    }

    fn profile(image: DynamicImage, profiler: &Profiler) -> ImageProfile {
        profiler
            .profile(&ImageBuffer::from_image(image).unwrap())
            .unwrap()
    }

    #[test]
    fn empty_batch_yields_no_groups() {
        let profiles: Vec<ImageProfile> = Vec::new();
        let result = cluster_profiles(&profiles, &Thresholds::default()).unwrap();

        assert!(result.groups.is_empty());
        assert!(result.pairs.is_empty());
        assert_eq!(result.total_images, 0);
    }

    #[test]
    fn near_copies_group_and_strangers_stay_apart() {
        let profiler = Profiler::new();
        let profiles = vec![
            profile(cells("0011101000100011", 0, 255), &profiler),
            profile(cells("0110000010011110", 0, 255), &profiler),
            profile(cells("0011101000100011", 12, 255), &profiler),
        ];

        let result = cluster_profiles(&profiles, &Thresholds::default()).unwrap();

        let members: Vec<Vec<usize>> = result.groups.iter().map(|g| g.members.clone()).collect();
        assert_eq!(members, vec![vec![0, 2], vec![1]]);
        assert_eq!(result.originals(), vec![0, 1]);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!((result.pairs[0].first, result.pairs[0].second), (0, 2));
    }

    #[test]
    fn derivative_pairs_always_share_a_group() {
        let profiler = Profiler::new();
        let profiles: Vec<ImageProfile> = [
            ("0011101000100011", 0),
            ("0011101000100011", 20),
            ("0000010101001001", 0),
            ("0011101000100011", 35),
        ]
        .iter()
        .map(|(pattern, lo)| profile(cells(pattern, *lo, 255), &profiler))
        .collect();

        let result = cluster_profiles(&profiles, &Thresholds::default()).unwrap();

        let group_of = |index: usize| {
            result
                .groups
                .iter()
                .position(|g| g.members.contains(&index))
                .unwrap()
        };
        for pair in &result.pairs {
            assert_eq!(group_of(pair.first), group_of(pair.second));
        }
        assert_eq!(result.groups.iter().map(|g| g.members.len()).sum::<usize>(), 4);
    }

    #[test]
    fn quality_policy_prefers_the_sharper_larger_copy() {
        let profiler = Profiler::new().with_quality(true);
        let sharp = cells("0011101000100011", 0, 255);
        let degraded = sharp
            .resize_exact(128, 128, image::imageops::FilterType::Triangle)
            .blur(2.0);

        let profiles = vec![profile(degraded, &profiler), profile(sharp, &profiler)];
        let strategy = PriorityStrategy::default();

        let first = cluster_profiles_with(
            &profiles,
            &strategy,
            OriginalPolicy::FirstIndex,
            &crate::events::null_sender(),
        )
        .unwrap();
        assert_eq!(first.originals(), vec![0]);

        let ranked = cluster_profiles_with(
            &profiles,
            &strategy,
            OriginalPolicy::QualityScore,
            &crate::events::null_sender(),
        )
        .unwrap();
        assert_eq!(ranked.groups[0].members, vec![0, 1]);
        assert_eq!(ranked.originals(), vec![1]);
    }

    #[test]
    fn emits_started_and_completed_events() {
        let profiler = Profiler::new();
        let profiles = vec![
            profile(cells("0011101000100011", 0, 255), &profiler),
            profile(cells("0011101000100011", 0, 255), &profiler),
        ];
        let (sender, receiver) = EventChannel::new();

        cluster_profiles_with(
            &profiles,
            &PriorityStrategy::default(),
            OriginalPolicy::FirstIndex,
            &sender,
        )
        .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Compare(CompareEvent::Started {
                total_images: 2,
                total_comparisons: 1
            }))
        ));
        assert!(matches!(
            events.last(),
            Some(Event::Compare(CompareEvent::Completed {
                total_groups: 1,
                total_matches: 1
            }))
        ));
    }

    #[test]
    fn only_derivative_pairs_are_retained_unless_requested() {
        let profiler = Profiler::new();
        let profiles = vec![
            profile(cells("0011101000100011", 0, 255), &profiler),
            profile(cells("0110000010011110", 0, 255), &profiler),
            profile(cells("0011101000100011", 12, 255), &profiler),
            profile(cells("0000010101001001", 0, 255), &profiler),
        ];
        let strategy = PriorityStrategy::default();
        let sender = crate::events::null_sender();

        let derivative = evaluate_pairs(&profiles, &strategy, false, &sender).unwrap();
        let indices: Vec<(usize, usize)> = derivative.iter().map(|(i, j, _)| (*i, *j)).collect();
        assert_eq!(indices, vec![(0, 2)]);

        let all = evaluate_pairs(&profiles, &strategy, true, &sender).unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!((all[0].0, all[0].1), (0, 1));
        assert_eq!((all[5].0, all[5].1), (2, 3));
    }

    #[test]
    fn grouping_phase_follows_the_comparisons() {
        let profiler = Profiler::new();
        let profiles = vec![
            profile(cells("0011101000100011", 0, 255), &profiler),
            profile(cells("0011101000100011", 12, 255), &profiler),
        ];
        let (sender, receiver) = EventChannel::new();

        cluster_profiles_with(
            &profiles,
            &PriorityStrategy::default(),
            OriginalPolicy::FirstIndex,
            &sender,
        )
        .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        let grouping = events
            .iter()
            .position(|event| {
                matches!(
                    event,
                    Event::Pipeline(PipelineEvent::PhaseChanged {
                        phase: PipelinePhase::Grouping
                    })
                )
            })
            .unwrap();
        let completed = events
            .iter()
            .position(|event| matches!(event, Event::Compare(CompareEvent::Completed { .. })))
            .unwrap();
        assert!(grouping < completed);
    }

    #[test]
    fn share_of_total_handles_zero_sum() {
        assert_eq!(share_of_total(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(share_of_total(&[1.0, 3.0]), vec![0.25, 0.75]);
    }
}
