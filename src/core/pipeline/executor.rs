//! Detector execution implementation.

use crate::core::cache::{CacheStats, InMemoryCache, ProfileCache};
use crate::core::comparator::{
    cluster_profiles_with, ClusterResult, FusionStrategy, OriginalPolicy, PriorityStrategy,
    Thresholds, Verdict,
};
use crate::core::hasher::{DcTerm, FingerprintExtractor};
use crate::core::normalizer::ImageBuffer;
use crate::core::profile::{ImageProfile, Profiler};
use crate::error::{ConfigError, DetectorError, NormalizeError};
use crate::events::{
    null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary, ProfileEvent,
    ProfileProgress,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the detector
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// Fusion thresholds
    pub thresholds: Thresholds,
    /// Skip the perceptual hash entirely
    pub disable_perceptual_hash: bool,
    /// pHash DC handling
    pub dc_term: DcTerm,
    /// How group originals are chosen
    pub original_policy: OriginalPolicy,
}

/// Builder for detector configuration
pub struct DetectorBuilder {
    config: DetectorConfig,
    cache: Option<Box<dyn ProfileCache>>,
    strategy: Option<Box<dyn FusionStrategy>>,
}

impl DetectorBuilder {
    /// Create a new detector builder
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
            cache: None,
            strategy: None,
        }
    }

    /// Set the fusion thresholds
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Enable or disable the perceptual hash
    pub fn perceptual_hash(mut self, enabled: bool) -> Self {
        self.config.disable_perceptual_hash = !enabled;
        self
    }

    /// Set pHash DC handling
    pub fn dc_term(mut self, dc_term: DcTerm) -> Self {
        self.config.dc_term = dc_term;
        self
    }

    /// Set how group originals are chosen
    pub fn original_policy(mut self, policy: OriginalPolicy) -> Self {
        self.config.original_policy = policy;
        self
    }

    /// Set the profile cache
    pub fn cache(mut self, cache: Box<dyn ProfileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use an in-memory cache bounded to `capacity` profiles (0 disables caching)
    pub fn cache_capacity(self, capacity: usize) -> Self {
        self.cache(Box::new(InMemoryCache::with_capacity(capacity)))
    }

    /// Replace the fusion strategy (thresholds are then ignored)
    pub fn strategy(mut self, strategy: Box<dyn FusionStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the detector, validating the thresholds
    pub fn build(self) -> Result<Detector, ConfigError> {
        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => Box::new(PriorityStrategy::new(self.config.thresholds)?),
        };

        let extractor = FingerprintExtractor::new()
            .perceptual(!self.config.disable_perceptual_hash)
            .with_dc_term(self.config.dc_term);
        let profiler = Profiler::new()
            .extractor(extractor)
            .with_quality(self.config.original_policy.needs_quality());

        Ok(Detector {
            config: self.config,
            profiler,
            strategy,
            cache: self.cache.unwrap_or_else(|| Box::new(InMemoryCache::new())),
        })
    }
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The derivative image detector
pub struct Detector {
    config: DetectorConfig,
    profiler: Profiler,
    strategy: Box<dyn FusionStrategy>,
    cache: Box<dyn ProfileCache>,
}

impl Detector {
    /// Create a new detector builder
    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::new()
    }

    /// The configuration this detector was built with
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The fusion strategy in use
    pub fn strategy(&self) -> &dyn FusionStrategy {
        self.strategy.as_ref()
    }

    /// Profile cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Profile one image, reusing a cached profile for identical bytes
    pub fn profile(&self, buffer: &ImageBuffer) -> Result<Arc<ImageProfile>, NormalizeError> {
        self.profile_cached(buffer).map(|(profile, _)| profile)
    }

    fn profile_cached(
        &self,
        buffer: &ImageBuffer,
    ) -> Result<(Arc<ImageProfile>, bool), NormalizeError> {
        let key = self.profiler.key(buffer);
        if let Some(profile) = self.cache.get(&key) {
            return Ok((profile, true));
        }

        let profile = Arc::new(self.profiler.profile(buffer)?);
        self.cache.insert(key, Arc::clone(&profile));
        Ok((profile, false))
    }

    /// Decide whether `candidate` is derivative of `reference`
    pub fn compare(
        &self,
        reference: &ImageBuffer,
        candidate: &ImageBuffer,
    ) -> Result<Verdict, DetectorError> {
        let reference = self.profile(reference)?;
        let candidate = self.profile(candidate)?;
        let metrics = reference.measure(&candidate)?;
        Ok(self.strategy.fuse(metrics))
    }

    /// Compare one reference against many candidates, in candidate order
    pub fn compare_many(
        &self,
        reference: &ImageBuffer,
        candidates: &[ImageBuffer],
    ) -> Result<Vec<Verdict>, DetectorError> {
        self.compare_many_with_events(reference, candidates, &null_sender())
    }

    /// Compare one reference against many candidates with event reporting
    pub fn compare_many_with_events(
        &self,
        reference: &ImageBuffer,
        candidates: &[ImageBuffer],
        events: &EventSender,
    ) -> Result<Vec<Verdict>, DetectorError> {
        if candidates.is_empty() {
            return Err(DetectorError::EmptyBatch(
                "at least one candidate image is required".to_string(),
            ));
        }

        events.send(Event::Pipeline(PipelineEvent::Started));
        report_failure(self.run_compare_many(reference, candidates, events), events)
    }

    fn run_compare_many(
        &self,
        reference: &ImageBuffer,
        candidates: &[ImageBuffer],
        events: &EventSender,
    ) -> Result<Vec<Verdict>, DetectorError> {
        let start_time = Instant::now();
        let reference = self.profile(reference)?;
        let profiles = self.profile_all(candidates, events)?;

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let verdicts = profiles
            .par_iter()
            .map(|candidate| {
                reference
                    .measure(candidate)
                    .map(|metrics| self.strategy.fuse(metrics))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let derivative_count = verdicts.iter().filter(|v| v.is_derivative).count();
        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            candidates = candidates.len(),
            derivatives = derivative_count,
            duration_ms,
            "compare finished"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images: candidates.len() + 1,
                duplicate_groups: usize::from(derivative_count > 0),
                derivative_count,
                duration_ms,
            },
        }));

        Ok(verdicts)
    }

    /// Partition a batch into groups of mutual near-duplicates
    pub fn cluster(&self, images: &[ImageBuffer]) -> Result<ClusterResult, DetectorError> {
        self.cluster_with_events(images, &null_sender())
    }

    /// Partition a batch with event reporting
    pub fn cluster_with_events(
        &self,
        images: &[ImageBuffer],
        events: &EventSender,
    ) -> Result<ClusterResult, DetectorError> {
        events.send(Event::Pipeline(PipelineEvent::Started));
        report_failure(self.run_cluster(images, events), events)
    }

    fn run_cluster(
        &self,
        images: &[ImageBuffer],
        events: &EventSender,
    ) -> Result<ClusterResult, DetectorError> {
        let start_time = Instant::now();
        let profiles = self.profile_all(images, events)?;

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        // Emits the Grouping phase once every pair is fused
        let mut result = cluster_profiles_with(
            &profiles,
            self.strategy.as_ref(),
            self.config.original_policy,
            events,
        )?;
        result.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            images = result.total_images,
            groups = result.groups.len(),
            derivatives = result.derivative_count(),
            duration_ms = result.duration_ms,
            "cluster finished"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images: result.total_images,
                duplicate_groups: result.duplicate_groups().count(),
                derivative_count: result.derivative_count(),
                duration_ms: result.duration_ms,
            },
        }));

        Ok(result)
    }

    /// Profile a batch in parallel, preserving input order
    fn profile_all(
        &self,
        images: &[ImageBuffer],
        events: &EventSender,
    ) -> Result<Vec<Arc<ImageProfile>>, DetectorError> {
        let total = images.len();

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Profiling,
        }));
        events.send(Event::Profile(ProfileEvent::Started {
            total_images: total,
        }));

        // Only the first occurrence of each key is profiled in parallel. Later
        // occurrences are resolved afterwards and served from the cache.
        let mut first_seen = HashMap::new();
        let is_first: Vec<bool> = images
            .iter()
            .enumerate()
            .map(|(index, buffer)| {
                *first_seen.entry(self.profiler.key(buffer)).or_insert(index) == index
            })
            .collect();

        let cache_hits = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let record = |index: usize, cached: bool| {
            if cached {
                cache_hits.fetch_add(1, Ordering::SeqCst);
                events.send(Event::Profile(ProfileEvent::CacheHit { index }));
            }

            let current_completed = completed.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Profile(ProfileEvent::Progress(ProfileProgress {
                completed: current_completed,
                total,
                cache_hits: cache_hits.load(Ordering::SeqCst),
            })));
        };

        let unique = images
            .par_iter()
            .enumerate()
            .map(|(index, buffer)| {
                if !is_first[index] {
                    return Ok(None);
                }
                let (profile, cached) = self.profile_cached(buffer)?;
                record(index, cached);
                Ok(Some(profile))
            })
            .collect::<Result<Vec<_>, NormalizeError>>()?;

        let mut profiles = Vec::with_capacity(total);
        for (index, slot) in unique.into_iter().enumerate() {
            let profile = match slot {
                Some(profile) => profile,
                None => {
                    let (profile, cached) = self.profile_cached(&images[index])?;
                    record(index, cached);
                    profile
                }
            };
            profiles.push(profile);
        }

        let total_cache_hits = cache_hits.load(Ordering::SeqCst);
        debug!(images = total, cache_hits = total_cache_hits, "profiled batch");

        events.send(Event::Profile(ProfileEvent::Completed {
            total_profiled: profiles.len(),
            cache_hits: total_cache_hits,
        }));

        Ok(profiles)
    }
}

/// Send a pipeline error event for a failed run, passing the outcome through
fn report_failure<T>(
    outcome: Result<T, DetectorError>,
    events: &EventSender,
) -> Result<T, DetectorError> {
    if let Err(error) = &outcome {
        warn!(%error, "detector run failed");
        events.send(Event::Pipeline(PipelineEvent::Error {
            message: error.to_string(),
        }));
    }
    outcome
}
