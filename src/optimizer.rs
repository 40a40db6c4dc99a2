//! Image Optimizer
//!
//! Composition point for the pipeline: discovery feeds the visibility
//! observer, visibility transitions feed the bounded scheduler, admitted
//! slots go out through the host fetcher, and every completion converges in
//! one handler that balances the concurrency counter and settles the slot.
//!
//! An instance is explicit; configuration, the capability probe, the fetch
//! primitive, and the analytics sink are all injected, so pages compose one
//! instance where they need it and tests run several side by side.

use std::time::Instant;

use crate::capability::{CapabilitySet, FormatProbe};
use crate::config::{Config, Platform};
use crate::loader::{FetchId, FetchOutcome, ImageFetcher, InFlightLoad, LoadTracker};
use crate::metrics::{AnalyticsSink, Metrics, Reporter};
use crate::mutation::MutationWatcher;
use crate::observer::{VisibilityObserver, Viewport};
use crate::placeholder::{make_placeholder, PlaceholderKind};
use crate::resolve::{resolve_candidate, ImageRole};
use crate::scheduler::{Admission, LoadScheduler};
use crate::slot::{
    ImageElement, NodeId, SlotId, SlotRegistry, SlotState, ERROR_CLASS, LOADED_CLASS, LOADING_CLASS,
};
use crate::OptimizerError;

/// The lazy image loading pipeline.
pub struct ImageOptimizer {
    config: Config,
    platform: Platform,
    capabilities: CapabilitySet,
    registry: SlotRegistry,
    observer: VisibilityObserver,
    scheduler: LoadScheduler,
    tracker: LoadTracker,
    watcher: MutationWatcher,
    reporter: Reporter,
    fetcher: Box<dyn ImageFetcher>,
    destroyed: bool,
}

impl ImageOptimizer {
    /// Build a pipeline instance. The capability probe runs once here; its
    /// answer is fixed for the session.
    pub fn new(
        config: Config,
        platform: Platform,
        probe: &dyn FormatProbe,
        fetcher: Box<dyn ImageFetcher>,
        sink: Box<dyn AnalyticsSink>,
    ) -> Self {
        let capabilities = CapabilitySet::detect(probe);
        if !platform.intersection_observer {
            tracing::warn!("viewport intersection tracking unavailable, loading all images eagerly");
        }
        tracing::info!(
            webp = capabilities.webp,
            avif = capabilities.avif,
            "image optimizer initialized"
        );
        let observer = VisibilityObserver::new(config.root_margin, config.threshold);
        let scheduler = LoadScheduler::new(config.max_concurrent_loads);
        Self {
            config,
            platform,
            capabilities,
            registry: SlotRegistry::new(),
            observer,
            scheduler,
            tracker: LoadTracker::new(),
            watcher: MutationWatcher::new(),
            reporter: Reporter::new(sink),
            fetcher,
            destroyed: false,
        }
    }

    /// Register the page's initial image elements.
    pub fn scan(&mut self, elements: Vec<ImageElement>) {
        if self.destroyed {
            return;
        }
        let before = self.reporter.metrics().total_discovered;
        self.register(elements);
        let found = self.reporter.metrics().total_discovered - before;
        tracing::info!(found, "initial image scan complete");
    }

    /// Register elements inserted after the initial scan. Re-delivery of an
    /// already-tracked node is a no-op.
    pub fn process_insertions(&mut self, inserted: Vec<ImageElement>) {
        if self.destroyed {
            return;
        }
        self.register(inserted);
    }

    /// Stop tracking elements removed from the document. Queued entries are
    /// withdrawn; in-flight loads settle through the normal completion path.
    pub fn process_removals(&mut self, removed: &[NodeId]) {
        for &node in removed {
            let Some(id) = self.registry.lookup(node) else {
                continue;
            };
            self.observer.unobserve(id);
            self.scheduler.withdraw(id);
            self.registry.remove(node);
            tracing::debug!(node, "image slot removed from tracking");
        }
    }

    /// Host visibility callback: trigger loads for slots entering the
    /// pre-trigger region.
    pub fn update_viewport(&mut self, viewport: Viewport) {
        if self.destroyed {
            return;
        }
        for id in self.observer.update(viewport) {
            self.trigger(id);
        }
    }

    /// Host completion callback for a fetch started earlier. Completions for
    /// fetches that already timed out are ignored.
    pub fn complete_fetch(&mut self, id: FetchId, outcome: FetchOutcome) {
        let Some(load) = self.tracker.finish(id) else {
            tracing::debug!(fetch = id, "completion for unknown or timed-out fetch ignored");
            return;
        };
        let slot = load.slot;
        match outcome {
            FetchOutcome::Success => self.conclude(slot, Ok(load)),
            FetchOutcome::Error(message) => {
                self.conclude(slot, Err(OptimizerError::Fetch(message)))
            }
        }
    }

    /// Treat in-flight loads past their deadline as failed. The underlying
    /// fetch is abandoned, not cancelled; a later success is ignored.
    pub fn poll_timeouts(&mut self, now: Instant) {
        for fetch in self.tracker.expired(now) {
            if let Some(load) = self.tracker.finish(fetch) {
                tracing::warn!(slot = load.slot.0, url = %load.candidate, "image load timed out");
                self.conclude(load.slot, Err(OptimizerError::Timeout));
            }
        }
    }

    /// Diagnostic: load every pending slot without waiting for visibility.
    pub fn force_load_all(&mut self) {
        if self.destroyed {
            return;
        }
        tracing::info!("force loading all pending images");
        let pending: Vec<SlotId> = self
            .registry
            .iter()
            .filter(|slot| matches!(slot.state, SlotState::Placeholder | SlotState::Observed))
            .map(|slot| slot.id)
            .collect();
        for id in pending {
            self.trigger(id);
        }
    }

    /// Tear down observation and drop the pending queue. In-flight loads may
    /// still settle; session totals stay readable.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.observer.clear();
        let dropped = self.scheduler.clear_queue();
        if dropped > 0 {
            tracing::debug!(dropped, "pending loads dropped on teardown");
        }
        tracing::info!("image optimizer destroyed");
    }

    /// Session capabilities, fixed at construction.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Aggregate session metrics.
    pub fn metrics(&self) -> &Metrics {
        self.reporter.metrics()
    }

    /// Presentation state of a tracked element.
    pub fn element(&self, node: NodeId) -> Option<&ImageElement> {
        let id = self.registry.lookup(node)?;
        self.registry.get(id).map(|slot| &slot.element)
    }

    /// Lifecycle state of a tracked element.
    pub fn slot_state(&self, node: NodeId) -> Option<SlotState> {
        let id = self.registry.lookup(node)?;
        self.registry.get(id).map(|slot| slot.state)
    }

    /// Currently overlapping loads.
    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    /// Slots waiting for a concurrency slot.
    pub fn queued(&self) -> usize {
        self.scheduler.queued()
    }

    /// Slots waiting for a visibility transition.
    pub fn observed(&self) -> usize {
        self.observer.watched()
    }

    /// Live tracked slots.
    pub fn tracked(&self) -> usize {
        self.registry.len()
    }

    fn register(&mut self, elements: Vec<ImageElement>) {
        let fresh = self.watcher.filter_new(elements, &self.registry);
        let lazy = self.config.lazy_load_enabled && self.platform.intersection_observer;
        for element in fresh {
            let node = element.node;
            let role = ImageRole::detect(&element);
            let id = self.registry.insert(element, role);
            self.reporter.record_discovered();
            self.apply_loading_placeholder(id);
            tracing::debug!(node, role = role.as_str(), "image slot discovered");
            if lazy {
                if let Some(slot) = self.registry.get_mut(id) {
                    slot.state = SlotState::Observed;
                    let rect = slot.element.rect;
                    self.observer.observe(id, rect);
                }
            } else {
                self.trigger(id);
            }
        }
    }

    fn apply_loading_placeholder(&mut self, id: SlotId) {
        let (default_w, default_h) = self.config.placeholder_size;
        if let Some(slot) = self.registry.get_mut(id) {
            // Keep an author-supplied eager source visible under the lazy
            // marker; only empty slots get the substitute.
            if slot.element.src.is_empty() {
                let width = slot.element.width.unwrap_or(default_w);
                let height = slot.element.height.unwrap_or(default_h);
                slot.element.src = make_placeholder(width, height, PlaceholderKind::Loading);
            }
            slot.element.add_class(LOADING_CLASS);
        }
    }

    // A slot passes through here at most once per discovery: any state other
    // than Placeholder/Observed means it is already queued, loading, or done.
    fn trigger(&mut self, id: SlotId) {
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        if !matches!(slot.state, SlotState::Placeholder | SlotState::Observed) {
            return;
        }
        self.observer.unobserve(id);
        match self.scheduler.submit(id) {
            Admission::Admitted => self.begin_load(id),
            Admission::Queued => {
                if let Some(slot) = self.registry.get_mut(id) {
                    slot.state = SlotState::Queued;
                }
            }
        }
    }

    fn begin_load(&mut self, id: SlotId) {
        let (original, role) = match self.registry.get_mut(id) {
            Some(slot) => {
                slot.state = SlotState::Loading;
                (slot.original.clone(), slot.role)
            }
            None => {
                // Slot vanished between admission and start; free the
                // concurrency slot and move on.
                if let Some(next) = self.scheduler.complete() {
                    self.begin_load(next);
                }
                return;
            }
        };
        let Some(original) = original else {
            self.conclude(id, Err(OptimizerError::MissingSource));
            return;
        };
        let candidate = resolve_candidate(
            &original,
            role,
            &self.capabilities,
            &self.config.compression_levels,
            &self.config.page_origin,
        );
        let optimized = candidate != original;
        let request = self
            .tracker
            .begin(id, candidate, optimized, self.config.load_timeout);
        tracing::debug!(slot = id.0, url = %request.url, "image load started");
        self.fetcher.start(&request);
    }

    // Single completion path: success, failure, and timeout all converge
    // here, so the counter decrement and the follow-up admission can never
    // be skipped or doubled.
    fn conclude(&mut self, id: SlotId, outcome: Result<InFlightLoad, OptimizerError>) {
        let next = self.scheduler.complete();
        match outcome {
            Ok(load) => self.finish_success(id, load),
            Err(err) => self.finish_failure(id, &err),
        }
        if let Some(next) = next {
            self.begin_load(next);
        }
    }

    fn finish_success(&mut self, id: SlotId, load: InFlightLoad) {
        let elapsed = load.started_at.elapsed();
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        if slot.state != SlotState::Loading {
            tracing::debug!(slot = id.0, "stale load completion ignored");
            return;
        }
        slot.element.src = load.candidate;
        slot.element.data_src = None;
        slot.element.remove_class(LOADING_CLASS);
        slot.element.add_class(LOADED_CLASS);
        slot.element.fade_in = true;
        slot.state = SlotState::Loaded;
        let role = slot.role;
        let src = slot.element.src.clone();
        self.reporter.record_loaded(&src, elapsed, role, load.optimized);
        tracing::debug!(
            slot = id.0,
            ms = elapsed.as_millis() as u64,
            "image loaded"
        );
    }

    fn finish_failure(&mut self, id: SlotId, err: &OptimizerError) {
        let (default_w, default_h) = self.config.placeholder_size;
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        if slot.state != SlotState::Loading {
            tracing::debug!(slot = id.0, "stale load failure ignored");
            return;
        }
        let width = slot.element.width.unwrap_or(default_w);
        let height = slot.element.height.unwrap_or(default_h);
        slot.element.src = make_placeholder(width, height, PlaceholderKind::Error);
        slot.element.remove_class(LOADING_CLASS);
        slot.element.add_class(ERROR_CLASS);
        slot.state = SlotState::Errored;
        self.reporter.record_error("load_image", &err.to_string());
        tracing::warn!(slot = id.0, error = %err, "image load failed");
    }
}
