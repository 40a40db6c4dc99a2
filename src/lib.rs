//! imgopt
//!
//! A lazy image loading and format negotiation pipeline.
//!
//! Images are discovered (initial scan or DOM insertion), shown as inline
//! SVG placeholders, and loaded only when they approach the viewport. Each
//! load goes through a bounded-concurrency FIFO scheduler, picks the most
//! compact encoding the session can decode (AVIF, then WebP, then the
//! original), and ends in exactly one terminal state per discovery.
//!
//! # Example
//! ```rust,ignore
//! use imgopt::{Config, ImageOptimizer, NullSink, Platform, Viewport};
//!
//! let mut optimizer = ImageOptimizer::new(
//!     Config::default(),
//!     Platform::default(),
//!     &probe,
//!     Box::new(fetcher),
//!     Box::new(NullSink),
//! );
//! optimizer.scan(elements);
//! optimizer.update_viewport(Viewport::new(0.0, 0.0, 800.0, 600.0));
//! ```

mod capability;
mod config;
mod loader;
mod metrics;
mod mutation;
mod observer;
mod optimizer;
mod placeholder;
mod resolve;
mod scheduler;
mod slot;

pub use capability::{CapabilitySet, FormatProbe, ImageFormat, NoProbe};
pub use config::{CompressionLevels, Config, Platform};
pub use loader::{FetchId, FetchOutcome, FetchRequest, ImageFetcher, InFlightLoad, LoadTracker};
pub use metrics::{AnalyticsSink, ImageLoadedEvent, Metrics, NullSink, OptimizerErrorEvent, Reporter};
pub use mutation::MutationWatcher;
pub use observer::{VisibilityObserver, Viewport};
pub use optimizer::ImageOptimizer;
pub use placeholder::{make_placeholder, PlaceholderKind, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use resolve::{resolve_candidate, ImageRole};
pub use scheduler::{Admission, LoadQueueEntry, LoadScheduler};
pub use slot::{
    ImageElement, NodeId, Rect, Slot, SlotId, SlotRegistry, SlotState, ERROR_CLASS, LOADED_CLASS,
    LOADING_CLASS,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Why a load attempt ended in a terminal error
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("image slot has no source")]
    MissingSource,

    #[error("image load timed out")]
    Timeout,

    #[error("image load failed: {0}")]
    Fetch(String),
}
