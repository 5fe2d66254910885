use std::sync::Arc;

use livery_domain::{Catalog, ImageRef, LoadTicket};

use crate::ApplicationError;

pub trait CatalogSource {
    fn load_catalog(&self) -> Result<Catalog, ApplicationError>;
}

/// RGBA8 pixels of one decoded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    pub image: ImageRef,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait AssetDecoder: Send + Sync {
    fn decode(&self, image: &ImageRef) -> Result<DecodedAsset, ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub image: ImageRef,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub result: Result<Arc<DecodedAsset>, ApplicationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub submitted: u64,
    pub prefetched: u64,
    pub cache_hits: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Asynchronous image loading. Every outcome carries the ticket of the
/// request it answers; prefetches produce no outcome at all.
pub trait AssetPipeline {
    fn submit(&self, request: LoadRequest) -> Result<(), ApplicationError>;

    fn prefetch(&self, images: Vec<ImageRef>) -> Result<(), ApplicationError>;

    fn try_receive(&self) -> Result<Option<LoadOutcome>, ApplicationError>;

    fn stats(&self) -> Result<PipelineStats, ApplicationError>;
}

/// Monotonic milliseconds since an arbitrary origin.
pub trait Clock {
    fn now_millis(&self) -> u64;
}
