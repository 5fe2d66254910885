mod decoder;
mod pipeline;
mod remote;

pub use decoder::{FsAssetDecoder, FALLBACK_HEIGHT, FALLBACK_WIDTH};
pub use pipeline::BackgroundAssetPipeline;
pub use remote::HttpAssetFetcher;
