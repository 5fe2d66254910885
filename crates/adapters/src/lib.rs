pub mod assets;
pub mod catalog;
pub mod fs;
pub mod presenters;

pub use assets::{BackgroundAssetPipeline, FsAssetDecoder, HttpAssetFetcher};
pub use catalog::JsonCatalogSource;
pub use fs::SystemClock;
pub use presenters::{
    present_asset_check, present_pipeline_stats, present_plan, present_variant_row,
};
