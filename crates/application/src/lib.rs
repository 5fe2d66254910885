mod error;
mod ports;
mod service;
mod use_cases;

pub use error::ApplicationError;
pub use ports::{
    AssetDecoder, AssetPipeline, CatalogSource, Clock, DecodedAsset, LoadOutcome, LoadRequest,
    PipelineStats,
};
pub use service::ConfiguratorService;
pub use use_cases::{
    AssetCheck, CheckAssetsCommand, MountCommand, RenderPlanQuery, SelectVariantCommand,
    TickCommand, TickReport,
};
