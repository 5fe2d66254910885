use std::path::PathBuf;
use std::time::Duration;

use livery_domain::DEFAULT_TRANSITION_DELAY;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub asset_root: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub transition_delay: Duration,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            catalog_path: None,
            transition_delay: DEFAULT_TRANSITION_DELAY,
            window_size: [900.0, 640.0],
        }
    }
}
