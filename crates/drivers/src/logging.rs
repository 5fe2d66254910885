use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn,eframe=warn,egui_glow=warn";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
