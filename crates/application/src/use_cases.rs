use livery_domain::{ImageRef, VariantId};

#[derive(Debug, Clone, Default)]
pub struct MountCommand;

#[derive(Debug, Clone)]
pub struct SelectVariantCommand {
    pub variant: VariantId,
}

#[derive(Debug, Clone, Default)]
pub struct TickCommand;

#[derive(Debug, Clone, Default)]
pub struct RenderPlanQuery;

#[derive(Debug, Clone, Default)]
pub struct CheckAssetsCommand;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub transition_committed: bool,
    pub loaded: usize,
    pub failed: usize,
    pub stale: usize,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.transition_committed || self.loaded > 0 || self.failed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCheck {
    pub variant: VariantId,
    pub image: ImageRef,
    pub result: Result<(u32, u32), String>,
}
