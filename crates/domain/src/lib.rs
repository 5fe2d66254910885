mod error;
mod machine;
mod render;
mod variant;

pub use error::DomainError;
pub use machine::{
    ConfiguratorEvent, Effect, LoadTicket, Phase, SelectionState, Step, TransitionToken,
    VariantMachine, DEFAULT_TRANSITION_DELAY,
};
pub use render::{DisplayImage, Highlight, RenderPlan, Swatch, TRANSITION_SCALE};
pub use variant::{AccentColor, Catalog, ImageRef, Variant, VariantId};
