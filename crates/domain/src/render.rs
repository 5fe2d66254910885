use crate::{AccentColor, Catalog, ImageRef, SelectionState, VariantId};

/// Image scale while the outgoing variant fades away.
pub const TRANSITION_SCALE: f32 = 0.95;

const IDLE_GLOW: f32 = 1.0;
const TRANSITION_GLOW: f32 = 1.75;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayImage {
    Variant(ImageRef),
    Fallback(ImageRef),
}

impl DisplayImage {
    pub fn image_ref(&self) -> &ImageRef {
        match self {
            Self::Variant(image) | Self::Fallback(image) => image,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub color: AccentColor,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub id: VariantId,
    pub name: String,
    pub accent: AccentColor,
    pub selected: bool,
    pub enabled: bool,
}

/// Everything the view draws, derived from the catalog and selection state
/// alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub title: String,
    pub image: DisplayImage,
    pub show_loading: bool,
    pub show_error: bool,
    pub fading: bool,
    pub highlight: Highlight,
    pub swatches: Vec<Swatch>,
}

impl RenderPlan {
    pub fn derive(catalog: &Catalog, state: &SelectionState) -> Self {
        let current = catalog
            .get(state.current())
            .unwrap_or_else(|| catalog.first());
        let transitioning = state.is_transitioning();

        let image = if state.has_error() {
            DisplayImage::Fallback(ImageRef::fallback())
        } else {
            DisplayImage::Variant(current.image.clone())
        };

        let swatches = catalog
            .variants()
            .iter()
            .map(|variant| {
                let selected = variant.id == current.id;
                Swatch {
                    id: variant.id.clone(),
                    name: variant.display_name.clone(),
                    accent: variant.accent,
                    selected,
                    enabled: !selected && !transitioning,
                }
            })
            .collect();

        Self {
            title: current.display_name.clone(),
            image,
            show_loading: state.is_loading(),
            show_error: state.has_error(),
            fading: transitioning,
            highlight: Highlight {
                color: current.accent,
                intensity: if transitioning {
                    TRANSITION_GLOW
                } else {
                    IDLE_GLOW
                },
            },
            swatches,
        }
    }

    pub fn image_opacity(&self) -> f32 {
        if self.fading {
            0.0
        } else {
            1.0
        }
    }

    pub fn image_scale(&self) -> f32 {
        if self.fading {
            TRANSITION_SCALE
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfiguratorEvent, Effect, Variant, VariantMachine};

    fn machine() -> VariantMachine {
        VariantMachine::new(
            Catalog::new(vec![
                Variant::new("a", "Alpha", "#111111", "a.png").expect("variant"),
                Variant::new("b", "Beta", "#222222", "b.png").expect("variant"),
            ])
            .expect("catalog"),
        )
    }

    fn id(value: &str) -> VariantId {
        VariantId::new(value).expect("id")
    }

    #[test]
    fn loading_state_shows_indicator_and_variant_image() {
        let machine = machine();
        let state = machine.mount().state;
        let plan = RenderPlan::derive(machine.catalog(), &state);

        assert_eq!(plan.title, "Alpha");
        assert!(plan.show_loading);
        assert!(!plan.show_error);
        assert_eq!(plan.image, DisplayImage::Variant(ImageRef::new("a.png")));
        assert_eq!(plan.highlight.color, AccentColor::rgb(0x11, 0x11, 0x11));
        assert_eq!(plan.image_opacity(), 1.0);
    }

    #[test]
    fn failure_renders_fallback_with_error_indicator() {
        let machine = machine();
        let mounted = machine.mount();
        let ticket = mounted.state.load_ticket().clone();
        let failed = machine.reduce(mounted.state, ConfiguratorEvent::ImageFailed(ticket.clone()));

        let plan = RenderPlan::derive(machine.catalog(), &failed.state);
        assert!(plan.show_error);
        assert!(!plan.show_loading);
        assert!(plan.image.is_fallback());
        assert_eq!(plan.image.image_ref(), &ImageRef::fallback());

        let loaded = machine.reduce(failed.state, ConfiguratorEvent::ImageLoaded(ticket));
        let plan = RenderPlan::derive(machine.catalog(), &loaded.state);
        assert!(!plan.show_error);
        assert!(!plan.image.is_fallback());
    }

    #[test]
    fn swatches_disable_current_selection_only_when_idle() {
        let machine = machine();
        let state = machine.mount().state;
        let plan = RenderPlan::derive(machine.catalog(), &state);

        let enabled: Vec<(bool, bool)> = plan
            .swatches
            .iter()
            .map(|swatch| (swatch.selected, swatch.enabled))
            .collect();
        assert_eq!(enabled, vec![(true, false), (false, true)]);
    }

    #[test]
    fn transition_disables_all_swatches_and_intensifies_highlight() {
        let machine = machine();
        let step = machine.reduce(machine.mount().state, ConfiguratorEvent::SelectVariant(id("b")));
        assert!(matches!(
            step.effects.as_slice(),
            [Effect::ScheduleTransition { .. }]
        ));

        let plan = RenderPlan::derive(machine.catalog(), &step.state);
        assert!(plan.fading);
        assert!(plan.swatches.iter().all(|swatch| !swatch.enabled));
        assert!(plan.highlight.intensity > 1.0);
        assert_eq!(plan.image_opacity(), 0.0);
        assert_eq!(plan.image_scale(), TRANSITION_SCALE);
        assert_eq!(plan.title, "Alpha");
    }
}
