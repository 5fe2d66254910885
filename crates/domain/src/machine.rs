use std::time::Duration;

use crate::{Catalog, ImageRef, VariantId};

/// Length of the fade between two variants.
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionToken(u64);

impl TransitionToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TransitionToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Tags one image request with the variant it was issued for. Load results
/// carrying any other ticket than the current one are stale, and so is every
/// result that lands while a transition is pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub variant: VariantId,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingTransition {
    from: VariantId,
    to: VariantId,
    token: TransitionToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    current: VariantId,
    is_loading: bool,
    has_error: bool,
    transition: Option<PendingTransition>,
    load_ticket: LoadTicket,
    next_token: u64,
    next_sequence: u64,
}

impl SelectionState {
    pub fn current(&self) -> &VariantId {
        &self.current
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn load_ticket(&self) -> &LoadTicket {
        &self.load_ticket
    }

    pub fn pending_token(&self) -> Option<TransitionToken> {
        self.transition.as_ref().map(|pending| pending.token)
    }

    pub fn phase(&self) -> Phase {
        if let Some(pending) = &self.transition {
            return Phase::Transitioning {
                from: pending.from.clone(),
                to: pending.to.clone(),
            };
        }
        if self.is_loading {
            return Phase::Loading {
                variant: self.current.clone(),
            };
        }
        Phase::Idle {
            variant: self.current.clone(),
            has_error: self.has_error,
        }
    }

    fn issue_token(&mut self) -> TransitionToken {
        let token = TransitionToken(self.next_token);
        self.next_token += 1;
        token
    }

    fn issue_ticket(&mut self, variant: VariantId) -> LoadTicket {
        let ticket = LoadTicket {
            variant,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        ticket
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle { variant: VariantId, has_error: bool },
    Transitioning { from: VariantId, to: VariantId },
    Loading { variant: VariantId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguratorEvent {
    SelectVariant(VariantId),
    TransitionElapsed(TransitionToken),
    ImageLoaded(LoadTicket),
    ImageFailed(LoadTicket),
}

/// Work the reducer asks its host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Prefetch { images: Vec<ImageRef> },
    RequestImage { ticket: LoadTicket, image: ImageRef },
    ScheduleTransition { token: TransitionToken, delay: Duration },
    CancelTransition { token: TransitionToken },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: SelectionState,
    pub effects: Vec<Effect>,
}

impl Step {
    fn unchanged(state: SelectionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariantMachine {
    catalog: Catalog,
    transition_delay: Duration,
}

impl VariantMachine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            transition_delay: DEFAULT_TRANSITION_DELAY,
        }
    }

    pub fn with_transition_delay(mut self, delay: Duration) -> Self {
        self.transition_delay = delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn transition_delay(&self) -> Duration {
        self.transition_delay
    }

    /// Initial state on mount: first variant, its image requested, every
    /// image prefetched.
    pub fn mount(&self) -> Step {
        let first = self.catalog.first();
        let mut state = SelectionState {
            current: first.id.clone(),
            is_loading: true,
            has_error: false,
            transition: None,
            load_ticket: LoadTicket {
                variant: first.id.clone(),
                sequence: 0,
            },
            next_token: 1,
            next_sequence: 1,
        };
        let ticket = state.issue_ticket(first.id.clone());
        state.load_ticket = ticket.clone();

        Step {
            state,
            effects: vec![
                Effect::Prefetch {
                    images: self.catalog.images(),
                },
                Effect::RequestImage {
                    ticket,
                    image: first.image.clone(),
                },
            ],
        }
    }

    pub fn reduce(&self, state: SelectionState, event: ConfiguratorEvent) -> Step {
        match event {
            ConfiguratorEvent::SelectVariant(target) => self.select(state, target),
            ConfiguratorEvent::TransitionElapsed(token) => self.commit(state, token),
            ConfiguratorEvent::ImageLoaded(ticket) => image_loaded(state, &ticket),
            ConfiguratorEvent::ImageFailed(ticket) => image_failed(state, &ticket),
        }
    }

    fn select(&self, mut state: SelectionState, target: VariantId) -> Step {
        if target == state.current || state.is_transitioning() {
            return Step::unchanged(state);
        }
        let Some(variant) = self.catalog.get(&target) else {
            return Step::unchanged(state);
        };

        let mut effects = Vec::with_capacity(2);
        if let Some(previous) = state.transition.take() {
            effects.push(Effect::CancelTransition {
                token: previous.token,
            });
        }

        let token = state.issue_token();
        state.transition = Some(PendingTransition {
            from: state.current.clone(),
            to: variant.id.clone(),
            token,
        });
        state.has_error = false;
        effects.push(Effect::ScheduleTransition {
            token,
            delay: self.transition_delay,
        });

        Step { state, effects }
    }

    fn commit(&self, mut state: SelectionState, token: TransitionToken) -> Step {
        let Some(pending) = state.transition.as_ref().filter(|p| p.token == token) else {
            return Step::unchanged(state);
        };
        let Some(variant) = self.catalog.get(&pending.to) else {
            return Step::unchanged(state);
        };

        state.transition = None;
        state.current = variant.id.clone();
        state.is_loading = true;
        state.has_error = false;
        let ticket = state.issue_ticket(variant.id.clone());
        state.load_ticket = ticket.clone();

        Step {
            state,
            effects: vec![Effect::RequestImage {
                ticket,
                image: variant.image.clone(),
            }],
        }
    }
}

fn accepts(state: &SelectionState, ticket: &LoadTicket) -> bool {
    *ticket == state.load_ticket && !state.is_transitioning()
}

fn image_loaded(mut state: SelectionState, ticket: &LoadTicket) -> Step {
    if !accepts(&state, ticket) {
        return Step::unchanged(state);
    }
    state.is_loading = false;
    state.has_error = false;
    Step::unchanged(state)
}

fn image_failed(mut state: SelectionState, ticket: &LoadTicket) -> Step {
    if !accepts(&state, ticket) {
        return Step::unchanged(state);
    }
    state.is_loading = false;
    state.has_error = true;
    Step::unchanged(state)
}
