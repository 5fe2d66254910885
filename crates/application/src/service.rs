use std::collections::VecDeque;
use std::sync::Arc;

use livery_domain::{
    Catalog, ConfiguratorEvent, Effect, ImageRef, LoadTicket, RenderPlan, SelectionState, Step,
    TransitionToken, VariantMachine,
};
use tracing::{debug, info, warn};

use crate::{
    ApplicationError, AssetCheck, AssetDecoder, AssetPipeline, CheckAssetsCommand, Clock,
    DecodedAsset, LoadRequest, MountCommand, PipelineStats, RenderPlanQuery,
    SelectVariantCommand, TickCommand, TickReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTransition {
    token: TransitionToken,
    deadline_ms: u64,
}

/// Owns the selection state and executes the effects the reducer asks for.
pub struct ConfiguratorService {
    machine: VariantMachine,
    state: SelectionState,
    pending_mount: Vec<Effect>,
    decoder: Arc<dyn AssetDecoder>,
    pipeline: Box<dyn AssetPipeline>,
    clock: Box<dyn Clock>,
    timer: Option<ScheduledTransition>,
    displayed: Option<Arc<DecodedAsset>>,
    fallback: Option<Arc<DecodedAsset>>,
}

impl ConfiguratorService {
    pub fn new(
        machine: VariantMachine,
        decoder: Arc<dyn AssetDecoder>,
        pipeline: Box<dyn AssetPipeline>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let Step { state, effects } = machine.mount();
        Self {
            machine,
            state,
            pending_mount: effects,
            decoder,
            pipeline,
            clock,
            timer: None,
            displayed: None,
            fallback: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.machine.catalog()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Requests the first image and prefetches the rest. Only the first call
    /// has any effect.
    pub fn mount(&mut self, _command: MountCommand) {
        if self.pending_mount.is_empty() {
            return;
        }
        info!(
            variants = self.catalog().len(),
            current = %self.state.current(),
            "mounting configurator"
        );
        let effects = std::mem::take(&mut self.pending_mount);
        self.run(effects);
    }

    /// Returns whether a transition was started. Selections of the current
    /// variant, unknown variants, or during a transition are dropped.
    pub fn select_variant(&mut self, command: SelectVariantCommand) -> bool {
        let before = self.state.pending_token();
        self.dispatch(ConfiguratorEvent::SelectVariant(command.variant.clone()));
        let started = self.state.pending_token() != before;
        if started {
            debug!(
                variant = %command.variant,
                delay_ms = self.machine.transition_delay().as_millis() as u64,
                "transition started"
            );
        } else {
            debug!(variant = %command.variant, "selection dropped");
        }
        started
    }

    pub fn report_image_loaded(&mut self, ticket: LoadTicket) {
        self.dispatch(ConfiguratorEvent::ImageLoaded(ticket));
    }

    pub fn report_image_failed(&mut self, ticket: LoadTicket) {
        self.dispatch(ConfiguratorEvent::ImageFailed(ticket));
    }

    /// Fires an elapsed transition timer and drains finished loads.
    pub fn tick(&mut self, _command: TickCommand) -> Result<TickReport, ApplicationError> {
        let mut report = TickReport::default();

        if let Some(scheduled) = self.timer {
            if self.clock.now_millis() >= scheduled.deadline_ms {
                self.timer = None;
                self.dispatch(ConfiguratorEvent::TransitionElapsed(scheduled.token));
                report.transition_committed = true;
            }
        }

        while let Some(outcome) = self.pipeline.try_receive()? {
            if outcome.ticket != *self.state.load_ticket() || self.state.is_transitioning() {
                debug!(
                    variant = %outcome.ticket.variant,
                    sequence = outcome.ticket.sequence,
                    transitioning = self.state.is_transitioning(),
                    "discarding stale load outcome"
                );
                report.stale += 1;
                continue;
            }

            match outcome.result {
                Ok(asset) => {
                    self.displayed = Some(asset);
                    self.report_image_loaded(outcome.ticket);
                    report.loaded += 1;
                }
                Err(error) => {
                    warn!(variant = %outcome.ticket.variant, %error, "image failed to load");
                    self.report_image_failed(outcome.ticket);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    pub fn render_plan(&self, _query: RenderPlanQuery) -> RenderPlan {
        RenderPlan::derive(self.catalog(), &self.state)
    }

    /// Pixels to draw for `plan`, if they are available yet.
    pub fn asset_for(&mut self, plan: &RenderPlan) -> Option<Arc<DecodedAsset>> {
        if plan.image.is_fallback() {
            return self.fallback_asset();
        }
        self.displayed
            .as_ref()
            .filter(|asset| &asset.image == plan.image.image_ref())
            .cloned()
    }

    pub fn fallback_asset(&mut self) -> Option<Arc<DecodedAsset>> {
        if self.fallback.is_none() {
            match self.decoder.decode(&ImageRef::fallback()) {
                Ok(asset) => self.fallback = Some(Arc::new(asset)),
                Err(error) => warn!(%error, "fallback image unavailable"),
            }
        }
        self.fallback.clone()
    }

    /// Milliseconds until the pending transition commits.
    pub fn transition_remaining_ms(&self) -> Option<u64> {
        self.timer.map(|scheduled| {
            scheduled
                .deadline_ms
                .saturating_sub(self.clock.now_millis())
        })
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_transitioning() || self.state.is_loading()
    }

    pub fn pipeline_stats(&self) -> Result<PipelineStats, ApplicationError> {
        self.pipeline.stats()
    }

    /// Decodes every variant image synchronously.
    pub fn check_assets(&self, _command: CheckAssetsCommand) -> Vec<AssetCheck> {
        self.catalog()
            .variants()
            .iter()
            .map(|variant| AssetCheck {
                variant: variant.id.clone(),
                image: variant.image.clone(),
                result: self
                    .decoder
                    .decode(&variant.image)
                    .map(|asset| (asset.width, asset.height))
                    .map_err(|error| error.to_string()),
            })
            .collect()
    }

    fn dispatch(&mut self, event: ConfiguratorEvent) {
        let step = self.machine.reduce(self.state.clone(), event);
        self.state = step.state;
        self.run(step.effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Prefetch { images } => {
                    if let Err(error) = self.pipeline.prefetch(images) {
                        warn!(%error, "prefetch skipped");
                    }
                }
                Effect::RequestImage { ticket, image } => {
                    let request = LoadRequest {
                        ticket: ticket.clone(),
                        image,
                    };
                    if let Err(error) = self.pipeline.submit(request) {
                        warn!(variant = %ticket.variant, %error, "image request rejected");
                        let step = self
                            .machine
                            .reduce(self.state.clone(), ConfiguratorEvent::ImageFailed(ticket));
                        self.state = step.state;
                        queue.extend(step.effects);
                    }
                }
                Effect::ScheduleTransition { token, delay } => {
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    self.timer = Some(ScheduledTransition {
                        token,
                        deadline_ms: self.clock.now_millis().saturating_add(delay_ms),
                    });
                }
                Effect::CancelTransition { token } => {
                    if self.timer.is_some_and(|scheduled| scheduled.token == token) {
                        self.timer = None;
                    }
                }
            }
        }
    }
}
