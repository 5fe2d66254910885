use std::time::Duration;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, TextureHandle};
use livery_adapters::{present_pipeline_stats, present_plan};
use livery_application::{
    ConfiguratorService, DecodedAsset, MountCommand, RenderPlanQuery, SelectVariantCommand,
    TickCommand,
};
use livery_domain::{AccentColor, ImageRef, RenderPlan, VariantId};
use tracing::{debug, error};

const PAGE_BACKGROUND: Color32 = Color32::from_rgb(0xf8, 0xf9, 0xfa);
const CARD_BACKGROUND: Color32 = Color32::WHITE;
const CARD_BORDER: Color32 = Color32::from_rgb(0xe3, 0xe6, 0xea);
const STAGE_BACKGROUND: Color32 = Color32::from_rgb(0xe9, 0xeb, 0xed);
const TITLE_COLOR: Color32 = Color32::from_rgb(0x21, 0x25, 0x29);
const LOADING_COLOR: Color32 = Color32::from_rgb(0x0d, 0x6e, 0xfd);
const DANGER_COLOR: Color32 = Color32::from_rgb(0xdc, 0x35, 0x45);
const MAX_STAGE_WIDTH: f32 = 760.0;
const STAGE_ROUNDING: f32 = 16.0;
const SWATCH_SIZE: f32 = 56.0;
const SWATCH_GAP: f32 = 16.0;
const FADE_SECONDS: f32 = 0.4;
const TITLE_FADE_SECONDS: f64 = 0.5;
const TITLE_RISE: f32 = 5.0;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

struct ConfiguratorApp {
    service: ConfiguratorService,
    texture: Option<(ImageRef, TextureHandle)>,
    title_shown: Option<(VariantId, f64)>,
}

impl ConfiguratorApp {
    fn new(mut service: ConfiguratorService) -> Self {
        service.mount(MountCommand);
        Self {
            service,
            texture: None,
            title_shown: None,
        }
    }

    /// Fade-in progress of the title, restarted whenever the variant changes.
    fn title_progress(&mut self, now: f64) -> f32 {
        let current = self.service.state().current();
        if !matches!(&self.title_shown, Some((variant, _)) if variant == current) {
            self.title_shown = Some((current.clone(), now));
        }
        let since = self.title_shown.as_ref().map_or(now, |(_, since)| *since);
        let linear = ((now - since) / TITLE_FADE_SECONDS).clamp(0.0, 1.0) as f32;
        1.0 - (1.0 - linear).powi(2)
    }

    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        asset: Option<&DecodedAsset>,
    ) -> Option<TextureHandle> {
        let asset = asset?;
        if let Some((image, handle)) = &self.texture {
            if image == &asset.image {
                return Some(handle.clone());
            }
        }

        let pixels = egui::ColorImage::from_rgba_unmultiplied(
            [asset.width as usize, asset.height as usize],
            &asset.rgba,
        );
        let handle = ctx.load_texture(asset.image.as_str(), pixels, egui::TextureOptions::LINEAR);
        self.texture = Some((asset.image.clone(), handle.clone()));
        Some(handle)
    }
}

impl eframe::App for ConfiguratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.service.tick(TickCommand) {
            Ok(report) if report.changed() => {
                debug!(plan = %present_plan(&self.service.render_plan(RenderPlanQuery)), "state changed");
                match self.service.pipeline_stats() {
                    Ok(stats) => debug!(stats = %present_pipeline_stats(&stats), "asset pipeline"),
                    Err(error) => error!(%error, "asset pipeline stats unavailable"),
                }
            }
            Ok(_) => {}
            Err(error) => error!(%error, "asset pipeline unavailable"),
        }

        let plan = self.service.render_plan(RenderPlanQuery);
        let asset = self.service.asset_for(&plan);
        let texture = self.texture_for(ctx, asset.as_deref());
        let title_progress = self.title_progress(ctx.input(|input| input.time));
        let title_offset = TITLE_RISE * (1.0 - title_progress);
        let opacity =
            ctx.animate_value_with_time(egui::Id::new("stage-opacity"), plan.image_opacity(), FADE_SECONDS);
        let scale =
            ctx.animate_value_with_time(egui::Id::new("stage-scale"), plan.image_scale(), FADE_SECONDS);

        let mut clicked = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(PAGE_BACKGROUND).inner_margin(24.0))
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(CARD_BACKGROUND)
                    .stroke(Stroke::new(1.0, CARD_BORDER))
                    .corner_radius(STAGE_ROUNDING)
                    .inner_margin(32.0)
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            draw_stage(ui, &plan, texture.as_ref(), opacity, scale);
                            ui.add_space(28.0 + title_offset);
                            ui.label(
                                egui::RichText::new(&plan.title)
                                    .size(26.0)
                                    .color(TITLE_COLOR.gamma_multiply(title_progress)),
                            );
                            ui.add_space(20.0 + TITLE_RISE - title_offset);
                            clicked = draw_swatches(ui, &plan);
                        });
                    });
            });

        if let Some(variant) = clicked {
            self.service.select_variant(SelectVariantCommand { variant });
        }

        let animating = (opacity - plan.image_opacity()).abs() > f32::EPSILON;
        if self.service.is_busy() || animating || title_progress < 1.0 {
            let wait = self
                .service
                .transition_remaining_ms()
                .map(Duration::from_millis)
                .map_or(FRAME_INTERVAL, |remaining| remaining.min(FRAME_INTERVAL));
            ctx.request_repaint_after(wait);
        }
    }
}

fn accent(color: AccentColor) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

fn draw_stage(
    ui: &mut egui::Ui,
    plan: &RenderPlan,
    texture: Option<&TextureHandle>,
    opacity: f32,
    scale: f32,
) {
    let width = ui.available_width().min(MAX_STAGE_WIDTH);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, width * 9.0 / 16.0), Sense::hover());

    let glow_alpha = (0.18 * plan.highlight.intensity).min(1.0);
    let glow = accent(plan.highlight.color).gamma_multiply(glow_alpha);
    ui.painter()
        .rect_filled(rect.expand(4.0 * plan.highlight.intensity), STAGE_ROUNDING + 4.0, glow);

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, STAGE_ROUNDING, STAGE_BACKGROUND);

    if let Some(texture) = texture {
        let size = texture.size_vec2();
        let fit = (rect.width() / size.x).min(rect.height() / size.y) * scale;
        let image_rect = Rect::from_center_size(rect.center(), size * fit);
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let tint = Color32::from_white_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
        painter.image(texture.id(), image_rect, uv, tint);
    }

    if plan.show_loading {
        let card = Rect::from_center_size(rect.center(), egui::vec2(150.0, 110.0));
        painter.rect_filled(card, 10.0, Color32::from_white_alpha(190));
        let spinner = Rect::from_center_size(card.center() - egui::vec2(0.0, 14.0), egui::vec2(32.0, 32.0));
        egui::Spinner::new()
            .size(32.0)
            .color(LOADING_COLOR)
            .paint_at(ui, spinner);
        painter.text(
            card.center() + egui::vec2(0.0, 28.0),
            Align2::CENTER_CENTER,
            "CARGANDO",
            FontId::proportional(13.0),
            LOADING_COLOR,
        );
    }

    if plan.show_error {
        let card = Rect::from_center_size(rect.center(), egui::vec2(320.0, 130.0));
        painter.rect_filled(card, 10.0, Color32::WHITE);
        painter.rect_stroke(card, 10.0, Stroke::new(1.5, DANGER_COLOR), egui::StrokeKind::Inside);
        painter.text(
            card.center() - egui::vec2(0.0, 32.0),
            Align2::CENTER_CENTER,
            "⚠",
            FontId::proportional(30.0),
            DANGER_COLOR,
        );
        painter.text(
            card.center() + egui::vec2(0.0, 8.0),
            Align2::CENTER_CENTER,
            "Imagen no disponible",
            FontId::proportional(17.0),
            DANGER_COLOR,
        );
        painter.text(
            card.center() + egui::vec2(0.0, 34.0),
            Align2::CENTER_CENTER,
            "Usando imagen de marcador de posición.",
            FontId::proportional(13.0),
            DANGER_COLOR,
        );
    }
}

fn draw_swatches(ui: &mut egui::Ui, plan: &RenderPlan) -> Option<VariantId> {
    let mut clicked = None;
    let count = plan.swatches.len() as f32;
    let row_width = count * SWATCH_SIZE + (count - 1.0).max(0.0) * SWATCH_GAP;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = SWATCH_GAP;
        ui.add_space(((ui.available_width() - row_width) / 2.0).max(0.0));

        for swatch in &plan.swatches {
            let sense = if swatch.enabled {
                Sense::click()
            } else {
                Sense::hover()
            };
            let (rect, response) =
                ui.allocate_exact_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE), sense);
            let hovered = swatch.enabled && response.hovered();
            let grow = if swatch.selected || hovered { 1.1 } else { 1.0 };
            let radius = SWATCH_SIZE / 2.0 * grow;
            let center = rect.center();
            let fill = accent(swatch.accent);
            let painter = ui.painter();

            if hovered {
                painter.circle_filled(center + egui::vec2(0.0, 3.0), radius + 2.0, Color32::from_black_alpha(40));
            }
            if swatch.selected {
                painter.circle_stroke(center, radius + 9.0, Stroke::new(6.0, Color32::from_black_alpha(25)));
                painter.circle_stroke(center, radius + 3.0, Stroke::new(4.0, fill));
            }
            painter.circle_filled(center, radius, fill);
            painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::from_black_alpha(30)));

            if swatch.selected {
                let ink = if swatch.accent.is_light() {
                    TITLE_COLOR
                } else {
                    Color32::WHITE
                };
                painter.text(center, Align2::CENTER_CENTER, "✔", FontId::proportional(24.0), ink);
            } else if !swatch.enabled {
                painter.circle_filled(center, radius, Color32::from_white_alpha(90));
            }

            if response.on_hover_text(&swatch.name).clicked() {
                clicked = Some(swatch.id.clone());
            }
        }
    });

    clicked
}

pub fn launch_window(service: ConfiguratorService, window_size: [f32; 2]) -> Result<(), String> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(window_size)
            .with_title("livery"),
        ..Default::default()
    };

    eframe::run_native(
        "livery",
        options,
        Box::new(move |_cc| Ok(Box::new(ConfiguratorApp::new(service)))),
    )
    .map_err(|error| format!("failed to start UI: {error}"))
}
