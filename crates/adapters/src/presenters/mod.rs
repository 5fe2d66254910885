use livery_application::{AssetCheck, PipelineStats};
use livery_domain::{RenderPlan, Variant};

pub fn present_variant_row(variant: &Variant) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        variant.id,
        variant.accent.to_hex(),
        variant.display_name,
        variant.image
    )
}

pub fn present_asset_check(check: &AssetCheck) -> String {
    match &check.result {
        Ok((width, height)) => format!(
            "ok\t{}\t{}x{}\t{}",
            check.variant, width, height, check.image
        ),
        Err(error) => format!("FAILED\t{}\t{}\t{}", check.variant, check.image, error),
    }
}

pub fn present_plan(plan: &RenderPlan) -> String {
    let mut flags = Vec::new();
    if plan.show_loading {
        flags.push("loading");
    }
    if plan.show_error {
        flags.push("error");
    }
    if plan.fading {
        flags.push("fading");
    }
    let selected = plan
        .swatches
        .iter()
        .find(|swatch| swatch.selected)
        .map(|swatch| swatch.id.to_string())
        .unwrap_or_default();

    format!(
        "{} ({}) image={} [{}]",
        plan.title,
        selected,
        plan.image.image_ref(),
        flags.join(",")
    )
}

pub fn present_pipeline_stats(stats: &PipelineStats) -> String {
    format!(
        "submitted={} completed={} failed={} cache_hits={} prefetched={}",
        stats.submitted, stats.completed, stats.failed, stats.cache_hits, stats.prefetched
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use livery_domain::{Catalog, ImageRef, VariantId, VariantMachine};

    fn variant() -> Variant {
        Variant::new("verde", "Verde Luchador", "#a59d28", "/verdeLuchador.png").expect("variant")
    }

    #[test]
    fn variant_row_is_tab_separated() {
        assert_eq!(
            present_variant_row(&variant()),
            "verde\t#a59d28\tVerde Luchador\t/verdeLuchador.png"
        );
    }

    #[test]
    fn asset_check_lines() {
        let ok = AssetCheck {
            variant: VariantId::new("verde").expect("id"),
            image: ImageRef::new("a.png"),
            result: Ok((800, 450)),
        };
        assert_eq!(present_asset_check(&ok), "ok\tverde\t800x450\ta.png");

        let failed = AssetCheck {
            result: Err("not found".to_string()),
            ..ok
        };
        assert_eq!(
            present_asset_check(&failed),
            "FAILED\tverde\ta.png\tnot found"
        );
    }

    #[test]
    fn plan_summary_lists_active_indicators() {
        let machine = VariantMachine::new(Catalog::new(vec![variant()]).expect("catalog"));
        let plan = RenderPlan::derive(machine.catalog(), &machine.mount().state);
        assert_eq!(
            present_plan(&plan),
            "Verde Luchador (verde) image=/verdeLuchador.png [loading]"
        );
    }

    #[test]
    fn pipeline_stats_line() {
        let stats = PipelineStats {
            submitted: 3,
            prefetched: 4,
            cache_hits: 2,
            completed: 2,
            failed: 1,
        };
        assert_eq!(
            present_pipeline_stats(&stats),
            "submitted=3 completed=2 failed=1 cache_hits=2 prefetched=4"
        );
    }
}
