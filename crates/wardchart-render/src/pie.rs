use crate::config::RenderConfig;
use crate::legend::{LegendEntry, stack_legend};
use crate::model::{LayoutLabel, PieLayout, PieSliceLayout, Point};
use crate::text::TextMeasurer;
use crate::title_label;
use wardchart_core::PieSeries;

const START_ANGLE: f64 = -90.0;
const LABEL_RADIUS_RATIO: f64 = 0.75;

fn polar(center: Point, radius: f64, degrees: f64) -> Point {
    let rad = degrees.to_radians();
    Point::new(center.x + radius * rad.cos(), center.y + radius * rad.sin())
}

/// Lays out a pie: slices start at 12 o'clock and run clockwise, each spanning
/// `value / total * 360` degrees. Zero-value categories get neither a slice nor a legend row.
///
/// Returns `None` when the series has no positive value.
pub fn layout_pie(
    series: &PieSeries,
    title: Option<&str>,
    config: &RenderConfig,
    measurer: &dyn TextMeasurer,
) -> Option<PieLayout> {
    let total = series.total();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let pie = &config.pie;
    let numerals = config.numerals;
    let mut colors = config.color_assigner();

    let top = config.title_height(title);
    let radius = pie.radius;
    let center = Point::new(
        pie.margin + radius,
        top + ((pie.height - top) / 2.0).max(radius + pie.margin),
    );

    let positive: Vec<_> = series.positive_entries().collect();
    let single = positive.len() == 1;
    let mut slices = Vec::with_capacity(positive.len());
    let mut cumulative = 0.0;

    for (key, entry) in &positive {
        // Angles come from the running sum, not from adding sweeps, so the last slice closes
        // exactly at 270 degrees.
        let start_angle = START_ANGLE + cumulative / total * 360.0;
        cumulative += entry.value;
        let end_angle = START_ANGLE + cumulative / total * 360.0;
        let sweep_angle = end_angle - start_angle;
        let fraction = entry.value / total;

        let mid = start_angle + sweep_angle / 2.0;
        let percent_label = (sweep_angle >= pie.min_label_sweep).then(|| {
            let at = polar(center, radius * LABEL_RADIUS_RATIO, mid);
            LayoutLabel::new(
                at.x,
                at.y,
                numerals.format_percent(fraction * 100.0, pie.percent_decimals),
            )
        });

        slices.push(PieSliceLayout {
            key: key.to_string(),
            label: entry.label.clone(),
            value: entry.value,
            fraction,
            start_angle,
            sweep_angle,
            start: polar(center, radius, start_angle),
            end: polar(center, radius, end_angle),
            large_arc: sweep_angle > 180.0,
            is_full_circle: single,
            fill: colors.color_for(key),
            percent_label,
        });
    }

    let entries: Vec<LegendEntry> = slices
        .iter()
        .map(|s| LegendEntry {
            key: s.key.clone(),
            label: if pie.show_values {
                format!(
                    "{} ({}, {})",
                    s.label,
                    numerals.format_value(s.value),
                    numerals.format_percent(s.fraction * 100.0, pie.percent_decimals)
                )
            } else {
                s.label.clone()
            },
            fill: s.fill.clone(),
        })
        .collect();

    let legend_x = center.x + radius + pie.legend_gap;
    let legend_height = entries.len() as f64 * pie.legend_step_y;
    let legend_top = (center.y - legend_height / 2.0).max(top);
    let (legend, legend_width) = stack_legend(
        &entries,
        legend_x,
        legend_top,
        pie.legend_step_y,
        pie.legend_swatch,
        pie.font_size,
        measurer,
    );

    let width = pie.width.max(legend_x + legend_width + pie.margin);
    let height = pie
        .height
        .max(center.y + radius + pie.margin)
        .max(legend_top + legend_height + pie.margin);

    tracing::debug!(
        slices = slices.len(),
        total,
        width,
        height,
        "pie layout"
    );

    Some(PieLayout {
        width,
        height,
        center,
        radius,
        total,
        title: title_label(title, width, config),
        slices,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;

    #[test]
    fn single_category_is_a_full_circle() {
        let series = PieSeries::from_entries([("a", "A", 5.0), ("b", "B", 0.0)]).unwrap();
        let layout = layout_pie(
            &series,
            None,
            &RenderConfig::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert_eq!(layout.slices.len(), 1);
        assert!(layout.slices[0].is_full_circle);
        assert_eq!(layout.slices[0].sweep_angle, 360.0);
        assert_eq!(layout.legend.len(), 1);
    }

    #[test]
    fn title_pushes_the_pie_down() {
        let series = PieSeries::from_entries([("a", "A", 1.0), ("b", "B", 1.0)]).unwrap();
        let config = RenderConfig::default();
        let measurer = DeterministicTextMeasurer::default();
        let plain = layout_pie(&series, None, &config, &measurer).unwrap();
        let titled = layout_pie(&series, Some("Religion"), &config, &measurer).unwrap();
        assert!(titled.center.y > plain.center.y);
        assert!(titled.title.is_some());
    }
}
