use crate::config::RenderConfig;
use crate::legend::{LegendEntry, grow_for_legend, pack_legend};
use crate::model::{LayoutLabel, PyramidBarLayout, PyramidLayout, PyramidRowLayout, PyramidTick};
use crate::text::TextMeasurer;
use crate::{Error, Result, title_label};
use wardchart_core::PyramidSeries;

const VALUE_LABEL_GAP: f64 = 3.0;
const LEGEND_GAP: f64 = 6.0;

/// Lays out a population pyramid: one row per bracket of the series domain (oldest on top),
/// left values growing leftward and right values rightward from a shared center column.
///
/// `scale_factor = (half_width - margin) / max_value`, where `half_width` excludes the center
/// column. Brackets without data keep their row but draw no bars. Returns `Ok(None)` when
/// every value is zero.
pub fn layout_pyramid(
    series: &PyramidSeries,
    title: Option<&str>,
    config: &RenderConfig,
    measurer: &dyn TextMeasurer,
) -> Result<Option<PyramidLayout>> {
    let max_value = series.max_value();
    if !(max_value.is_finite() && max_value > 0.0) {
        return Ok(None);
    }
    let pyr = &config.pyramid;
    let numerals = config.numerals;
    let mut colors = config.color_assigner();
    let left_fill = colors.color_for(series.left_label());
    let right_fill = colors.color_for(series.right_label());

    let center_x = pyr.width / 2.0;
    let half_width = (pyr.width - pyr.center_gap) / 2.0;
    let left_origin = center_x - pyr.center_gap / 2.0;
    let right_origin = center_x + pyr.center_gap / 2.0;
    let scale_factor = (half_width - pyr.margin) / max_value;

    let plot_top = pyr.margin_top + config.title_height(title);
    let plot_bottom = pyr.height
        - pyr.margin_bottom
        - pyr.legend.row_height
        - LEGEND_GAP
        - pyr.tick_label_height;
    let chart_height = plot_bottom - plot_top;
    if chart_height <= 0.0 || scale_factor <= 0.0 {
        return Err(Error::InvalidConfig {
            message: format!(
                "pyramid canvas {}x{} leaves no drawable area",
                pyr.width, pyr.height
            ),
        });
    }

    let brackets = series.brackets();
    let row_height = chart_height / brackets.len() as f64;
    let bar_height = row_height * pyr.bar_fill_ratio.clamp(0.05, 1.0);

    let rows = brackets
        .iter()
        .enumerate()
        .map(|(i, bracket)| {
            let y = plot_top + i as f64 * row_height;
            let bar_y = y + (row_height - bar_height) / 2.0;
            let mid_y = y + row_height / 2.0;
            let row = series.row(bracket).unwrap_or_default();

            let left = (row.left > 0.0).then(|| {
                let width = row.left * scale_factor;
                let x = left_origin - width;
                PyramidBarLayout {
                    value: row.left,
                    x,
                    width,
                    fill: left_fill.clone(),
                    value_label: pyr.show_values.then(|| {
                        LayoutLabel::new(
                            x - VALUE_LABEL_GAP,
                            mid_y,
                            numerals.format_value(row.left),
                        )
                    }),
                }
            });
            let right = (row.right > 0.0).then(|| {
                let width = row.right * scale_factor;
                PyramidBarLayout {
                    value: row.right,
                    x: right_origin,
                    width,
                    fill: right_fill.clone(),
                    value_label: pyr.show_values.then(|| {
                        LayoutLabel::new(
                            right_origin + width + VALUE_LABEL_GAP,
                            mid_y,
                            numerals.format_value(row.right),
                        )
                    }),
                }
            });

            PyramidRowLayout {
                bracket: bracket.clone(),
                y,
                height: row_height,
                bar_y,
                bar_height,
                label: LayoutLabel::new(center_x, mid_y, numerals.localize_digits(bracket)),
                left,
                right,
            }
        })
        .collect::<Vec<_>>();

    let steps = pyr.scale_steps.max(1);
    let decimals = if max_value / steps as f64 >= 10.0 { 0 } else { 1 };
    // Both sides carry the same magnitude; the left side is not negated.
    let ticks = (0..=steps)
        .map(|i| {
            let value = max_value * i as f64 / steps as f64;
            let dx = value * scale_factor;
            PyramidTick {
                value,
                label: numerals.format_decimal(value, decimals),
                left_x: left_origin - dx,
                right_x: right_origin + dx,
            }
        })
        .collect();

    let entries = [
        LegendEntry {
            key: "left".to_string(),
            label: series.left_label().to_string(),
            fill: left_fill,
        },
        LegendEntry {
            key: "right".to_string(),
            label: series.right_label().to_string(),
            fill: right_fill,
        },
    ];
    let legend_top = plot_bottom + pyr.tick_label_height + LEGEND_GAP;
    let legend = pack_legend(&entries, pyr.width, legend_top, &pyr.legend, measurer);
    let height = grow_for_legend(pyr.height, &legend, &pyr.legend);

    tracing::debug!(
        rows = rows.len(),
        max_value,
        scale_factor,
        "pyramid layout"
    );

    Ok(Some(PyramidLayout {
        width: pyr.width,
        height,
        center_x,
        left_origin,
        right_origin,
        plot_top,
        plot_bottom,
        row_height,
        scale_factor,
        max_value,
        title: title_label(title, pyr.width, config),
        rows,
        ticks,
        legend,
    }))
}
