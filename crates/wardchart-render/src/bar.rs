use crate::config::RenderConfig;
use crate::legend::{LegendEntry, grow_for_legend, pack_legend};
use crate::model::{AxisTick, BarColumnLayout, BarLayout, BarSegmentLayout, LayoutLabel};
use crate::text::TextMeasurer;
use crate::{Error, Result, title_label};
use wardchart_core::{BarMode, BarSeries, NumeralFormatter};

const TOTAL_LABEL_GAP: f64 = 4.0;
const LEGEND_GAP: f64 = 6.0;

/// Tick `i` of `steps` sits at `i / steps * max_value`.
pub fn scale_ticks(
    max_value: f64,
    steps: usize,
    zero_y: f64,
    drawable_height: f64,
    numerals: NumeralFormatter,
) -> Vec<AxisTick> {
    let steps = steps.max(1);
    let decimals = if max_value / steps as f64 >= 10.0 { 0 } else { 1 };
    (0..=steps)
        .map(|i| {
            let value = max_value * i as f64 / steps as f64;
            AxisTick {
                value,
                label: numerals.format_decimal(value, decimals),
                position: zero_y - value / max_value * drawable_height,
            }
        })
        .collect()
}

/// Lays out a stacked or grouped bar chart with one equal-width column per non-empty group,
/// in numeric group order.
///
/// Returns `Ok(None)` when every group total is zero.
pub fn layout_bar(
    series: &BarSeries,
    title: Option<&str>,
    config: &RenderConfig,
    measurer: &dyn TextMeasurer,
) -> Result<Option<BarLayout>> {
    let groups = series.active_groups();
    if groups.is_empty() {
        return Ok(None);
    }
    let bar = &config.bar;
    let numerals = config.numerals;
    let mut colors = config.color_assigner();
    let mode = series.mode();

    let categories = series.active_categories();
    let fills: Vec<String> = categories.iter().map(|c| colors.color_for(c)).collect();

    let max_value = match mode {
        BarMode::Stacked => series.max_group_total(),
        BarMode::Grouped => series.max_value(),
    };

    let plot_left = bar.margin_left;
    let plot_right = bar.width - bar.margin_right;
    let plot_top = bar.margin_top + config.title_height(title);
    // One legend row is part of the base canvas; extra rows grow it afterwards.
    let plot_bottom = bar.height
        - bar.margin_bottom
        - bar.legend.row_height
        - LEGEND_GAP
        - bar.axis_label_height;
    let zero_y = plot_bottom - bar.baseline_offset;
    let drawable_height = zero_y - plot_top;
    if plot_right <= plot_left || drawable_height <= 0.0 {
        return Err(Error::InvalidConfig {
            message: format!(
                "bar canvas {}x{} leaves no drawable area",
                bar.width, bar.height
            ),
        });
    }

    let ticks = scale_ticks(max_value, bar.scale_steps, zero_y, drawable_height, numerals);
    let scale = |v: f64| v / max_value * drawable_height;

    let column_width = (plot_right - plot_left) / groups.len() as f64;
    let bar_width = column_width * (1.0 - bar.column_padding);
    let label_y = plot_bottom + bar.axis_label_height / 2.0;

    let mut columns = Vec::with_capacity(groups.len());
    for (i, group) in groups.iter().enumerate() {
        let x = plot_left + i as f64 * column_width;
        let bar_x = x + (column_width - bar_width) / 2.0;
        let center_x = bar_x + bar_width / 2.0;
        let total = series.group_total(group);

        let mut segments = Vec::new();
        let mut top_y = zero_y;
        match mode {
            BarMode::Stacked => {
                let mut cursor = zero_y;
                for (cat, fill) in categories.iter().zip(&fills) {
                    let value = series.value(group, cat);
                    if value <= 0.0 {
                        continue;
                    }
                    let height = scale(value);
                    let y = cursor - height;
                    segments.push(BarSegmentLayout {
                        category: cat.to_string(),
                        value,
                        x: bar_x,
                        y,
                        width: bar_width,
                        height,
                        fill: fill.clone(),
                        value_label: (height > bar.segment_label_min_height).then(|| {
                            LayoutLabel::new(
                                center_x,
                                y + height / 2.0,
                                numerals.format_value(value),
                            )
                        }),
                    });
                    cursor = y;
                }
                top_y = cursor;
            }
            BarMode::Grouped => {
                let slot = bar_width / categories.len().max(1) as f64;
                for (j, (cat, fill)) in categories.iter().zip(&fills).enumerate() {
                    let value = series.value(group, cat);
                    if value <= 0.0 {
                        continue;
                    }
                    let height = scale(value);
                    let y = zero_y - height;
                    let x = bar_x + j as f64 * slot;
                    segments.push(BarSegmentLayout {
                        category: cat.to_string(),
                        value,
                        x,
                        y,
                        width: slot,
                        height,
                        fill: fill.clone(),
                        value_label: (height > bar.segment_label_min_height).then(|| {
                            LayoutLabel::new(
                                x + slot / 2.0,
                                y + height / 2.0,
                                numerals.format_value(value),
                            )
                        }),
                    });
                    top_y = top_y.min(y);
                }
            }
        }

        let total_label = (bar.show_totals && mode == BarMode::Stacked).then(|| {
            LayoutLabel::new(center_x, top_y - TOTAL_LABEL_GAP, numerals.format_value(total))
        });
        let group_label = LayoutLabel::new(
            x + column_width / 2.0,
            label_y,
            format!("{}{}", bar.group_label_prefix, numerals.localize_digits(group)),
        );

        columns.push(BarColumnLayout {
            group: group.to_string(),
            total,
            x,
            width: column_width,
            bar_x,
            bar_width,
            group_label,
            total_label,
            segments,
        });
    }

    let entries: Vec<LegendEntry> = categories
        .iter()
        .zip(&fills)
        .map(|(cat, fill)| LegendEntry {
            key: cat.to_string(),
            label: series.category_label(cat).to_string(),
            fill: fill.clone(),
        })
        .collect();
    let legend_top = plot_bottom + bar.axis_label_height + LEGEND_GAP;
    let legend = pack_legend(&entries, bar.width, legend_top, &bar.legend, measurer);
    let height = grow_for_legend(bar.height, &legend, &bar.legend);

    tracing::debug!(
        columns = columns.len(),
        categories = categories.len(),
        max_value,
        legend_rows = legend.rows,
        height,
        "bar layout"
    );

    Ok(Some(BarLayout {
        width: bar.width,
        height,
        mode,
        plot_left,
        plot_right,
        plot_top,
        plot_bottom,
        zero_y,
        drawable_height,
        max_value,
        title: title_label(title, bar.width, config),
        ticks,
        columns,
        legend,
    }))
}
