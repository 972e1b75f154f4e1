//! Legend placement: a vertical list next to pies, and centered multi-row packing under bar
//! and pyramid charts.

use crate::config::LegendConfig;
use crate::model::{LegendItemLayout, LegendLayout};
use crate::text::{TextMeasurer, TextStyle};

#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub key: String,
    pub label: String,
    pub fill: String,
}

/// Packs entries into rows of at most `items_per_row`, each row centered on its own within
/// `canvas_width`, starting at `top`.
pub fn pack_legend(
    entries: &[LegendEntry],
    canvas_width: f64,
    top: f64,
    config: &LegendConfig,
    measurer: &dyn TextMeasurer,
) -> LegendLayout {
    let per_row = config.items_per_row.max(1);
    let style = TextStyle::sized(config.font_size);
    let mut items = Vec::with_capacity(entries.len());

    for (row, chunk) in entries.chunks(per_row).enumerate() {
        let widths: Vec<f64> = chunk
            .iter()
            .map(|e| {
                config.swatch_size + config.swatch_gap + measurer.measure(&e.label, &style).width
            })
            .collect();
        let row_width =
            widths.iter().sum::<f64>() + config.item_gap * (chunk.len().saturating_sub(1)) as f64;
        let row_top = top + row as f64 * config.row_height;
        let mut x = ((canvas_width - row_width) / 2.0).max(0.0);

        for (entry, width) in chunk.iter().zip(widths) {
            items.push(LegendItemLayout {
                key: entry.key.clone(),
                label: entry.label.clone(),
                fill: entry.fill.clone(),
                swatch_x: x,
                swatch_y: row_top + (config.row_height - config.swatch_size) / 2.0,
                swatch_size: config.swatch_size,
                text_x: x + config.swatch_size + config.swatch_gap,
                text_y: row_top + config.row_height / 2.0,
                width,
                row,
            });
            x += width + config.item_gap;
        }
    }

    let rows = legend_row_count(entries.len(), per_row);
    LegendLayout {
        rows,
        top,
        height: rows as f64 * config.row_height,
        items,
    }
}

pub fn legend_row_count(item_count: usize, items_per_row: usize) -> usize {
    item_count.div_ceil(items_per_row.max(1))
}

/// Post-layout growth: the base canvas reserves one legend row; every extra row adds
/// `row_height` so the legend never overlaps the axis labels.
pub fn grow_for_legend(base_height: f64, legend: &LegendLayout, config: &LegendConfig) -> f64 {
    base_height + legend.rows.saturating_sub(1) as f64 * config.row_height
}

/// Stacks entries vertically starting at `(x, top)`, one per `step`. Returns the items and
/// the widest item width.
pub fn stack_legend(
    entries: &[LegendEntry],
    x: f64,
    top: f64,
    step: f64,
    swatch_size: f64,
    font_size: f64,
    measurer: &dyn TextMeasurer,
) -> (Vec<LegendItemLayout>, f64) {
    let style = TextStyle::sized(font_size);
    let swatch_gap = swatch_size / 2.0;
    let mut max_width: f64 = 0.0;
    let items = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let row_top = top + i as f64 * step;
            let width = swatch_size + swatch_gap + measurer.measure(&e.label, &style).width;
            max_width = max_width.max(width);
            LegendItemLayout {
                key: e.key.clone(),
                label: e.label.clone(),
                fill: e.fill.clone(),
                swatch_x: x,
                swatch_y: row_top + (step - swatch_size) / 2.0,
                swatch_size,
                text_x: x + swatch_size + swatch_gap,
                text_y: row_top + step / 2.0,
                width,
                row: i,
            }
        })
        .collect();
    (items, max_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;

    fn entries(n: usize) -> Vec<LegendEntry> {
        (0..n)
            .map(|i| LegendEntry {
                key: format!("k{i}"),
                label: "abcd".to_string(),
                fill: "#000".to_string(),
            })
            .collect()
    }

    #[test]
    fn rows_hold_at_most_items_per_row() {
        let config = LegendConfig::default();
        let measurer = DeterministicTextMeasurer::default();
        let legend = pack_legend(&entries(9), 800.0, 100.0, &config, &measurer);
        assert_eq!(legend.rows, 3);
        assert_eq!(legend.height, 3.0 * config.row_height);
        let per_row: Vec<usize> = (0..3)
            .map(|r| legend.items.iter().filter(|i| i.row == r).count())
            .collect();
        assert_eq!(per_row, vec![4, 4, 1]);
    }

    #[test]
    fn each_row_is_centered_independently() {
        let config = LegendConfig::default();
        let measurer = DeterministicTextMeasurer::default();
        let legend = pack_legend(&entries(5), 800.0, 0.0, &config, &measurer);

        for row in 0..legend.rows {
            let items: Vec<_> = legend.items.iter().filter(|i| i.row == row).collect();
            let left = items.first().unwrap().swatch_x;
            let last = items.last().unwrap();
            let right = last.swatch_x + last.width;
            assert!(((left + right) / 2.0 - 400.0).abs() < 1e-9, "row {row} not centered");
        }
        let lone = legend.items.iter().find(|i| i.row == 1).unwrap();
        assert!(lone.swatch_x > legend.items[0].swatch_x);
    }

    #[test]
    fn canvas_grows_per_extra_row() {
        let config = LegendConfig::default();
        let measurer = DeterministicTextMeasurer::default();
        let one = pack_legend(&entries(4), 800.0, 0.0, &config, &measurer);
        let three = pack_legend(&entries(9), 800.0, 0.0, &config, &measurer);
        assert_eq!(grow_for_legend(400.0, &one, &config), 400.0);
        assert_eq!(
            grow_for_legend(400.0, &three, &config),
            400.0 + 2.0 * config.row_height
        );
    }

    #[test]
    fn empty_legend_has_no_rows() {
        assert_eq!(legend_row_count(0, 4), 0);
        assert_eq!(legend_row_count(4, 4), 1);
        assert_eq!(legend_row_count(5, 4), 2);
    }
}
