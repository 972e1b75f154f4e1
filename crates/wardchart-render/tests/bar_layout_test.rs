use serde_json::json;
use wardchart_core::{BarMode, BarSeries, ChartSpec};
use wardchart_render::model::{BarLayout, ChartLayout};
use wardchart_render::{RenderOptions, layout_chart};

fn bar_layout_with(spec: ChartSpec, options: &RenderOptions) -> Option<BarLayout> {
    match layout_chart(&spec, None, options).expect("layout ok")? {
        ChartLayout::Bar(layout) => Some(layout),
        other => panic!("expected bar layout, got {:?}", other.chart_type()),
    }
}

fn bar_layout(spec: ChartSpec) -> Option<BarLayout> {
    bar_layout_with(spec, &RenderOptions::default())
}

#[test]
fn columns_follow_numeric_ward_order() {
    let spec = ChartSpec::from_json(&json!({
        "type": "bar",
        "data": {"1": {"X": 10}, "9": {"X": 5}, "10": {"X": 20}}
    }))
    .unwrap();
    let layout = bar_layout(spec).expect("chart");
    let order: Vec<&str> = layout.columns.iter().map(|c| c.group.as_str()).collect();
    assert_eq!(order, vec!["1", "9", "10"]);
    assert!(layout.columns[0].x < layout.columns[1].x);
    assert!(layout.columns[1].x < layout.columns[2].x);
}

#[test]
fn unsorted_input_groups_are_reordered() {
    let mut series = BarSeries::new();
    for g in ["2", "10", "1"] {
        series.insert(g, "X", 1.0).unwrap();
    }
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    let order: Vec<&str> = layout.columns.iter().map(|c| c.group.as_str()).collect();
    assert_eq!(order, vec!["1", "2", "10"]);
}

#[test]
fn stacked_segments_scale_against_the_largest_total() {
    let mut series = BarSeries::new();
    series.insert("1", "a", 30.0).unwrap();
    series.insert("1", "b", 10.0).unwrap();
    series.insert("2", "a", 5.0).unwrap();
    series.insert("2", "b", 15.0).unwrap();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    assert_eq!(layout.max_value, 40.0);

    let col = &layout.columns[0];
    assert_eq!(col.segments.len(), 2);
    let full: f64 = col.segments.iter().map(|s| s.height).sum();
    assert!((full - layout.drawable_height).abs() < 1e-9);

    // Bottom-up in declared category order.
    assert_eq!(col.segments[0].category, "a");
    assert!((col.segments[0].y + col.segments[0].height - layout.zero_y).abs() < 1e-9);
    assert!((col.segments[1].y + col.segments[1].height - col.segments[0].y).abs() < 1e-9);

    let second = &layout.columns[1];
    let h: f64 = second.segments.iter().map(|s| s.height).sum();
    assert!((h - layout.drawable_height / 2.0).abs() < 1e-9);
    assert_eq!(second.segments[0].category, "a");
}

#[test]
fn ticks_and_baseline_offset() {
    let mut series = BarSeries::new();
    series.insert("1", "a", 50.0).unwrap();
    let options = RenderOptions::default();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    assert_eq!(layout.ticks.len(), options.config.bar.scale_steps + 1);
    assert_eq!(layout.ticks[0].position, layout.zero_y);
    assert!((layout.ticks.last().unwrap().position - layout.plot_top).abs() < 1e-9);
    assert!(
        (layout.plot_bottom - layout.zero_y - options.config.bar.baseline_offset).abs() < 1e-9
    );
    let labels: Vec<&str> = layout.ticks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["0", "10", "20", "30", "40", "50"]);
}

#[test]
fn short_segments_have_no_value_label() {
    let mut series = BarSeries::new();
    series.insert("1", "big", 100.0).unwrap();
    series.insert("1", "tiny", 1.0).unwrap();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    let col = &layout.columns[0];
    let big = col.segments.iter().find(|s| s.category == "big").unwrap();
    let tiny = col.segments.iter().find(|s| s.category == "tiny").unwrap();
    assert!(big.value_label.is_some());
    assert!(tiny.height <= 20.0);
    assert!(tiny.value_label.is_none());
    let total = col.total_label.as_ref().expect("total label");
    assert_eq!(total.text, "101");
    assert!(total.y < tiny.y);
}

#[test]
fn empty_groups_get_no_column_and_all_empty_means_no_chart() {
    let mut series = BarSeries::new();
    series.insert("1", "a", 0.0).unwrap();
    series.insert("2", "a", 4.0).unwrap();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    assert_eq!(layout.columns.len(), 1);
    assert_eq!(layout.columns[0].group, "2");

    let mut empty = BarSeries::new();
    empty.insert("1", "a", 0.0).unwrap();
    empty.insert("2", "b", 0.0).unwrap();
    assert!(bar_layout(ChartSpec::Bar(empty)).is_none());
}

#[test]
fn legend_wraps_and_canvas_grows() {
    let mut series = BarSeries::new();
    for (i, cat) in ["a", "b", "c", "d", "e", "f", "g", "h", "i"].iter().enumerate() {
        series.insert("1", *cat, (i + 1) as f64).unwrap();
    }
    let options = RenderOptions::default();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    let legend_cfg = &options.config.bar.legend;
    assert_eq!(layout.legend.rows, 3);
    assert_eq!(layout.legend.items.len(), 9);
    assert_eq!(
        layout.height,
        options.config.bar.height + 2.0 * legend_cfg.row_height
    );
    let last = layout.legend.items.last().unwrap();
    assert!(last.swatch_y + last.swatch_size <= layout.height);
    assert!(layout.legend.top > layout.plot_bottom);

    let mut few = BarSeries::new();
    few.insert("1", "a", 1.0).unwrap();
    let layout = bar_layout(ChartSpec::Bar(few)).expect("chart");
    assert_eq!(layout.legend.rows, 1);
    assert_eq!(layout.height, options.config.bar.height);
}

#[test]
fn items_per_row_is_configurable() {
    let mut series = BarSeries::new();
    for cat in ["a", "b", "c", "d", "e"] {
        series.insert("1", cat, 1.0).unwrap();
    }
    let mut options = RenderOptions::default();
    options.config.bar.legend.items_per_row = 2;
    let layout = bar_layout_with(ChartSpec::Bar(series), &options).expect("chart");
    assert_eq!(layout.legend.rows, 3);
}

#[test]
fn grouped_mode_places_bars_side_by_side() {
    let mut series = BarSeries::new().with_mode(BarMode::Grouped);
    series.insert("1", "a", 10.0).unwrap();
    series.insert("1", "b", 20.0).unwrap();
    series.insert("2", "a", 5.0).unwrap();
    let layout = bar_layout(ChartSpec::Bar(series)).expect("chart");
    assert_eq!(layout.max_value, 20.0);

    let col = &layout.columns[0];
    assert_eq!(col.segments.len(), 2);
    let (a, b) = (&col.segments[0], &col.segments[1]);
    assert!((a.y + a.height - layout.zero_y).abs() < 1e-9);
    assert!((b.y + b.height - layout.zero_y).abs() < 1e-9);
    assert!((a.x + a.width - b.x).abs() < 1e-9);
    assert!((b.height - layout.drawable_height).abs() < 1e-9);
    assert!(col.total_label.is_none());

    // Category slots stay aligned across groups even when a category is missing.
    let second = &layout.columns[1];
    assert_eq!(second.segments.len(), 1);
    assert!((second.segments[0].x - second.bar_x).abs() < 1e-9);
}

#[test]
fn group_labels_use_prefix_and_locale() {
    let mut series = BarSeries::new();
    series.insert("10", "a", 1.0).unwrap();
    let mut options = RenderOptions::default();
    options.config.bar.group_label_prefix = "वडा ".to_string();
    options.config.numerals.locale = wardchart_core::Locale::Ne;
    let layout = bar_layout_with(ChartSpec::Bar(series), &options).expect("chart");
    assert_eq!(layout.columns[0].group_label.text, "वडा १०");
}
