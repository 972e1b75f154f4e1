use wardchart_core::{ChartSpec, DEFAULT_AGE_BRACKETS, PyramidSeries};
use wardchart_render::model::{ChartLayout, PyramidLayout};
use wardchart_render::{RenderOptions, layout_chart};

fn pyramid_layout(series: PyramidSeries, options: &RenderOptions) -> Option<PyramidLayout> {
    match layout_chart(&ChartSpec::Pyramid(series), None, options).expect("layout ok")? {
        ChartLayout::Pyramid(layout) => Some(layout),
        other => panic!("expected pyramid layout, got {:?}", other.chart_type()),
    }
}

#[test]
fn every_bracket_keeps_its_row() {
    let mut series = PyramidSeries::new("Male", "Female");
    series.insert("0-4", 120.0, 110.0).unwrap();
    series.insert("75+", 10.0, 14.0).unwrap();
    let options = RenderOptions::default();
    let layout = pyramid_layout(series, &options).expect("chart");

    assert_eq!(layout.rows.len(), DEFAULT_AGE_BRACKETS.len());
    let brackets: Vec<&str> = layout.rows.iter().map(|r| r.bracket.as_str()).collect();
    assert_eq!(brackets, DEFAULT_AGE_BRACKETS.to_vec());

    // Oldest on top.
    assert_eq!(layout.rows[0].bracket, "75+");
    assert!(layout.rows[0].y < layout.rows[1].y);

    let chart_height = layout.plot_bottom - layout.plot_top;
    assert!((layout.row_height - chart_height / DEFAULT_AGE_BRACKETS.len() as f64).abs() < 1e-9);

    let empty = layout.rows.iter().find(|r| r.bracket == "40-44").unwrap();
    assert!(empty.left.is_none() && empty.right.is_none());
    assert_eq!(empty.label.text, "40-44");
}

#[test]
fn bars_grow_away_from_the_center() {
    let mut series = PyramidSeries::new("Male", "Female");
    series.insert("0-4", 100.0, 50.0).unwrap();
    let options = RenderOptions::default();
    let cfg = &options.config.pyramid;
    let layout = pyramid_layout(series, &options).expect("chart");

    let half = (cfg.width - cfg.center_gap) / 2.0;
    let expected_scale = (half - cfg.margin) / 100.0;
    assert!((layout.scale_factor - expected_scale).abs() < 1e-9);

    let row = layout.rows.iter().find(|r| r.bracket == "0-4").unwrap();
    let left = row.left.as_ref().unwrap();
    let right = row.right.as_ref().unwrap();
    assert!((left.x + left.width - layout.left_origin).abs() < 1e-9);
    assert!((left.width - 100.0 * expected_scale).abs() < 1e-9);
    assert!((right.x - layout.right_origin).abs() < 1e-9);
    assert!((right.width - 50.0 * expected_scale).abs() < 1e-9);
    // The widest bar stops `margin` short of the canvas edge.
    assert!((left.x - cfg.margin).abs() < 1e-9);
}

#[test]
fn ticks_are_symmetric_and_not_negated() {
    let mut series = PyramidSeries::new("M", "F");
    series.insert("20-24", 80.0, 40.0).unwrap();
    let options = RenderOptions::default();
    let layout = pyramid_layout(series, &options).expect("chart");

    assert_eq!(layout.ticks.len(), options.config.pyramid.scale_steps + 1);
    for tick in &layout.ticks {
        let left_dist = layout.left_origin - tick.left_x;
        let right_dist = tick.right_x - layout.right_origin;
        assert!((left_dist - right_dist).abs() < 1e-9);
        assert!(!tick.label.starts_with('-'));
    }
    let labels: Vec<&str> = layout.ticks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["0", "20", "40", "60", "80"]);
}

#[test]
fn custom_domain_with_missing_brackets() {
    let mut series = PyramidSeries::new("M", "F")
        .with_brackets(["60+", "15-59", "0-14"])
        .unwrap();
    series.insert("15-59", 300.0, 320.0).unwrap();
    series.insert("0-14", 0.0, 0.0).unwrap();
    let layout = pyramid_layout(series, &RenderOptions::default()).expect("chart");
    assert_eq!(layout.rows.len(), 3);
    assert!(layout.rows[0].left.is_none());
    assert!(layout.rows[2].left.is_none() && layout.rows[2].right.is_none());
    assert!(layout.rows[1].right.is_some());
}

#[test]
fn all_zero_pyramid_is_no_chart() {
    let mut series = PyramidSeries::new("M", "F");
    series.insert("0-4", 0.0, 0.0).unwrap();
    assert!(pyramid_layout(series, &RenderOptions::default()).is_none());
    assert!(pyramid_layout(PyramidSeries::new("M", "F"), &RenderOptions::default()).is_none());
}

#[test]
fn value_labels_sit_outside_the_bars() {
    let mut series = PyramidSeries::new("M", "F");
    series.insert("0-4", 10.0, 20.0).unwrap();
    let mut options = RenderOptions::default();
    options.config.pyramid.show_values = true;
    let layout = pyramid_layout(series, &options).expect("chart");
    let row = layout.rows.iter().find(|r| r.bracket == "0-4").unwrap();
    let left = row.left.as_ref().unwrap();
    let right = row.right.as_ref().unwrap();
    assert!(left.value_label.as_ref().unwrap().x < left.x);
    assert!(right.value_label.as_ref().unwrap().x > right.x + right.width);
    assert_eq!(right.value_label.as_ref().unwrap().text, "20");
}
