use serde_json::json;
use wardchart_core::{ChartSpec, ChartType};
use wardchart_render::{RenderOptions, render_chart};

fn render(spec: serde_json::Value, title: Option<&str>) -> String {
    let spec = ChartSpec::from_json(&spec).expect("valid spec");
    render_chart(&spec, title, &RenderOptions::default())
        .expect("render ok")
        .expect("chart produced")
        .svg
}

fn elements_with_class<'a>(
    doc: &'a roxmltree::Document<'a>,
    class: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    doc.descendants()
        .filter(|n| n.attribute("class") == Some(class))
        .collect()
}

#[test]
fn pie_svg_is_well_formed_with_one_path_per_slice() {
    let svg = render(
        json!({"type": "pie", "data": {"A": 30, "B": 70, "C": 0}}),
        Some("Religion <2078>"),
    );
    let doc = roxmltree::Document::parse(&svg).expect("well-formed SVG");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.attribute("aria-roledescription"), Some("pie"));

    let slices = elements_with_class(&doc, "slice");
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].attribute("data-key"), Some("A"));
    // B spans more than half the circle.
    assert!(slices[1].attribute("d").unwrap().contains(",0,1,1,"));
    assert!(slices[0].attribute("d").unwrap().contains(",0,0,1,"));

    let title = elements_with_class(&doc, "chart-title");
    assert_eq!(title[0].text(), Some("Religion <2078>"));
    assert_eq!(elements_with_class(&doc, "legend-label").len(), 2);
}

#[test]
fn single_slice_pie_draws_a_closed_circle() {
    let svg = render(json!({"type": "pie", "data": {"A": 5}}), None);
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let slices = elements_with_class(&doc, "slice");
    assert_eq!(slices.len(), 1);
    let d = slices[0].attribute("d").unwrap();
    assert_eq!(d.matches('A').count(), 2);
}

#[test]
fn bar_svg_columns_in_numeric_order() {
    let svg = render(
        json!({"type": "bar", "data": {"1": {"X": 10}, "9": {"X": 5}, "10": {"X": 20}}}),
        None,
    );
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let groups: Vec<&str> = elements_with_class(&doc, "column")
        .iter()
        .filter_map(|n| n.attribute("data-group"))
        .collect();
    assert_eq!(groups, vec!["1", "9", "10"]);
    assert_eq!(elements_with_class(&doc, "segment").len(), 3);
    assert_eq!(elements_with_class(&doc, "tick-label").len(), 6);
}

#[test]
fn pyramid_svg_has_a_label_for_every_bracket() {
    let svg = render(
        json!({"type": "pyramid", "data": {"0-4": {"male": 10, "female": 12}}}),
        None,
    );
    let doc = roxmltree::Document::parse(&svg).unwrap();
    assert_eq!(elements_with_class(&doc, "bracket-label").len(), 16);
    assert_eq!(elements_with_class(&doc, "bar").len(), 2);
    assert_eq!(elements_with_class(&doc, "legend-label").len(), 2);
}

#[test]
fn rendered_chart_reports_its_type_and_size() {
    let spec = ChartSpec::from_json(&json!({"type": "pie", "data": {"A": 1}})).unwrap();
    let out = render_chart(
        &spec,
        None,
        &RenderOptions::default().with_chart_id("ward-religion"),
    )
    .unwrap()
    .unwrap();
    assert_eq!(out.chart_type, ChartType::Pie);
    assert!(out.width > 0.0 && out.height > 0.0);
    assert!(out.svg.contains(r#"id="ward-religion""#));
}

#[test]
fn rendering_does_not_mutate_the_series() {
    let spec = ChartSpec::from_json(&json!({"type": "bar", "data": {"2": {"a": 1}, "1": {"a": 2}}}))
        .unwrap();
    let before = spec.clone();
    let _ = render_chart(&spec, None, &RenderOptions::default()).unwrap();
    assert_eq!(spec, before);
}

#[test]
fn invalid_config_is_an_error() {
    let spec = ChartSpec::from_json(&json!({"type": "pie", "data": {"A": 1}})).unwrap();
    let mut options = RenderOptions::default();
    options.config.bar.scale_steps = 0;
    assert!(render_chart(&spec, None, &options).is_err());
}
