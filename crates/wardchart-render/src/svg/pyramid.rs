use super::{SvgDocument, SvgElement, TextAnchor, legend_group, title_element};
use crate::config::RenderConfig;
use crate::model::PyramidLayout;

const GRID_COLOR: &str = "#e0e0e0";
const AXIS_COLOR: &str = "#333333";

pub(super) fn render_pyramid(doc: &mut SvgDocument, layout: &PyramidLayout, config: &RenderConfig) {
    let font_size = config.pyramid.font_size;
    if let Some(t) = &layout.title {
        doc.push(title_element(t, config.title_font_size));
    }

    let tick_label_y = layout.plot_bottom + config.pyramid.tick_label_height / 2.0;
    let mut ticks = SvgElement::group().class("ticks");
    for tick in &layout.ticks {
        let mut xs = vec![tick.left_x, tick.right_x];
        if tick.value == 0.0 {
            xs.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        }
        for x in xs {
            ticks.push(
                SvgElement::line(x, layout.plot_top, x, layout.plot_bottom, GRID_COLOR)
                    .attr("stroke-width", "1"),
            );
            ticks.push(
                SvgElement::text(x, tick_label_y, &tick.label, TextAnchor::Middle, font_size)
                    .attr("dominant-baseline", "middle")
                    .class("tick-label"),
            );
        }
    }
    doc.push(ticks);

    let mut rows = SvgElement::group().class("rows");
    for row in &layout.rows {
        let mut g = SvgElement::group()
            .class("row")
            .attr("data-bracket", row.bracket.as_str());
        for (side, bar, anchor) in [
            ("left", &row.left, TextAnchor::End),
            ("right", &row.right, TextAnchor::Start),
        ] {
            let Some(bar) = bar else {
                continue;
            };
            g.push(
                SvgElement::rect(bar.x, row.bar_y, bar.width, row.bar_height, &bar.fill)
                    .attr("data-side", side)
                    .class("bar"),
            );
            if let Some(label) = &bar.value_label {
                g.push(
                    SvgElement::text(label.x, label.y, &label.text, anchor, font_size)
                        .attr("dominant-baseline", "middle")
                        .class("value-label"),
                );
            }
        }
        g.push(
            SvgElement::text(
                row.label.x,
                row.label.y,
                &row.label.text,
                TextAnchor::Middle,
                font_size,
            )
            .attr("dominant-baseline", "middle")
            .class("bracket-label"),
        );
        rows.push(g);
    }
    doc.push(rows);

    for x in [layout.left_origin, layout.right_origin] {
        doc.push(
            SvgElement::line(x, layout.plot_top, x, layout.plot_bottom, AXIS_COLOR)
                .attr("stroke-width", "1")
                .class("axis"),
        );
    }

    doc.push(legend_group(&layout.legend.items, config.pyramid.legend.font_size));
}
