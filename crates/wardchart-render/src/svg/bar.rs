use super::{SvgDocument, SvgElement, TextAnchor, legend_group, title_element};
use crate::config::RenderConfig;
use crate::model::BarLayout;

const GRID_COLOR: &str = "#d0d0d0";
const AXIS_COLOR: &str = "#333333";
const TICK_LABEL_GAP: f64 = 6.0;

pub(super) fn render_bar(doc: &mut SvgDocument, layout: &BarLayout, config: &RenderConfig) {
    let font_size = config.bar.font_size;
    if let Some(t) = &layout.title {
        doc.push(title_element(t, config.title_font_size));
    }

    let mut grid = SvgElement::group().class("grid");
    for tick in &layout.ticks {
        grid.push(
            SvgElement::line(
                layout.plot_left,
                tick.position,
                layout.plot_right,
                tick.position,
                GRID_COLOR,
            )
            .attr("stroke-width", "1"),
        );
        grid.push(
            SvgElement::text(
                layout.plot_left - TICK_LABEL_GAP,
                tick.position,
                &tick.label,
                TextAnchor::End,
                font_size,
            )
            .attr("dominant-baseline", "middle")
            .class("tick-label"),
        );
    }
    doc.push(grid);

    let mut columns = SvgElement::group().class("columns");
    for column in &layout.columns {
        let mut g = SvgElement::group()
            .class("column")
            .attr("data-group", column.group.as_str());
        for seg in &column.segments {
            g.push(
                SvgElement::rect(seg.x, seg.y, seg.width, seg.height, &seg.fill)
                    .attr("data-category", seg.category.as_str())
                    .class("segment"),
            );
        }
        for label in column.segments.iter().filter_map(|s| s.value_label.as_ref()) {
            g.push(
                SvgElement::text(label.x, label.y, &label.text, TextAnchor::Middle, font_size)
                    .attr("dominant-baseline", "middle")
                    .attr("fill", "white")
                    .class("segment-label"),
            );
        }
        if let Some(total) = &column.total_label {
            g.push(
                SvgElement::text(total.x, total.y, &total.text, TextAnchor::Middle, font_size)
                    .attr("font-weight", "bold")
                    .class("total-label"),
            );
        }
        let gl = &column.group_label;
        g.push(
            SvgElement::text(gl.x, gl.y, &gl.text, TextAnchor::Middle, font_size)
                .attr("dominant-baseline", "middle")
                .class("group-label"),
        );
        columns.push(g);
    }
    doc.push(columns);

    doc.push(
        SvgElement::line(
            layout.plot_left,
            layout.zero_y,
            layout.plot_right,
            layout.zero_y,
            AXIS_COLOR,
        )
        .attr("stroke-width", "1")
        .class("baseline"),
    );
    doc.push(
        SvgElement::line(
            layout.plot_left,
            layout.plot_top,
            layout.plot_left,
            layout.plot_bottom,
            AXIS_COLOR,
        )
        .attr("stroke-width", "1")
        .class("axis"),
    );

    doc.push(legend_group(&layout.legend.items, config.bar.legend.font_size));
}
