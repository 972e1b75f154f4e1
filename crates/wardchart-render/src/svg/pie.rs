use super::{PathData, SvgDocument, SvgElement, TextAnchor, legend_group, title_element};
use crate::config::RenderConfig;
use crate::model::{PieLayout, PieSliceLayout};

fn slice_path(layout: &PieLayout, slice: &PieSliceLayout) -> String {
    let c = layout.center;
    let r = layout.radius;
    if slice.is_full_circle {
        // A single arc cannot start and end on the same point; draw two half circles.
        return PathData::new()
            .move_to(c.x, c.y - r)
            .arc_to(r, true, true, c.x, c.y + r)
            .arc_to(r, true, true, c.x, c.y - r)
            .close()
            .build();
    }
    PathData::new()
        .move_to(c.x, c.y)
        .line_to(slice.start.x, slice.start.y)
        .arc_to(r, slice.large_arc, true, slice.end.x, slice.end.y)
        .close()
        .build()
}

pub(super) fn render_pie(doc: &mut SvgDocument, layout: &PieLayout, config: &RenderConfig) {
    if let Some(t) = &layout.title {
        doc.push(title_element(t, config.title_font_size));
    }

    let mut slices = SvgElement::group().class("slices");
    for slice in &layout.slices {
        slices.push(
            SvgElement::path(slice_path(layout, slice), &slice.fill)
                .attr("stroke", "white")
                .attr("stroke-width", "1")
                .attr("data-key", slice.key.as_str())
                .class("slice"),
        );
    }
    doc.push(slices);

    let mut labels = SvgElement::group().class("slice-labels");
    for label in layout.slices.iter().filter_map(|s| s.percent_label.as_ref()) {
        labels.push(
            SvgElement::text(
                label.x,
                label.y,
                &label.text,
                TextAnchor::Middle,
                config.pie.font_size,
            )
            .attr("dominant-baseline", "middle")
            .attr("fill", "white")
            .class("slice-label"),
        );
    }
    doc.push(labels);

    doc.push(legend_group(&layout.legend, config.pie.font_size));
}
