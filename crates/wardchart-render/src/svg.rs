//! Small SVG document builder.
//!
//! Renderers append elements to an in-memory [`SvgDocument`] and serialize it once; all
//! geometry is computed beforehand by the layout modules.

use crate::model::{ChartLayout, LayoutLabel, LegendItemLayout};
use crate::RenderOptions;
use std::fmt::Write as _;

mod bar;
mod pie;
mod pyramid;

pub(crate) fn fmt(v: f64) -> String {
    // Round-trippable decimal form without `-0` and without tiny float noise.
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn fmt_path(v: f64) -> String {
    // Path data keeps three fractional digits.
    if !v.is_finite() {
        return "0".to_string();
    }
    if v.abs() < 0.0005 {
        return "0".to_string();
    }
    let mut s = format!("{:.3}", (v * 1000.0).round() / 1000.0);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" { "0".to_string() } else { s }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builder for the `d` attribute of a `<path>`.
#[derive(Debug, Clone, Default)]
pub struct PathData {
    d: String,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(&mut self.d, "M{},{}", fmt_path(x), fmt_path(y));
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(&mut self.d, "L{},{}", fmt_path(x), fmt_path(y));
        self
    }

    pub fn arc_to(mut self, r: f64, large_arc: bool, sweep: bool, x: f64, y: f64) -> Self {
        let _ = write!(
            &mut self.d,
            "A{r},{r},0,{large},{sweep},{x},{y}",
            r = fmt_path(r),
            large = u8::from(large_arc),
            sweep = u8::from(sweep),
            x = fmt_path(x),
            y = fmt_path(y)
        );
        self
    }

    pub fn close(mut self) -> Self {
        self.d.push('Z');
        self
    }

    pub fn build(self) -> String {
        self.d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// One SVG element with ordered attributes, optional text content and children.
#[derive(Debug, Clone)]
pub struct SvgElement {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    text: Option<String>,
    children: Vec<SvgElement>,
}

impl SvgElement {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn num(self, key: &'static str, value: f64) -> Self {
        self.attr(key, fmt(value))
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: SvgElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: SvgElement) {
        self.children.push(child);
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str) -> Self {
        Self::new("rect")
            .num("x", x)
            .num("y", y)
            .num("width", width.max(0.0))
            .num("height", height.max(0.0))
            .attr("fill", fill)
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) -> Self {
        Self::new("line")
            .num("x1", x1)
            .num("y1", y1)
            .num("x2", x2)
            .num("y2", y2)
            .attr("stroke", stroke)
    }

    pub fn path(d: String, fill: &str) -> Self {
        Self::new("path").attr("d", d).attr("fill", fill)
    }

    pub fn circle(cx: f64, cy: f64, r: f64, fill: &str) -> Self {
        Self::new("circle")
            .num("cx", cx)
            .num("cy", cy)
            .num("r", r)
            .attr("fill", fill)
    }

    pub fn text(x: f64, y: f64, content: &str, anchor: TextAnchor, font_size: f64) -> Self {
        let mut el = Self::new("text")
            .num("x", x)
            .num("y", y)
            .attr("text-anchor", anchor.as_str())
            .num("font-size", font_size);
        el.text = Some(content.to_string());
        el
    }

    pub fn group() -> Self {
        Self::new("g")
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, r#" {k}="{}""#, escape_xml(v));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(t) = &self.text {
            out.push_str(&escape_xml(t));
        }
        for c in &self.children {
            c.write_to(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// Root of a chart document.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    width: f64,
    height: f64,
    id: Option<String>,
    title: Option<String>,
    role_description: &'static str,
    font_family: String,
    background: Option<String>,
    children: Vec<SvgElement>,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64, role_description: &'static str) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            id: None,
            title: None,
            role_description,
            font_family: "sans-serif".to_string(),
            background: None,
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: Option<&str>) -> Self {
        self.id = id.map(str::to_string);
        self
    }

    pub fn with_title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    pub fn with_font_family(mut self, font_family: &str) -> Self {
        self.font_family = font_family.to_string();
        self
    }

    pub fn with_background(mut self, background: Option<&str>) -> Self {
        self.background = background.map(str::to_string);
        self
    }

    pub fn push(&mut self, el: SvgElement) {
        self.children.push(el);
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        if let Some(id) = &self.id {
            let _ = write!(&mut out, r#" id="{}""#, escape_xml(id));
        }
        let _ = write!(
            &mut out,
            r#" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}" role="graphics-document document" aria-roledescription="{role}">"#,
            w = fmt(self.width),
            h = fmt(self.height),
            font = escape_xml(&self.font_family),
            role = self.role_description,
        );
        if let Some(t) = &self.title {
            let _ = write!(&mut out, "<title>{}</title>", escape_xml(t));
        }
        if let Some(bg) = &self.background {
            SvgElement::rect(0.0, 0.0, self.width, self.height, bg)
                .class("background")
                .write_to(&mut out);
        }
        for c in &self.children {
            c.write_to(&mut out);
        }
        out.push_str("</svg>");
        out
    }
}

pub(crate) fn title_element(title: &LayoutLabel, font_size: f64) -> SvgElement {
    SvgElement::text(title.x, title.y, &title.text, TextAnchor::Middle, font_size)
        .attr("font-weight", "bold")
        .class("chart-title")
}

pub(crate) fn legend_group(items: &[LegendItemLayout], font_size: f64) -> SvgElement {
    let mut g = SvgElement::group().class("legend");
    for item in items {
        g.push(
            SvgElement::rect(
                item.swatch_x,
                item.swatch_y,
                item.swatch_size,
                item.swatch_size,
                &item.fill,
            )
            .class("legend-swatch"),
        );
        g.push(
            SvgElement::text(
                item.text_x,
                item.text_y,
                &item.label,
                TextAnchor::Start,
                font_size,
            )
            .attr("dominant-baseline", "middle")
            .class("legend-label"),
        );
    }
    g
}

/// Serializes a computed layout.
pub fn render_layout_svg(
    layout: &ChartLayout,
    title: Option<&str>,
    options: &RenderOptions,
) -> String {
    let config = &options.config;
    let (width, height) = layout.size();
    let mut doc = SvgDocument::new(width, height, layout.chart_type().as_str())
        .with_id(options.chart_id.as_deref())
        .with_title(title)
        .with_font_family(&config.font_family)
        .with_background(config.background.as_deref());

    match layout {
        ChartLayout::Pie(l) => pie::render_pie(&mut doc, l, config),
        ChartLayout::Bar(l) => bar::render_bar(&mut doc, l, config),
        ChartLayout::Pyramid(l) => pyramid::render_pyramid(&mut doc, l, config),
    }
    doc.to_svg_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_strips_float_noise() {
        assert_eq!(fmt(1.0000000001), "1");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(12.5), "12.5");
        assert_eq!(fmt(f64::NAN), "0");
    }

    #[test]
    fn fmt_path_keeps_three_decimals() {
        assert_eq!(fmt_path(1.23456), "1.235");
        assert_eq!(fmt_path(2.0), "2");
        assert_eq!(fmt_path(-0.0001), "0");
    }

    #[test]
    fn path_builder_emits_arc_flags() {
        let d = PathData::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .arc_to(10.0, true, true, 0.0, 10.0)
            .close()
            .build();
        assert_eq!(d, "M0,0L10,0A10,10,0,1,1,0,10Z");
    }

    #[test]
    fn elements_escape_text_and_attributes() {
        let mut doc = SvgDocument::new(10.0, 10.0, "pie").with_title(Some("A & B"));
        doc.push(SvgElement::text(1.0, 2.0, "<x>", TextAnchor::Middle, 12.0).class("a\"b"));
        let svg = doc.to_svg_string();
        assert!(svg.contains("<title>A &amp; B</title>"));
        assert!(svg.contains("&lt;x&gt;"));
        assert!(svg.contains(r#"class="a&quot;b""#));
        assert!(svg.ends_with("</svg>"));
    }
}
