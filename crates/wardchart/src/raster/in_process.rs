use super::{RasterError, RasterRequest, Rasterizer, verify_output};

type RasterResult<T> = std::result::Result<T, RasterError>;

/// SVG user units are CSS pixels at 96 dpi.
const SVG_DPI: f32 = 96.0;

/// Pure-Rust rasterizer: no external tool, so it never times out or goes missing.
#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    /// Fill painted under the chart; `None` keeps transparency.
    pub background: Option<String>,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self {
            background: Some("white".to_string()),
        }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn name(&self) -> &str {
        "resvg"
    }

    fn rasterize(&self, request: &RasterRequest) -> RasterResult<()> {
        let svg = std::fs::read_to_string(&request.input)?;
        let scale = request.dpi.max(1) as f32 / SVG_DPI;
        let png = svg_to_png(&svg, scale, self.background.as_deref())?;
        std::fs::write(&request.output, png)?;
        verify_output(&request.output)
    }
}

fn font_options() -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt
}

pub fn svg_to_png(svg: &str, scale: f32, background: Option<&str>) -> RasterResult<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, scale, background)?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

/// Single-page PDF of the chart, for print-oriented document builds.
pub fn svg_to_pdf(svg: &str) -> RasterResult<Vec<u8>> {
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| RasterError::PdfConvert)
}

fn svg_to_pixmap(
    svg: &str,
    scale: f32,
    background: Option<&str>,
) -> RasterResult<tiny_skia::Pixmap> {
    let tree = usvg::Tree::from_str(svg, &font_options()).map_err(|_| RasterError::SvgParse)?;
    // Chart documents always carry width/height, so the tree size is the canvas size.
    let size = tree.size();
    let width_px = (size.width() * scale).ceil().max(1.0) as u32;
    let height_px = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap =
        tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    if let Some(color) = background.and_then(parse_color) {
        pixmap.fill(color);
    }
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

fn parse_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" | "none" => return Some(tiny_skia::Color::TRANSPARENT),
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        _ => {}
    }
    let hex = s.strip_prefix('#')?;
    let digit = |c: u8| (c as char).to_digit(16).map(|v| v as u8);
    let bytes = hex.as_bytes();
    let channels: Vec<u8> = match bytes.len() {
        3 | 4 => bytes
            .iter()
            .map(|&c| digit(c).map(|v| (v << 4) | v))
            .collect::<Option<_>>()?,
        6 | 8 => bytes
            .chunks_exact(2)
            .map(|pair| Some((digit(pair[0])? << 4) | digit(pair[1])?))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    let alpha = channels.get(3).copied().unwrap_or(255);
    Some(tiny_skia::Color::from_rgba8(
        channels[0],
        channels[1],
        channels[2],
        alpha,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10"><rect width="10" height="10" fill="#1f77b4"/></svg>"##;

    #[test]
    fn png_output_has_png_signature() {
        let bytes = svg_to_png(SQUARE, 1.0, Some("white")).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn pdf_output_has_pdf_signature() {
        let bytes = svg_to_pdf(SQUARE).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn dpi_scales_the_pixmap() {
        let pixmap = svg_to_pixmap(SQUARE, 192.0 / SVG_DPI, None).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 20));
    }

    #[test]
    fn parses_short_and_long_hex_colors() {
        assert_eq!(
            parse_color("#fff"),
            Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255))
        );
        assert_eq!(
            parse_color("#1f77b480"),
            Some(tiny_skia::Color::from_rgba8(0x1f, 0x77, 0xb4, 0x80))
        );
        assert_eq!(parse_color("rebeccapurple"), None);
    }

    #[test]
    fn rasterizer_writes_the_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("c.svg");
        std::fs::write(&input, SQUARE).unwrap();
        let request = RasterRequest {
            input,
            output: dir.path().join("c.png"),
            dpi: 96,
        };
        ResvgRasterizer::default().rasterize(&request).unwrap();
        assert!(std::fs::metadata(&request.output).unwrap().len() > 0);
    }

    #[test]
    fn unparsable_svg_is_an_error() {
        assert!(matches!(
            svg_to_png("not svg", 1.0, None),
            Err(RasterError::SvgParse)
        ));
    }
}
