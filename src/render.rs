//! Styled rendering of a [`SymbolMatrix`] to SVG and PNG.
//!
//! Both output paths draw the same geometry. The SVG path builds an
//! [`SvgDocument`] tree; the PNG path classifies every output pixel
//! against that geometry directly, so raster output does not depend on an
//! SVG rasterizer except when a frame label needs real text shaping.
//!
//! All coordinates inside a document are module units: one module is one
//! user unit, and the view box spans the symbol plus quiet zone plus any
//! frame band. The pixel viewport scales uniformly from that.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::logo;
use crate::raster;
use crate::style::{
    parse_hex_color, CornerStyle, DotStyle, FrameStyle, GradientKind, GradientSpec, StylingOptions,
};
use crate::svg::{Stroke, SvgDef, SvgDocument, SvgNode};
use crate::symbol::{EccLevel, SymbolMatrix};

pub const DEFAULT_PIXEL_SIZE: u32 = 300;
pub const DEFAULT_MARGIN_MODULES: u32 = 4;

/// One render job: the embedding string plus output geometry and styling.
///
/// `pixel_size` is the full edge length of the output in pixels, margin and
/// frame included. `margin_modules` is the quiet zone width in modules on
/// every side.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub content: String,
    pub pixel_size: u32,
    pub margin_modules: u32,
    pub ecc: EccLevel,
    pub styling: StylingOptions,
}

impl RenderRequest {
    pub fn new(content: impl Into<String>) -> Self {
        RenderRequest {
            content: content.into(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            margin_modules: DEFAULT_MARGIN_MODULES,
            ecc: EccLevel::default(),
            styling: StylingOptions::default(),
        }
    }

    /// The error correction level the symbol is encoded with.
    ///
    /// A logo overlay destroys the modules under it, so any request that
    /// carries a logo is raised to at least [`EccLevel::Quartile`]. The
    /// requested level wins when it is already stronger.
    pub fn effective_ecc(&self) -> EccLevel {
        if self.styling.logo.is_some() {
            self.ecc.max(EccLevel::Quartile)
        } else {
            self.ecc
        }
    }

    /// Encodes the content at the effective error correction level.
    pub fn matrix(&self) -> Result<SymbolMatrix> {
        SymbolMatrix::encode(&self.content, self.effective_ecc())
    }

    fn layout(&self, matrix: &SymbolMatrix) -> Result<Layout> {
        if self.pixel_size == 0 {
            return Err(Error::InvalidDimension(0));
        }
        let frame = self
            .styling
            .frame
            .as_ref()
            .map_or(0.0, |f| f64::from(f.thickness_modules));
        let margin = f64::from(self.margin_modules);
        Ok(Layout {
            margin,
            frame,
            total: matrix.size() as f64 + 2.0 * (margin + frame),
            pixel: self.pixel_size,
        })
    }
}

/// Geometry of one output: everything in module units except `pixel`.
struct Layout {
    margin: f64,
    frame: f64,
    total: f64,
    pixel: u32,
}

impl Layout {
    /// Symbol top-left corner in user units.
    fn origin(&self) -> f64 {
        self.margin + self.frame
    }
}

/// Renders the request as a standalone SVG string, logo included.
pub fn render_svg(request: &RenderRequest) -> Result<String> {
    let mut doc = svg_document(request)?;
    if let Some(logo) = &request.styling.logo {
        logo::add_logo_to_svg(&mut doc, logo)?;
    }
    Ok(doc.to_xml())
}

/// Builds the styled document tree for the symbol, frame and label.
///
/// The logo is not part of this tree; [`render_svg`] appends it so that
/// callers holding a bare symbol document can still composite their own.
pub fn svg_document(request: &RenderRequest) -> Result<SvgDocument> {
    let matrix = request.matrix()?;
    let palette = Palette::resolve(&request.styling)?;
    let layout = request.layout(&matrix)?;
    Ok(build_document(&matrix, request, &palette, &layout))
}

/// Renders the request as PNG bytes.
///
/// Output is classified per pixel straight from the matrix. When the
/// styling carries a frame label the glyphs need text shaping, so the SVG
/// output is rasterized instead; both paths draw the same geometry.
pub fn render_png(request: &RenderRequest) -> Result<Vec<u8>> {
    let image = render_image(request)?;
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Same as [`render_png`] but stops before PNG encoding.
pub fn render_image(request: &RenderRequest) -> Result<RgbaImage> {
    let matrix = request.matrix()?;
    let palette = Palette::resolve(&request.styling)?;
    let layout = request.layout(&matrix)?;

    if request.styling.needs_vector_text() {
        let svg = render_svg(request)?;
        let png = raster::svg_to_png(&svg, layout.pixel, layout.pixel)?;
        return Ok(image::load_from_memory(&png)?.to_rgba8());
    }

    let mut image = rasterize(&matrix, request, &palette, &layout);
    if let Some(logo) = &request.styling.logo {
        logo::overlay_logo(&mut image, logo)?;
    }
    Ok(image)
}

/// Renders the request as a `data:image/png;base64,...` URL.
pub fn render_data_url(request: &RenderRequest) -> Result<String> {
    let png = render_png(request)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

// ---------------------------------------------------------------------------
// Resolved styling

/// Styling with every color literal parsed and gradient stops ordered.
struct Palette {
    foreground: [u8; 4],
    background: [u8; 4],
    gradient: Option<GradientPaint>,
    frame: Option<FramePalette>,
}

struct FramePalette {
    color: [u8; 4],
}

impl Palette {
    fn resolve(styling: &StylingOptions) -> Result<Palette> {
        let foreground = parse_hex_color(&styling.foreground_color)?;
        let background = parse_hex_color(&styling.background_color)?;
        let gradient = styling
            .gradient
            .as_ref()
            .map(GradientPaint::resolve)
            .transpose()?;
        let frame = styling
            .frame
            .as_ref()
            .map(|frame| -> Result<FramePalette> {
                if let Some(text_color) = &frame.text_color {
                    parse_hex_color(text_color)?;
                }
                Ok(FramePalette {
                    color: parse_hex_color(&frame.color)?,
                })
            })
            .transpose()?;
        Ok(Palette {
            foreground,
            background,
            gradient,
            frame,
        })
    }
}

/// A gradient with parsed stop colors, kept alongside the CSS literals so
/// the SVG def and the raster interpolation come from the same list.
struct GradientPaint {
    kind: GradientKind,
    rotation: f32,
    stops: Vec<PaintStop>,
}

struct PaintStop {
    offset: f32,
    color: [u8; 4],
    css: String,
}

impl GradientPaint {
    fn resolve(spec: &GradientSpec) -> Result<GradientPaint> {
        if spec.stops.len() < 2 {
            return Err(Error::InvalidGradient(
                "a gradient needs at least two stops".into(),
            ));
        }
        let mut stops = Vec::with_capacity(spec.stops.len());
        for stop in &spec.stops {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(Error::InvalidGradient(format!(
                    "stop offset {} outside [0, 1]",
                    stop.offset
                )));
            }
            stops.push(PaintStop {
                offset: stop.offset,
                color: parse_hex_color(&stop.color)?,
                css: stop.color.clone(),
            });
        }
        stops.sort_by(|a, b| {
            a.offset
                .partial_cmp(&b.offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(GradientPaint {
            kind: spec.kind,
            rotation: spec.rotation,
            stops,
        })
    }

    /// The paint server definition, with endpoints in user-space units so
    /// the ramp spans the whole canvas no matter which nodes reference it.
    fn svg_def(&self, id: &str, total: f64) -> SvgDef {
        let stops = self
            .stops
            .iter()
            .map(|stop| (stop.offset, stop.css.clone()))
            .collect();
        let half = total / 2.0;
        match self.kind {
            GradientKind::Linear => {
                let theta = f64::from(self.rotation).to_radians();
                let (dx, dy) = (theta.cos() * half, theta.sin() * half);
                SvgDef::LinearGradient {
                    id: id.to_owned(),
                    x1: half - dx,
                    y1: half - dy,
                    x2: half + dx,
                    y2: half + dy,
                    stops,
                }
            }
            GradientKind::Radial => SvgDef::RadialGradient {
                id: id.to_owned(),
                cx: half,
                cy: half,
                r: half,
                stops,
            },
        }
    }

    /// Color at a canvas position, matching the SVG paint server: linear
    /// projects onto the rotated axis through the canvas center, radial
    /// measures distance from the center, both padded past the ends.
    fn color_at(&self, u: f64, v: f64, total: f64) -> [u8; 4] {
        let half = total / 2.0;
        let t = match self.kind {
            GradientKind::Linear => {
                let theta = f64::from(self.rotation).to_radians();
                ((u - half) * theta.cos() + (v - half) * theta.sin()) / total + 0.5
            }
            GradientKind::Radial => {
                let (dx, dy) = (u - half, v - half);
                (dx * dx + dy * dy).sqrt() / half
            }
        }
        .clamp(0.0, 1.0) as f32;

        if t <= self.stops[0].offset {
            return self.stops[0].color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                let k = if span <= f32::EPSILON {
                    1.0
                } else {
                    (t - a.offset) / span
                };
                return lerp_color(a.color, b.color, k);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

fn lerp_color(a: [u8; 4], b: [u8; 4], k: f32) -> [u8; 4] {
    std::array::from_fn(|i| {
        let channel = f32::from(a[i]) + (f32::from(b[i]) - f32::from(a[i])) * k;
        channel.round().clamp(0.0, 255.0) as u8
    })
}

// ---------------------------------------------------------------------------
// SVG assembly

fn build_document(
    matrix: &SymbolMatrix,
    request: &RenderRequest,
    palette: &Palette,
    layout: &Layout,
) -> SvgDocument {
    let total = layout.total;
    let mut doc = SvgDocument::new(layout.pixel, layout.pixel, total, total);

    let paint = match &palette.gradient {
        Some(gradient) => {
            doc.push_def(gradient.svg_def("dots", total));
            "url(#dots)".to_owned()
        }
        None => request.styling.foreground_color.clone(),
    };

    if let Some(frame) = &request.styling.frame {
        let t = layout.frame;
        let (rx_outer, rx_inner) = frame_radii(frame.style, t);
        doc.push(SvgNode::Rect {
            x: 0.0,
            y: 0.0,
            width: total,
            height: total,
            rx: rx_outer,
            fill: frame.color.clone(),
            stroke: None,
        });
        doc.push(SvgNode::Rect {
            x: t,
            y: t,
            width: total - 2.0 * t,
            height: total - 2.0 * t,
            rx: rx_inner,
            fill: request.styling.background_color.clone(),
            stroke: None,
        });
    } else {
        doc.push(SvgNode::Rect {
            x: 0.0,
            y: 0.0,
            width: total,
            height: total,
            rx: 0.0,
            fill: request.styling.background_color.clone(),
            stroke: None,
        });
    }

    let origin = layout.origin();
    let size = matrix.size();
    match request.styling.dot_style {
        DotStyle::Square => {
            let mut d = String::new();
            for y in 0..size {
                for x in 0..size {
                    if matrix.module(x, y) && !in_finder(size, x, y) {
                        d.push_str(&format!(
                            "M{},{}h1v1h-1z",
                            x as f64 + origin,
                            y as f64 + origin
                        ));
                    }
                }
            }
            doc.push(SvgNode::Path {
                d,
                fill: paint.clone(),
            });
        }
        DotStyle::Rounded => {
            for y in 0..size {
                for x in 0..size {
                    if matrix.module(x, y) && !in_finder(size, x, y) {
                        doc.push(SvgNode::Rect {
                            x: x as f64 + origin + 0.1,
                            y: y as f64 + origin + 0.1,
                            width: 0.8,
                            height: 0.8,
                            rx: 0.2,
                            fill: paint.clone(),
                            stroke: None,
                        });
                    }
                }
            }
        }
        DotStyle::Dot => {
            for y in 0..size {
                for x in 0..size {
                    if matrix.module(x, y) && !in_finder(size, x, y) {
                        doc.push(SvgNode::Circle {
                            cx: x as f64 + origin + 0.5,
                            cy: y as f64 + origin + 0.5,
                            r: 0.4,
                            fill: paint.clone(),
                            stroke: None,
                        });
                    }
                }
            }
        }
    }

    for (fx, fy) in finder_origins(size) {
        push_finder_nodes(
            &mut doc,
            request.styling.corner_style,
            fx as f64 + origin,
            fy as f64 + origin,
            &paint,
        );
    }

    if let Some(frame) = &request.styling.frame {
        if let Some(text) = &frame.text {
            let font_size = layout.frame * 0.6;
            let fill = frame
                .text_color
                .clone()
                .unwrap_or_else(|| request.styling.background_color.clone());
            doc.push(SvgNode::Text {
                x: total / 2.0,
                // Baseline sits a bit below the band's vertical center.
                y: total - layout.frame / 2.0 + font_size * 0.35,
                content: text.clone(),
                fill,
                font_size,
                font_family: "sans-serif".into(),
            });
        }
    }

    doc
}

/// The three-part finder composite: a 1-module-wide ring drawn as a
/// stroked shape plus a filled center. Stroke edges line up with the
/// 7x7 / 5x5 / 3x3 module boundaries of a plain finder pattern.
fn push_finder_nodes(doc: &mut SvgDocument, style: CornerStyle, x: f64, y: f64, paint: &str) {
    match style {
        CornerStyle::Square | CornerStyle::Rounded => {
            let rounded = matches!(style, CornerStyle::Rounded);
            doc.push(SvgNode::Rect {
                x: x + 0.5,
                y: y + 0.5,
                width: 6.0,
                height: 6.0,
                rx: if rounded { 1.5 } else { 0.0 },
                fill: "none".into(),
                stroke: Some(Stroke {
                    color: paint.to_owned(),
                    width: 1.0,
                }),
            });
            doc.push(SvgNode::Rect {
                x: x + 2.0,
                y: y + 2.0,
                width: 3.0,
                height: 3.0,
                rx: if rounded { 0.75 } else { 0.0 },
                fill: paint.to_owned(),
                stroke: None,
            });
        }
        CornerStyle::Dot => {
            doc.push(SvgNode::Circle {
                cx: x + 3.5,
                cy: y + 3.5,
                r: 3.0,
                fill: "none".into(),
                stroke: Some(Stroke {
                    color: paint.to_owned(),
                    width: 1.0,
                }),
            });
            doc.push(SvgNode::Circle {
                cx: x + 3.5,
                cy: y + 3.5,
                r: 1.5,
                fill: paint.to_owned(),
                stroke: None,
            });
        }
    }
}

fn frame_radii(style: FrameStyle, thickness: f64) -> (f64, f64) {
    match style {
        FrameStyle::Square => (0.0, 0.0),
        FrameStyle::Rounded => (thickness / 2.0, thickness / 4.0),
    }
}

fn finder_origins(size: usize) -> [(usize, usize); 3] {
    [(0, 0), (size - 7, 0), (0, size - 7)]
}

fn in_finder(size: usize, x: usize, y: usize) -> bool {
    let near_x = x < 7;
    let near_y = y < 7;
    let far_x = x >= size - 7;
    let far_y = y >= size - 7;
    (near_x && near_y) || (far_x && near_y) || (near_x && far_y)
}

// ---------------------------------------------------------------------------
// Direct rasterization

/// Classifies every output pixel against the same geometry the SVG path
/// draws: frame band, quiet zone, module shapes and finder composites,
/// with half-pixel antialiasing on curved edges.
fn rasterize(
    matrix: &SymbolMatrix,
    request: &RenderRequest,
    palette: &Palette,
    layout: &Layout,
) -> RgbaImage {
    let px = layout.pixel;
    let total = layout.total;
    let units_per_px = total / f64::from(px);
    let origin = layout.origin();
    let size = matrix.size();
    let corner = request.styling.corner_style;
    let dots = request.styling.dot_style;
    let frame_rx = request
        .styling
        .frame
        .as_ref()
        .map(|f| frame_radii(f.style, layout.frame));

    let background: [f32; 4] = palette.background.map(f32::from);
    let mut image = RgbaImage::new(px, px);
    for j in 0..px {
        let v = (f64::from(j) + 0.5) * units_per_px;
        for i in 0..px {
            let u = (f64::from(i) + 0.5) * units_per_px;

            let mut outer_cov = 1.0;
            let mut color = background;
            if let (Some(frame), Some((rx_outer, rx_inner))) = (&palette.frame, frame_rx) {
                let t = layout.frame;
                outer_cov = cov_rrect(u, v, 0.0, 0.0, total, total, rx_outer, units_per_px);
                let inner = cov_rrect(
                    u,
                    v,
                    t,
                    t,
                    total - 2.0 * t,
                    total - 2.0 * t,
                    rx_inner,
                    units_per_px,
                );
                color = mix(frame.color.map(f32::from), background, inner as f32);
            }

            let (us, vs) = (u - origin, v - origin);
            let mx = us.floor() as i64;
            let my = vs.floor() as i64;
            let mut dark_cov = 0.0;
            if (0..size as i64).contains(&mx) && (0..size as i64).contains(&my) {
                let (x, y) = (mx as usize, my as usize);
                if in_finder(size, x, y) {
                    let fx = if x >= size - 7 { size - 7 } else { 0 } as f64;
                    let fy = if y >= size - 7 { size - 7 } else { 0 } as f64;
                    dark_cov = finder_coverage(corner, us, vs, fx, fy, units_per_px);
                } else if matrix.module(x, y) {
                    dark_cov = module_coverage(dots, us, vs, x as f64, y as f64, units_per_px);
                }
            }
            if dark_cov > 0.0 {
                let paint = match &palette.gradient {
                    Some(gradient) => gradient.color_at(u, v, total),
                    None => palette.foreground,
                };
                color = mix(color, paint.map(f32::from), dark_cov as f32);
            }

            let pixel: [u8; 4] = [
                channel(color[0]),
                channel(color[1]),
                channel(color[2]),
                channel(color[3] * outer_cov as f32),
            ];
            image.put_pixel(i, j, Rgba(pixel));
        }
    }
    image
}

fn finder_coverage(style: CornerStyle, u: f64, v: f64, fx: f64, fy: f64, aa: f64) -> f64 {
    match style {
        CornerStyle::Square | CornerStyle::Rounded => {
            let rounded = matches!(style, CornerStyle::Rounded);
            let (ro, ri, rc) = if rounded { (2.0, 1.0, 0.75) } else { (0.0, 0.0, 0.0) };
            let ring = cov_rrect(u, v, fx, fy, 7.0, 7.0, ro, aa)
                - cov_rrect(u, v, fx + 1.0, fy + 1.0, 5.0, 5.0, ri, aa);
            let center = cov_rrect(u, v, fx + 2.0, fy + 2.0, 3.0, 3.0, rc, aa);
            (ring.max(0.0) + center).clamp(0.0, 1.0)
        }
        CornerStyle::Dot => {
            let (cx, cy) = (fx + 3.5, fy + 3.5);
            let ring = cov_circle(u, v, cx, cy, 3.5, aa) - cov_circle(u, v, cx, cy, 2.5, aa);
            let center = cov_circle(u, v, cx, cy, 1.5, aa);
            (ring.max(0.0) + center).clamp(0.0, 1.0)
        }
    }
}

fn module_coverage(style: DotStyle, u: f64, v: f64, mx: f64, my: f64, aa: f64) -> f64 {
    match style {
        DotStyle::Square => 1.0,
        DotStyle::Rounded => cov_rrect(u, v, mx + 0.1, my + 0.1, 0.8, 0.8, 0.2, aa),
        DotStyle::Dot => cov_circle(u, v, mx + 0.5, my + 0.5, 0.4, aa),
    }
}

/// Coverage of a rounded rectangle at a sample point, ramping over one
/// pixel of signed distance.
#[allow(clippy::too_many_arguments)]
fn cov_rrect(u: f64, v: f64, x: f64, y: f64, w: f64, h: f64, r: f64, aa: f64) -> f64 {
    let hw = w / 2.0;
    let hh = h / 2.0;
    let r = r.min(hw).min(hh);
    let qx = (u - x - hw).abs() - (hw - r);
    let qy = (v - y - hh).abs() - (hh - r);
    let dist = {
        let dx = qx.max(0.0);
        let dy = qy.max(0.0);
        (dx * dx + dy * dy).sqrt() + qx.max(qy).min(0.0) - r
    };
    (0.5 - dist / aa).clamp(0.0, 1.0)
}

fn cov_circle(u: f64, v: f64, cx: f64, cy: f64, r: f64, aa: f64) -> f64 {
    let dist = ((u - cx).powi(2) + (v - cy).powi(2)).sqrt() - r;
    (0.5 - dist / aa).clamp(0.0, 1.0)
}

fn mix(a: [f32; 4], b: [f32; 4], k: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * k)
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FrameOptions, GradientStop, LogoOptions};
    use image::GenericImageView;

    #[test]
    fn default_request_renders_square_png() {
        let request = RenderRequest::new("https://shiba.pw");
        let png = render_png(&request).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (300, 300));
    }

    #[test]
    fn svg_view_box_covers_symbol_and_margin() {
        let request = RenderRequest::new("HELLO WORLD");
        let svg = render_svg(&request).unwrap();
        // Version 1 symbol plus a 4-module quiet zone on each side.
        assert!(svg.contains(r#"viewBox="0 0 29 29""#));
        assert!(svg.contains(r#"width="300" height="300""#));
    }

    #[test]
    fn frame_band_grows_the_view_box() {
        let mut request = RenderRequest::new("HELLO WORLD");
        request.styling.frame = Some(FrameOptions::default());
        let svg = render_svg(&request).unwrap();
        assert!(svg.contains(r#"viewBox="0 0 37 37""#));
    }

    #[test]
    fn svg_rendering_is_deterministic() {
        let mut request = RenderRequest::new("WIFI:S:Cafe;T:WPA;P:p4ss;;");
        request.styling.dot_style = DotStyle::Rounded;
        assert_eq!(render_svg(&request).unwrap(), render_svg(&request).unwrap());
    }

    #[test]
    fn logo_requests_are_encoded_at_quartile_or_better() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.ecc = EccLevel::Low;
        request.styling.logo = Some(LogoOptions::new(vec![0; 4]));
        assert_eq!(request.effective_ecc(), EccLevel::Quartile);
        assert_eq!(request.matrix().unwrap().ecc(), EccLevel::Quartile);

        request.ecc = EccLevel::High;
        assert_eq!(request.effective_ecc(), EccLevel::High);
    }

    #[test]
    fn gradient_styling_emits_a_paint_server() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.styling.gradient = Some(GradientSpec {
            kind: GradientKind::Linear,
            rotation: 45.0,
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: "#FF6600".into(),
                },
                GradientStop {
                    offset: 1.0,
                    color: "#0033AA".into(),
                },
            ],
        });
        let svg = render_svg(&request).unwrap();
        assert!(svg.contains(r#"<linearGradient id="dots""#));
        assert!(svg.contains(r#"fill="url(#dots)""#));
    }

    #[test]
    fn single_stop_gradient_is_rejected() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.styling.gradient = Some(GradientSpec {
            kind: GradientKind::Radial,
            rotation: 0.0,
            stops: vec![GradientStop {
                offset: 0.0,
                color: "#FF6600".into(),
            }],
        });
        assert!(matches!(
            render_svg(&request),
            Err(Error::InvalidGradient(_))
        ));
    }

    #[test]
    fn bad_color_literals_are_rejected() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.styling.foreground_color = "magenta".into();
        assert!(matches!(render_svg(&request), Err(Error::InvalidColor(_))));
        assert!(matches!(render_png(&request), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn zero_pixel_size_is_rejected() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.pixel_size = 0;
        assert!(matches!(
            render_png(&request),
            Err(Error::InvalidDimension(0))
        ));
    }

    #[test]
    fn data_url_wraps_the_png_bytes() {
        let request = RenderRequest::new("tel:+84901234567");
        let url = render_data_url(&request).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let bytes = STANDARD
            .decode(url.trim_start_matches("data:image/png;base64,"))
            .unwrap();
        assert_eq!(bytes, render_png(&request).unwrap());
    }

    #[test]
    fn raster_corners_hold_the_finder_pattern() {
        let mut request = RenderRequest::new("https://shiba.pw");
        request.pixel_size = 290;
        request.margin_modules = 2;
        let image = render_image(&request).unwrap();
        // v2 symbol, 25 + 4 margin modules = 29 units at 10 px per unit.
        // Center of the top-left finder (module 5.5, 5.5 with margin).
        let probe = image.get_pixel(55, 55);
        assert_eq!(probe.0, [0, 0, 0, 255]);
        // Quiet zone stays background.
        let quiet = image.get_pixel(5, 5);
        assert_eq!(quiet.0, [255, 255, 255, 255]);
    }

    #[test]
    fn gradient_raster_interpolates_between_stops() {
        let paint = GradientPaint {
            kind: GradientKind::Linear,
            rotation: 0.0,
            stops: vec![
                PaintStop {
                    offset: 0.0,
                    color: [0, 0, 0, 255],
                    css: "#000000".into(),
                },
                PaintStop {
                    offset: 1.0,
                    color: [200, 100, 0, 255],
                    css: "#C86400".into(),
                },
            ],
        };
        assert_eq!(paint.color_at(0.0, 50.0, 100.0), [0, 0, 0, 255]);
        assert_eq!(paint.color_at(100.0, 50.0, 100.0), [200, 100, 0, 255]);
        assert_eq!(paint.color_at(50.0, 50.0, 100.0), [100, 50, 0, 255]);
    }
}
