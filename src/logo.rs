//! Logo compositing over rendered symbols.
//!
//! The raster path paints an opaque backdrop box into the center of the
//! PNG canvas and alpha-blends the aspect-fitted logo on top. The vector
//! path appends the same geometry to the [`SvgDocument`] tree as a rect
//! and an embedded `<image>` data URL. In both cases the caller is
//! responsible for having encoded the symbol at [`EccLevel::Quartile`] or
//! better; [`RenderRequest::effective_ecc`] does this automatically.
//!
//! [`EccLevel::Quartile`]: crate::symbol::EccLevel::Quartile
//! [`RenderRequest::effective_ecc`]: crate::render::RenderRequest::effective_ecc

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::imageops::FilterType;
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::style::{parse_hex_color, LogoOptions};
use crate::svg::{SvgDef, SvgDocument, SvgNode};

/// Composites the logo into the center of a rendered canvas.
///
/// The backdrop box edge is `size_percent` of the canvas edge; the logo is
/// resized to fit the box minus its margin while keeping its aspect ratio,
/// then centered. Rounded corners are applied as an antialiased coverage
/// mask to the backdrop and the logo alike, so nothing paints outside the
/// box outline; the same geometry the SVG path expresses as a clip path.
pub fn overlay_logo(canvas: &mut RgbaImage, logo: &LogoOptions) -> Result<()> {
    let edge = canvas.width().min(canvas.height());
    let geometry = LogoGeometry::for_edge(edge, logo)?;
    let backdrop = parse_hex_color(&logo.background_color)?;

    let source = image::load_from_memory(&logo.image)?;
    let resized = source
        .resize(geometry.inner, geometry.inner, FilterType::Lanczos3)
        .to_rgba8();

    let box_size = f64::from(geometry.box_size);
    let radius = f64::from(geometry.radius);
    for dy in 0..geometry.box_size {
        for dx in 0..geometry.box_size {
            let coverage =
                corner_coverage(f64::from(dx) + 0.5, f64::from(dy) + 0.5, box_size, radius);
            if coverage <= 0.0 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(geometry.offset + dx, geometry.offset + dy);
            for (channel, &target) in pixel.0.iter_mut().zip(backdrop.iter()) {
                let blended =
                    f64::from(*channel) + (f64::from(target) - f64::from(*channel)) * coverage;
                *channel = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    // Blend the logo through the same rounded mask the backdrop used, in
    // box-local coordinates, so its corners never escape the box outline.
    let lx = geometry.offset + (geometry.box_size - resized.width()) / 2;
    let ly = geometry.offset + (geometry.box_size - resized.height()) / 2;
    for (dx, dy, src) in resized.enumerate_pixels() {
        let (cx, cy) = (lx + dx, ly + dy);
        let coverage = corner_coverage(
            f64::from(cx - geometry.offset) + 0.5,
            f64::from(cy - geometry.offset) + 0.5,
            box_size,
            radius,
        );
        let alpha = f64::from(src[3]) / 255.0 * coverage;
        if alpha <= 0.0 {
            continue;
        }
        let pixel = canvas.get_pixel_mut(cx, cy);
        for (channel, target) in pixel.0.iter_mut().zip([src[0], src[1], src[2], 255]) {
            let blended = f64::from(*channel) + (f64::from(target) - f64::from(*channel)) * alpha;
            *channel = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

/// Appends the logo backdrop and image nodes to an SVG symbol document.
///
/// The geometry matches [`overlay_logo`] pixel for pixel: user-unit
/// positions are derived from the document's pixel viewport, and the logo
/// bytes travel inline as a base64 data URL.
pub fn add_logo_to_svg(doc: &mut SvgDocument, logo: &LogoOptions) -> Result<()> {
    parse_hex_color(&logo.background_color)?;
    let (pixel_width, _) = doc.pixel_size();
    let (view_width, _) = doc.view_box();
    let geometry = LogoGeometry::for_edge(pixel_width, logo)?;
    let units_per_px = view_width / f64::from(pixel_width);

    let offset = f64::from(geometry.offset) * units_per_px;
    let box_units = f64::from(geometry.box_size) * units_per_px;
    let margin_units = f64::from(logo.margin) * units_per_px;
    let radius_units = f64::from(geometry.radius) * units_per_px;

    let format = image::guess_format(&logo.image)?;
    let href = format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(&logo.image)
    );

    let clip = if geometry.radius > 0 {
        doc.push_def(SvgDef::ClipRect {
            id: "logo-clip".into(),
            x: offset,
            y: offset,
            width: box_units,
            height: box_units,
            rx: radius_units,
        });
        Some("logo-clip".to_owned())
    } else {
        None
    };

    doc.push(SvgNode::Rect {
        x: offset,
        y: offset,
        width: box_units,
        height: box_units,
        rx: radius_units,
        fill: logo.background_color.clone(),
        stroke: None,
    });
    doc.push(SvgNode::Image {
        x: offset + margin_units,
        y: offset + margin_units,
        width: box_units - 2.0 * margin_units,
        height: box_units - 2.0 * margin_units,
        href,
        clip_path: clip,
    });
    Ok(())
}

/// Pixel geometry of the backdrop box on a square canvas.
struct LogoGeometry {
    box_size: u32,
    offset: u32,
    inner: u32,
    radius: u32,
}

impl LogoGeometry {
    fn for_edge(edge: u32, logo: &LogoOptions) -> Result<LogoGeometry> {
        if edge == 0 {
            return Err(Error::InvalidDimension(0));
        }
        let percent = f64::from(logo.size_percent.clamp(1.0, 90.0));
        let box_size = (f64::from(edge) * percent / 100.0).round() as u32;
        let offset = (edge - box_size) / 2;
        let margin = logo.margin.min(box_size / 2);
        let inner = box_size - 2 * margin;
        if inner == 0 {
            return Err(Error::InvalidDimension(inner));
        }
        Ok(LogoGeometry {
            box_size,
            offset,
            inner,
            radius: logo.corner_radius.min(box_size / 2),
        })
    }
}

/// Coverage of a rounded square at a local sample point. Only the four
/// corner arcs get partial values; everything else inside is 1.
fn corner_coverage(x: f64, y: f64, size: f64, radius: f64) -> f64 {
    if radius <= 0.0 {
        return 1.0;
    }
    let cx = if x < radius {
        radius
    } else if x > size - radius {
        size - radius
    } else {
        return 1.0;
    };
    let cy = if y < radius {
        radius
    } else if y > size - radius {
        size - radius
    } else {
        return 1.0;
    };
    let dist = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
    (radius + 0.5 - dist).clamp(0.0, 1.0)
}
