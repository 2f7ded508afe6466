//! SVG rasterization to PNG.
//!
//! Used where the direct raster path cannot reproduce the document on its
//! own, which today means frame labels (text shaping) and re-scaling one
//! rendered document to a batch of output sizes.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Rasterizes an SVG string to PNG bytes at the given pixel size.
///
/// The document is scaled to fill the target on both axes, so callers
/// keep the view-box aspect by passing a matching width and height.
pub fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension(width.min(height)));
    }
    render_tree(&parse_tree(svg)?, width, height)
}

/// Rasterizes one SVG document at several square edge lengths.
///
/// The document is parsed once and rendered per size, so a download bundle
/// of resolutions costs one parse. Keys of the returned map are the
/// requested sizes; duplicates collapse.
pub fn generate_sizes(svg: &str, sizes: &[u32]) -> Result<BTreeMap<u32, Vec<u8>>> {
    let tree = parse_tree(svg)?;
    let mut out = BTreeMap::new();
    for &size in sizes {
        if size == 0 {
            return Err(Error::InvalidDimension(0));
        }
        out.insert(size, render_tree(&tree, size, size)?);
    }
    Ok(out)
}

fn parse_tree(svg: &str) -> Result<usvg::Tree> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    let options = usvg::Options {
        fontdb: Arc::new(fontdb),
        ..usvg::Options::default()
    };
    usvg::Tree::from_str(svg, &options).map_err(|e| Error::Svg(e.to_string()))
}

fn render_tree(tree: &usvg::Tree, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(Error::InvalidDimension(width.min(height)))?;
    let scale_x = width as f32 / tree.size().width();
    let scale_y = height as f32 / tree.size().height();
    resvg::render(
        tree,
        tiny_skia::Transform::from_scale(scale_x, scale_y),
        &mut pixmap.as_mut(),
    );
    pixmap.encode_png().map_err(|e| Error::Svg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    const RED_SQUARE: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">"#,
        r##"<rect x="0" y="0" width="10" height="10" fill="#FF0000"/></svg>"##
    );

    #[test]
    fn rasterizes_at_the_requested_size() {
        let png = svg_to_png(RED_SQUARE, 64, 64).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert_eq!(decoded.to_rgba8().get_pixel(32, 32).0, [255, 0, 0, 255]);
    }

    #[test]
    fn scales_each_axis_to_the_target() {
        let png = svg_to_png(RED_SQUARE, 80, 20).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (80, 20));
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(matches!(
            svg_to_png(RED_SQUARE, 0, 64),
            Err(Error::InvalidDimension(0))
        ));
    }

    #[test]
    fn malformed_markup_is_rejected() {
        assert!(matches!(
            svg_to_png("<svg><rect", 32, 32),
            Err(Error::Svg(_))
        ));
    }

    #[test]
    fn batch_renders_every_size_once() {
        let sizes = generate_sizes(RED_SQUARE, &[16, 48, 16]).unwrap();
        assert_eq!(sizes.len(), 2);
        for (&size, png) in &sizes {
            let decoded = image::load_from_memory(png).unwrap();
            assert_eq!(decoded.dimensions(), (size, size));
        }
    }

    #[test]
    fn batch_rejects_zero_sizes() {
        assert!(matches!(
            generate_sizes(RED_SQUARE, &[32, 0]),
            Err(Error::InvalidDimension(0))
        ));
    }
}
