//! A small structured SVG document model.
//!
//! Renderers build an [`SvgDocument`] out of nodes and defs and serialize
//! it exactly once. Post-processing steps such as logo injection append
//! nodes to the tree instead of splicing text into an already serialized
//! string, so the output always carries a single well-formed `</svg>`.

use std::fmt;

/// An SVG document with a pixel viewport and a user-unit view box.
///
/// The viewport (`width`/`height`) is the raster size in pixels; nodes are
/// laid out in view-box units and scale uniformly.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    view_width: f64,
    view_height: f64,
    defs: Vec<SvgDef>,
    nodes: Vec<SvgNode>,
}

/// A paint server or clip path referenced by id from nodes.
#[derive(Debug, Clone)]
pub enum SvgDef {
    /// Linear gradient with endpoints in user-space units.
    LinearGradient {
        id: String,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stops: Vec<(f32, String)>,
    },
    /// Radial gradient centered in user-space units.
    RadialGradient {
        id: String,
        cx: f64,
        cy: f64,
        r: f64,
        stops: Vec<(f32, String)>,
    },
    /// Rounded-rectangle clip path.
    ClipRect {
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
    },
}

/// Stroke paint applied on top of a shape's fill.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

/// A drawable element. `fill` accepts a color literal or a paint server
/// reference such as `url(#dots)`.
#[derive(Debug, Clone)]
pub enum SvgNode {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        fill: String,
        stroke: Option<Stroke>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: String,
        stroke: Option<Stroke>,
    },
    Path {
        d: String,
        fill: String,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        href: String,
        clip_path: Option<String>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        fill: String,
        font_size: f64,
        font_family: String,
    },
}

impl SvgDocument {
    pub fn new(width: u32, height: u32, view_width: f64, view_height: f64) -> Self {
        SvgDocument {
            width,
            height,
            view_width,
            view_height,
            defs: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, node: SvgNode) {
        self.nodes.push(node);
    }

    pub fn push_def(&mut self, def: SvgDef) {
        self.defs.push(def);
    }

    /// Viewport size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// View-box size in user units.
    pub fn view_box(&self) -> (f64, f64) {
        (self.view_width, self.view_height)
    }

    /// Serializes the whole tree to an XML string.
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.view_width, self.view_height
        )?;
        if !self.defs.is_empty() {
            writeln!(f, "<defs>")?;
            for def in &self.defs {
                write_def(f, def)?;
            }
            writeln!(f, "</defs>")?;
        }
        for node in &self.nodes {
            write_node(f, node)?;
        }
        write!(f, "</svg>")
    }
}

fn write_def(f: &mut fmt::Formatter<'_>, def: &SvgDef) -> fmt::Result {
    match def {
        SvgDef::LinearGradient {
            id,
            x1,
            y1,
            x2,
            y2,
            stops,
        } => {
            writeln!(
                f,
                r#"<linearGradient id="{}" gradientUnits="userSpaceOnUse" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}">"#,
                escape_xml(id)
            )?;
            write_stops(f, stops)?;
            writeln!(f, "</linearGradient>")
        }
        SvgDef::RadialGradient { id, cx, cy, r, stops } => {
            writeln!(
                f,
                r#"<radialGradient id="{}" gradientUnits="userSpaceOnUse" cx="{cx}" cy="{cy}" r="{r}">"#,
                escape_xml(id)
            )?;
            write_stops(f, stops)?;
            writeln!(f, "</radialGradient>")
        }
        SvgDef::ClipRect {
            id,
            x,
            y,
            width,
            height,
            rx,
        } => {
            write!(f, r#"<clipPath id="{}"><rect x="{x}" y="{y}" width="{width}" height="{height}""#, escape_xml(id))?;
            if *rx > 0.0 {
                write!(f, r#" rx="{rx}""#)?;
            }
            writeln!(f, "/></clipPath>")
        }
    }
}

fn write_stops(f: &mut fmt::Formatter<'_>, stops: &[(f32, String)]) -> fmt::Result {
    for (offset, color) in stops {
        writeln!(
            f,
            r#"<stop offset="{offset}" stop-color="{}"/>"#,
            escape_xml(color)
        )?;
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &SvgNode) -> fmt::Result {
    match node {
        SvgNode::Rect {
            x,
            y,
            width,
            height,
            rx,
            fill,
            stroke,
        } => {
            write!(
                f,
                r#"<rect x="{x}" y="{y}" width="{width}" height="{height}""#
            )?;
            if *rx > 0.0 {
                write!(f, r#" rx="{rx}""#)?;
            }
            write!(f, r#" fill="{}""#, escape_xml(fill))?;
            write_stroke(f, stroke)?;
            writeln!(f, "/>")
        }
        SvgNode::Circle {
            cx,
            cy,
            r,
            fill,
            stroke,
        } => {
            write!(f, r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{}""#, escape_xml(fill))?;
            write_stroke(f, stroke)?;
            writeln!(f, "/>")
        }
        SvgNode::Path { d, fill } => {
            writeln!(f, r#"<path d="{d}" fill="{}"/>"#, escape_xml(fill))
        }
        SvgNode::Image {
            x,
            y,
            width,
            height,
            href,
            clip_path,
        } => {
            write!(
                f,
                r#"<image x="{x}" y="{y}" width="{width}" height="{height}" preserveAspectRatio="xMidYMid meet""#
            )?;
            if let Some(clip) = clip_path {
                write!(f, r#" clip-path="url(#{})""#, escape_xml(clip))?;
            }
            writeln!(f, r#" href="{}"/>"#, escape_xml(href))
        }
        SvgNode::Text {
            x,
            y,
            content,
            fill,
            font_size,
            font_family,
        } => {
            writeln!(
                f,
                r#"<text x="{x}" y="{y}" fill="{}" font-family="{}" font-size="{font_size}" text-anchor="middle">{}</text>"#,
                escape_xml(fill),
                escape_xml(font_family),
                escape_xml(content)
            )
        }
    }
}

fn write_stroke(f: &mut fmt::Formatter<'_>, stroke: &Option<Stroke>) -> fmt::Result {
    if let Some(stroke) = stroke {
        write!(
            f,
            r#" stroke="{}" stroke-width="{}""#,
            escape_xml(&stroke.color),
            stroke.width
        )?;
    }
    Ok(())
}

/// Escapes XML metacharacters in attribute values and text content.
pub(crate) fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serializes_with_header_and_single_close() {
        let mut doc = SvgDocument::new(300, 300, 29.0, 29.0);
        doc.push(SvgNode::Rect {
            x: 0.0,
            y: 0.0,
            width: 29.0,
            height: 29.0,
            rx: 0.0,
            fill: "#FFFFFF".into(),
            stroke: None,
        });
        doc.push(SvgNode::Path {
            d: "M4,4h1v1h-1z".into(),
            fill: "#000000".into(),
        });
        let xml = doc.to_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(xml.contains(r#"width="300" height="300" viewBox="0 0 29 29""#));
        assert!(xml.ends_with("</svg>"));
        assert_eq!(xml.matches("</svg>").count(), 1);
    }

    #[test]
    fn appending_after_serialization_keeps_the_document_well_formed() {
        let mut doc = SvgDocument::new(100, 100, 25.0, 25.0);
        let _first = doc.to_xml();
        doc.push(SvgNode::Circle {
            cx: 12.5,
            cy: 12.5,
            r: 3.0,
            fill: "#FF0000".into(),
            stroke: None,
        });
        let xml = doc.to_xml();
        assert!(xml.contains("<circle"));
        assert_eq!(xml.matches("</svg>").count(), 1);
        assert!(xml.rfind("<circle").unwrap() < xml.rfind("</svg>").unwrap());
    }

    #[test]
    fn gradient_defs_carry_user_space_units() {
        let mut doc = SvgDocument::new(200, 200, 33.0, 33.0);
        doc.push_def(SvgDef::LinearGradient {
            id: "dots".into(),
            x1: 0.0,
            y1: 16.5,
            x2: 33.0,
            y2: 16.5,
            stops: vec![(0.0, "#FF0000".into()), (1.0, "#0000FF".into())],
        });
        let xml = doc.to_xml();
        assert!(xml.contains(r#"<linearGradient id="dots" gradientUnits="userSpaceOnUse""#));
        assert!(xml.contains(r##"<stop offset="0" stop-color="#FF0000"/>"##));
        assert!(xml.contains(r##"<stop offset="1" stop-color="#0000FF"/>"##));
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let mut doc = SvgDocument::new(10, 10, 10.0, 10.0);
        doc.push(SvgNode::Text {
            x: 5.0,
            y: 5.0,
            content: "scan <me> & win".into(),
            fill: "#000".into(),
            font_size: 2.0,
            font_family: "sans-serif".into(),
        });
        let xml = doc.to_xml();
        assert!(xml.contains("scan &lt;me&gt; &amp; win"));
        assert!(!xml.contains("<me>"));
    }

    #[test]
    fn whole_numbers_print_without_decimals() {
        let mut doc = SvgDocument::new(120, 120, 21.0, 21.0);
        doc.push(SvgNode::Rect {
            x: 4.0,
            y: 4.5,
            width: 6.0,
            height: 6.0,
            rx: 1.5,
            fill: "none".into(),
            stroke: Some(Stroke {
                color: "#000000".into(),
                width: 1.0,
            }),
        });
        let xml = doc.to_xml();
        assert!(xml.contains(r#"x="4" y="4.5" width="6" height="6" rx="1.5""#));
        assert!(xml.contains(r##"stroke="#000000" stroke-width="1""##));
    }
}
