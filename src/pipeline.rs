//! The end-to-end artifact pipeline.
//!
//! [`generate`] runs the full chain for one request: validate the typed
//! payload, encode it to its embedding string, generate the symbol, and
//! render it in the requested output format. [`ArtifactRequest`]
//! deserializes straight from the service's JSON request bodies, so the
//! HTTP layer stays a thin shell around this module.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::info;

use crate::content::{encode_content, ContentPayload};
use crate::error::Result;
use crate::raster;
use crate::render::{self, RenderRequest, DEFAULT_MARGIN_MODULES, DEFAULT_PIXEL_SIZE};
use crate::style::StylingOptions;
use crate::symbol::EccLevel;

/// One generation request, matching the wire format:
/// `{"type": ..., "data": {...}, "styling": {...}, "size": ..., "format": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRequest {
    #[serde(flatten)]
    pub payload: ContentPayload,
    #[serde(default)]
    pub styling: StylingOptions,
    /// Output edge length in pixels, margin and frame included.
    #[serde(default = "default_size")]
    pub size: u32,
    /// Quiet zone width in modules.
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default)]
    pub error_correction_level: EccLevel,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_size() -> u32 {
    DEFAULT_PIXEL_SIZE
}

fn default_margin() -> u32 {
    DEFAULT_MARGIN_MODULES
}

impl ArtifactRequest {
    /// A request with default geometry, styling and format.
    pub fn new(payload: ContentPayload) -> Self {
        ArtifactRequest {
            payload,
            styling: StylingOptions::default(),
            size: default_size(),
            margin: default_margin(),
            error_correction_level: EccLevel::default(),
            format: OutputFormat::default(),
        }
    }

    fn render_request(&self) -> RenderRequest {
        RenderRequest {
            content: encode_content(&self.payload),
            pixel_size: self.size,
            margin_modules: self.margin,
            ecc: self.error_correction_level,
            styling: self.styling.clone(),
        }
    }
}

/// Requested output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    DataUrl,
}

/// A finished render in one of the supported encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Png(Vec<u8>),
    Svg(String),
    DataUrl(String),
}

impl Artifact {
    /// The MIME type a service response should carry for this artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            Artifact::Png(_) => "image/png",
            Artifact::Svg(_) => "image/svg+xml",
            Artifact::DataUrl(_) => "text/plain",
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Artifact::Png(bytes) => bytes,
            Artifact::Svg(text) | Artifact::DataUrl(text) => text.into_bytes(),
        }
    }
}

/// Runs the whole pipeline for one request.
pub fn generate(request: &ArtifactRequest) -> Result<Artifact> {
    request.payload.validate()?;
    let render = request.render_request();
    info!(
        kind = request.payload.kind(),
        format = ?request.format,
        size = request.size,
        "generating artifact"
    );
    match request.format {
        OutputFormat::Png => Ok(Artifact::Png(render::render_png(&render)?)),
        OutputFormat::Svg => Ok(Artifact::Svg(render::render_svg(&render)?)),
        OutputFormat::DataUrl => Ok(Artifact::DataUrl(render::render_data_url(&render)?)),
    }
}

/// Renders one payload as PNG at several output sizes.
///
/// The symbol is encoded and styled once; every target size is rasterized
/// from the same document, so all outputs agree module for module.
pub fn generate_sizes(
    request: &ArtifactRequest,
    sizes: &[u32],
) -> Result<BTreeMap<u32, Vec<u8>>> {
    request.payload.validate()?;
    let svg = render::render_svg(&request.render_request())?;
    raster::generate_sizes(&svg, sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{DotStyle, LogoOptions};
    use image::GenericImageView;

    fn decode_png(png: &[u8]) -> String {
        let luma = image::load_from_memory(png).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(luma);
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one symbol in the image");
        let (_meta, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn url_payload_round_trips_through_png() {
        let request = ArtifactRequest::new(ContentPayload::Url {
            url: "https://shiba.pw".into(),
        });
        let Artifact::Png(png) = generate(&request).unwrap() else {
            panic!("expected png artifact");
        };
        assert_eq!(decode_png(&png), "https://shiba.pw");
    }

    #[test]
    fn wifi_payload_round_trips_with_escapes_intact() {
        let request = ArtifactRequest::new(ContentPayload::Wifi {
            ssid: "Cafe;Corner".into(),
            password: Some("p4ss,word".into()),
            encryption: Default::default(),
            hidden: false,
        });
        let Artifact::Png(png) = generate(&request).unwrap() else {
            panic!("expected png artifact");
        };
        assert_eq!(
            decode_png(&png),
            "WIFI:S:Cafe\\;Corner;T:WPA;P:p4ss\\,word;;"
        );
    }

    #[test]
    fn rounded_modules_stay_decodable() {
        let mut request = ArtifactRequest::new(ContentPayload::Url {
            url: "https://shiba.pw/r/style".into(),
        });
        request.styling.dot_style = DotStyle::Rounded;
        let Artifact::Png(png) = generate(&request).unwrap() else {
            panic!("expected png artifact");
        };
        assert_eq!(decode_png(&png), "https://shiba.pw/r/style");
    }

    #[test]
    fn logo_overlay_stays_decodable() {
        let logo_png = {
            use std::io::Cursor;
            let img = image::RgbaImage::from_pixel(32, 32, image::Rgba([30, 90, 200, 255]));
            let mut bytes = Vec::new();
            img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            bytes
        };
        let mut request = ArtifactRequest::new(ContentPayload::Url {
            url: "https://shiba.pw".into(),
        });
        request.styling.logo = Some(LogoOptions::new(logo_png));
        let Artifact::Png(png) = generate(&request).unwrap() else {
            panic!("expected png artifact");
        };
        assert_eq!(decode_png(&png), "https://shiba.pw");
    }

    #[test]
    fn request_deserializes_from_service_json() {
        let request: ArtifactRequest = serde_json::from_str(
            r#"{
                "type": "WIFI",
                "data": {"ssid": "Cafe", "password": "p4ss"},
                "size": 256,
                "errorCorrectionLevel": "Q",
                "format": "svg",
                "styling": {"dotStyle": "dot"}
            }"#,
        )
        .unwrap();
        assert_eq!(request.size, 256);
        assert_eq!(request.margin, 4);
        assert_eq!(request.error_correction_level, EccLevel::Quartile);
        assert_eq!(request.format, OutputFormat::Svg);
        assert_eq!(request.styling.dot_style, DotStyle::Dot);

        let Artifact::Svg(svg) = generate(&request).unwrap() else {
            panic!("expected svg artifact");
        };
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn data_url_format_is_self_describing() {
        let mut request = ArtifactRequest::new(ContentPayload::Text {
            text: "hello".into(),
        });
        request.format = OutputFormat::DataUrl;
        let artifact = generate(&request).unwrap();
        assert_eq!(artifact.content_type(), "text/plain");
        let Artifact::DataUrl(url) = artifact else {
            panic!("expected data url artifact");
        };
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn invalid_payloads_are_rejected_before_rendering() {
        let request = ArtifactRequest::new(ContentPayload::Url { url: "".into() });
        assert!(generate(&request).is_err());
    }

    #[test]
    fn content_types_match_formats() {
        assert_eq!(Artifact::Png(Vec::new()).content_type(), "image/png");
        assert_eq!(Artifact::Svg(String::new()).content_type(), "image/svg+xml");
    }

    #[test]
    fn generate_sizes_rasterizes_each_target() {
        let request = ArtifactRequest::new(ContentPayload::Url {
            url: "https://shiba.pw".into(),
        });
        let outputs = generate_sizes(&request, &[64, 256]).unwrap();
        assert_eq!(outputs.len(), 2);
        for (&size, png) in &outputs {
            let decoded = image::load_from_memory(png).unwrap();
            assert_eq!(decoded.dimensions(), (size, size));
        }
        // The larger output is comfortably decodable.
        assert_eq!(decode_png(&outputs[&256]), "https://shiba.pw");
    }
}
