//! # shibaqr
//!
//! A Rust library for turning typed content into styled, scannable QR codes.
//!
//! `shibaqr` encodes structured payloads (URLs, Wi-Fi credentials, vCards and
//! more) into their standard embedding strings, generates QR Code Model 2
//! symbols for them, and renders the result as SVG, PNG, or a base64 data URL.
//! Rendering supports custom colors, gradients, dot and corner styles, frames
//! with caption text, and centered logo overlays on both raster and vector
//! output.
//!
//! ## Features
//!
//! - Typed content payloads: URL, text, email, phone, SMS, Wi-Fi, vCard,
//!   location, and raw passthrough.
//! - Full Model 2 symbol generation: versions 1 to 40, four error correction
//!   levels, automatic version and mask selection.
//! - SVG and PNG rendering with solid or gradient foregrounds, square,
//!   rounded, and dot module styles, and framed captions.
//! - Logo embedding with aspect-fit scaling, padding, and rounded corners.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! shibaqr = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate an SVG for a URL:
//!
//! ```rust
//! use shibaqr::content::ContentPayload;
//! use shibaqr::pipeline::{generate, Artifact, ArtifactRequest, OutputFormat};
//!
//! fn main() {
//!     let mut request = ArtifactRequest::new(ContentPayload::Url {
//!         url: "https://shiba.pw".into(),
//!     });
//!     request.format = OutputFormat::Svg;
//!     match generate(&request).expect("failed to render") {
//!         Artifact::Svg(svg) => assert!(svg.contains("<svg")),
//!         _ => unreachable!(),
//!     }
//! }
//! ```
//!
//! Encode a payload without rendering it:
//!
//! ```rust
//! use shibaqr::content::{encode_content, ContentPayload};
//!
//! fn main() {
//!     let wifi = ContentPayload::Wifi {
//!         ssid: "Cafe".into(),
//!         password: Some("p4ss".into()),
//!         encryption: Default::default(),
//!         hidden: false,
//!     };
//!     assert_eq!(encode_content(&wifi), "WIFI:S:Cafe;T:WPA;P:p4ss;;");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`content`]: Typed payloads and their embedding-string encodings.
//! - [`symbol`]: QR Code Model 2 symbol generation.
//! - [`style`]: Styling options shared by every renderer.
//! - [`render`]: SVG and PNG rendering of generated symbols.
//! - [`logo`]: Logo compositing for raster and vector output.
//! - [`svg`]: The structured SVG document tree the renderers build.
//! - [`raster`]: SVG-to-PNG rasterization.
//! - [`pipeline`]: The end-to-end request pipeline and batch sizing.
//! - [`error`]: Error and result types.

pub mod content;
pub mod error;
pub mod logo;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod style;
pub mod svg;
pub mod symbol;
