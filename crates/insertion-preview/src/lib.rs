#![warn(missing_docs)]
//! Insertion Preview - Headless Geometry Pipeline for Inline-Edit Overlays
//!
//! # Overview
//!
//! `insertion-preview` computes everything a code editor needs to preview a pending text
//! insertion: the ghost text to draw, how wide the result will be once rendered with syntax
//! highlighting, and where a highlighted box around it belongs on screen. It does not render;
//! the host receives render state through an [`OverlaySink`] and draws it with its own widgets.
//!
//! The pipeline tracks live editor state (document edits, scrolling, resizes, line height
//! changes) through a small reactive runtime and recomputes only what an input change affects.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  InsertionOverlay (reactive wiring + sink)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Overlay Path Builder (rounded outline)     │  ← Render Data
//! ├─────────────────────────────────────────────┤
//! │  Layout Geometry Engine (box corners)       │  ← Screen Space
//! ├─────────────────────────────────────────────┤
//! │  Width Measurer (tokenize + render lines)   │  ← Text Metrics
//! ├─────────────────────────────────────────────┤
//! │  Normalizer + Ghost Text Builder            │  ← Insertion Model
//! ├─────────────────────────────────────────────┤
//! │  Reactive Runtime (signals, memos, effects) │  ← Propagation
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use insertion_preview::{
//!     EditorLayoutInfo, EditorSignals, InsertionOverlay, InsertionRequest, MonospaceRenderer,
//!     NoTokenizer, OverlayConfig, OverlayServices, OverlaySink, OverlayPath, GhostText,
//!     GhostTextViewOptions, Runtime, TextDocument, UniformLineHeights,
//! };
//! use std::rc::Rc;
//!
//! struct NullSink;
//!
//! impl OverlaySink for NullSink {
//!     fn set_visible(&mut self, _: bool) {}
//!     fn set_min_content_width(&mut self, _: f64) {}
//!     fn set_overlay_path(&mut self, _: Option<&OverlayPath>) {}
//!     fn set_ghost_text(&mut self, _: Option<&GhostText>, _: &GhostTextViewOptions) {}
//! }
//!
//! let runtime = Runtime::new();
//! let editor = EditorSignals::new(
//!     &runtime,
//!     EditorLayoutInfo::new(30.0, 800.0, 600.0),
//!     Rc::new(UniformLineHeights::new(18.0)),
//! );
//! editor.attach_model(Rc::new(TextDocument::new("abc"))).unwrap();
//!
//! let request = runtime.signal(Some(InsertionRequest::new(1, 4, "def")));
//! let overlay = InsertionOverlay::new(
//!     &runtime,
//!     &editor,
//!     request,
//!     OverlayServices::new(Rc::new(NoTokenizer), Rc::new(MonospaceRenderer::new(8.0))),
//!     OverlayConfig::default(),
//!     Box::new(NullSink),
//! );
//! runtime.flush_effects().unwrap();
//!
//! let geometry = overlay.layout_geometry().unwrap();
//! assert_eq!(geometry.top_inner.x, 30.0);
//! assert_eq!(geometry.top_outer.x, 30.0 + 6.0 * 8.0);
//! ```
//!
//! # Module Description
//!
//! - [`reactive`] - Signals, memos, effects and disposal
//! - [`insertion`] - Insertion requests and normalization
//! - [`ghost_text`] - Ghost text model
//! - [`measure`] - Width measurement of the resulting lines
//! - [`geometry`] - Screen-space box geometry
//! - [`path`] - Outline path of the box
//! - [`overlay`] - The wired overlay component
//! - [`editor`] - Editor inputs as signals
//! - [`model`], [`tokens`], [`layout`] - Host collaborator traits and reference implementations
//! - [`config`] - Tunables and styling

pub mod config;
pub mod editor;
pub mod geometry;
pub mod ghost_text;
pub mod insertion;
pub mod layout;
pub mod line_ending;
pub mod measure;
pub mod model;
pub mod overlay;
pub mod path;
pub mod reactive;
mod text;
pub mod tokens;

pub use config::{ConfigError, OverlayConfig, OverlayStyle, ThemeColor};
pub use editor::EditorSignals;
pub use geometry::{
    EditorLayoutInfo, LayoutGeometry, Point, ScrollPosition, compute_layout_geometry,
    min_content_width,
};
pub use ghost_text::{GhostText, GhostTextPart, GhostTextViewOptions};
pub use insertion::{InsertionRequest, NormalizedInsertion, normalize_insertion};
pub use layout::{LineCoordinates, UniformLineHeights, WrapMode, WrappedLineHeights};
pub use measure::{LineRenderer, MonospaceRenderer, max_content_width, resulting_lines};
pub use model::{TextDocument, TextModel, TextRange, VersionCallback};
pub use overlay::{InsertionOverlay, OverlayServices, OverlaySink};
pub use path::{EdgeVisibility, OverlayPath, PathCommand, rounded_rectangle};
pub use reactive::{
    DisposableStore, Effect, Memo, NodeId, ReactiveError, Reader, Readable, Runtime, Shared,
    Signal,
};
pub use tokens::{LineTokens, NoTokenizer, StyleId, Token, Tokenizer};
