//! Field segmentation for flattened listing text
//!
//! Rendered cards lose their tag boundaries once read through `innerText`.
//! This module recovers named fields from that blob using ordered anchor
//! keywords and standalone patterns, and owns the sanitizer every stored
//! value passes through.

pub mod anchors;
pub mod parser;
pub mod sanitize;

pub use anchors::{Anchor, AnchorHit, AnchorTable, PatternField, SegmentRule};
pub use parser::segment;
pub use sanitize::{ESCAPE_MARKER, sanitize, sanitize_opt};
