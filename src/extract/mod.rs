// src/extract/mod.rs
// =============================================================================
// Link extraction.
//
// The crawler treats extraction as a pure function: HTML text and the URL it
// came from go in, absolute URLs come out. It never touches the network or
// the visited set, so it can be tested with plain strings.
// =============================================================================

mod html;

pub use html::extract_links;
