//! The map page, bundled into the binary.

pub const INDEX_HTML: &str = include_str!("index.html");
