#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, load_png_marker, PngTarget};
