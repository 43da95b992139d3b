pub mod color_set;
pub mod compositor;
pub mod extractor;
pub mod hsv;
pub mod layout;
pub mod mask;
pub mod metrics;
pub mod reducer;
pub mod wire;
