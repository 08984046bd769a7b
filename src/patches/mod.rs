pub mod label;
pub mod stats;

pub use label::{Labels, label_patches};
pub use stats::{PatchMetrics, PatchStats, patch_areas, patch_perimeters, size_ccdf};
