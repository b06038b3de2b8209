//! UI layer for scalarscope using egui.

// Pixel math converts between counts, floats and color channels on purpose
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]

pub mod histogram_ui;
pub mod quantity_ui;

pub use histogram_ui::*;
pub use quantity_ui::*;
