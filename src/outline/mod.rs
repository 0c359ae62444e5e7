pub mod fold;
pub mod navigate;
pub mod render;

pub use fold::FoldSet;
pub use render::{Outline, FOLD_MARKER};
