pub mod compress;
pub mod index;
pub mod model;

pub use compress::{compress, DisplayNode};
pub use index::relative_segments;
pub use model::{Entry, NodeId, Tree};
