//! Vector index over resume chunks
//!
//! - flat: exhaustive inner-product search
//! - store: the index file and its metadata file, loaded and saved as a pair

pub mod flat;
pub mod store;

pub use flat::{FlatIndex, Hit};
pub use store::{is_consistent, load_from, IndexPaths, IndexStore};
