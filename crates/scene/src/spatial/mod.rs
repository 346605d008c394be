pub mod screen_index;

pub use screen_index::*;
