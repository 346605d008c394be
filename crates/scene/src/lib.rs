pub mod entity;
pub mod spatial;
pub mod view;
pub mod visibility;

pub use entity::EntityId;
pub use view::*;
pub use visibility::*;
