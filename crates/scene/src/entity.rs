use foundation::handles::Handle;

/// Opaque identity of a labelled object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub Handle);

impl EntityId {
    pub fn new(index: u32) -> Self {
        EntityId(Handle::new(index, 0))
    }
}
