/// Generational handle: `(index, generation)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;

    #[test]
    fn handles_compare_by_index_then_generation() {
        let a = Handle::new(1, 0);
        let b = Handle::new(1, 1);
        let c = Handle::new(2, 0);
        assert_ne!(a, b);
        assert!(a < b);
        assert!(b < c);
    }
}
