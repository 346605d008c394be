use foundation::math::Vec2;
use rstar::primitives::GeomWithData;
use rstar::{RStarInsertionStrategy, RTree, RTreeParams};

/// Node capacity used for every screen index.
pub const SCREEN_INDEX_NODE_SIZE: usize = 64;

/// Tree parameters with [`SCREEN_INDEX_NODE_SIZE`]-wide nodes.
pub struct ScreenIndexParams;

impl RTreeParams for ScreenIndexParams {
    const MIN_SIZE: usize = SCREEN_INDEX_NODE_SIZE / 4;
    const MAX_SIZE: usize = SCREEN_INDEX_NODE_SIZE;
    const REINSERTION_COUNT: usize = SCREEN_INDEX_NODE_SIZE / 4;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Static 2D point index over screen coordinates.
///
/// Built once per declutter pass; results refer to positions in the slice
/// passed to [`ScreenIndex::build`].
///
/// Ordering contract:
/// - `within` returns ordinals in ascending order, without duplicates.
pub struct ScreenIndex {
    tree: RTree<IndexedPoint, ScreenIndexParams>,
}

impl ScreenIndex {
    /// Bulk-loads `points`. Non-finite coordinates are left out of the index.
    pub fn build(points: &[Vec2]) -> Self {
        let items: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .map(|(i, p)| GeomWithData::new([p.x, p.y], i))
            .collect();
        Self {
            tree: RTree::bulk_load_with_params(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ordinals of all points within `radius` (inclusive) of `(x, y)`.
    pub fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) || radius < 0.0 {
            return Vec::new();
        }
        let mut hits: Vec<usize> = self
            .tree
            .locate_within_distance([x, y], radius * radius)
            .map(|p| p.data)
            .collect();
        // Tree traversal order is not meaningful; callers rely on index order.
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

impl std::fmt::Debug for ScreenIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenIndex")
            .field("len", &self.len())
            .finish()
    }
}
