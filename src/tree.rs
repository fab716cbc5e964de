use std::cmp::Ordering;

use thiserror::Error;
use tracing::debug;

use crate::Coord;
use crate::quadrant::Quadrant;
use crate::region::Location;
use crate::region::Region;
use crate::tile;
use crate::tile::Tile;
use crate::tile::Tiles;

/// Largest depth whose square sidelength still fits in a [`Coord`].
const MAX_DEPTH: u32 = Coord::BITS - 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid dimensions {length}x{width}, both must be positive")]
    InvalidDimensions { length: Coord, width: Coord },

    #[error("Dimensions {length}x{width} are too large to address")]
    DimensionsTooLarge { length: Coord, width: Coord },

    #[error("Location ({x}, {y}) is out of bounds for a {length}x{width} tree")]
    OutOfBounds {
        x: Coord,
        y: Coord,
        length: Coord,
        width: Coord,
    },

    #[error("Tree is deeper than its dimensions allow at ({x}, {y})")]
    StructuralInconsistency { x: Coord, y: Coord },
}

/// A `length` by `width` grid of values, stored as a fused [`Quadrant`].
///
/// The root spans a `2^depth` square, the smallest one holding both dimensions. The visible
/// grid sits centered inside that square: location `(x, y)` lives at `(x + dx, y + dy)` of the
/// square, with `(dx, dy)` given by [`QuadTree::offsets`].
///
/// Point writes ([`QuadTree::set`], [`QuadTree::update`]) keep the root fused.
/// [`QuadTree::map`] does not, pair it with [`QuadTree::fuse`] when compression matters.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QuadTree<T> {
    root: Quadrant<T>,
    length: Coord,
    width: Coord,
    depth: u32,
}

/// Smallest `d` such that `2^d >= max(length, width)`.
fn depth_for(length: Coord, width: Coord) -> Result<u32, TreeError> {
    if length <= 0 || width <= 0 {
        return Err(TreeError::InvalidDimensions { length, width });
    }

    let depth = (length.max(width) as u64).next_power_of_two().trailing_zeros();

    // every cell count must fit both `Coord` and `usize`
    let cells = length
        .checked_mul(width)
        .and_then(|cells| usize::try_from(cells).ok());

    if depth > MAX_DEPTH || cells.is_none() {
        return Err(TreeError::DimensionsTooLarge { length, width });
    }

    Ok(depth)
}

impl<T> QuadTree<T> {
    /// Create a `length` by `width` tree where every cell holds `value`.
    pub fn new(length: Coord, width: Coord, value: T) -> Result<Self, TreeError> {
        Self::from_root(Quadrant::Leaf(value), length, width)
    }

    /// Wrap an existing quadrant. The root is kept as-is, it is not fused.
    pub fn from_root(root: Quadrant<T>, length: Coord, width: Coord) -> Result<Self, TreeError> {
        let depth = depth_for(length, width)?;

        debug!(length, width, depth, "building tree");

        Ok(QuadTree {
            root,
            length,
            width,
            depth,
        })
    }

    /// `(length, width)`
    pub fn dimensions(&self) -> (Coord, Coord) {
        (self.length, self.width)
    }

    /// Number of visible cells.
    pub fn area(&self) -> Coord {
        self.length * self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn root(&self) -> &Quadrant<T> {
        &self.root
    }

    pub fn into_root(self) -> Quadrant<T> {
        self.root
    }

    fn side(&self) -> Coord {
        1 << self.depth
    }

    /// Where the visible grid's top left corner sits inside the root square.
    pub fn offsets(&self) -> (Coord, Coord) {
        let side = self.side();

        ((side - self.length) / 2, (side - self.width) / 2)
    }

    /// The whole square spanned by the root, in its own frame.
    pub fn tree_region(&self) -> Region {
        let side = self.side();

        Region::new(0, 0, side - 1, side - 1)
    }

    /// The visible grid, in the root square's frame.
    pub fn boundaries(&self) -> Region {
        let (dx, dy) = self.offsets();

        Region::new(dx, dy, dx + self.length - 1, dy + self.width - 1)
    }

    pub fn in_bounds(&self, location: impl Into<Location>) -> bool {
        let Location { x, y } = location.into();

        0 <= x && x < self.length && 0 <= y && y < self.width
    }

    /// Checks bounds and moves `location` into the root square's frame.
    fn internal(&self, location: Location) -> Result<(Coord, Coord), TreeError> {
        let Location { x, y } = location;

        if !self.in_bounds(location) {
            return Err(TreeError::OutOfBounds {
                x,
                y,
                length: self.length,
                width: self.width,
            });
        }

        let (dx, dy) = self.offsets();

        Ok((x + dx, y + dy))
    }

    pub fn get(&self, location: impl Into<Location>) -> Result<&T, TreeError> {
        let location = location.into();
        let (x, y) = self.internal(location)?;

        self.root
            .get(self.depth, x, y)
            .map_err(|_| inconsistency(location))
    }

    /// Every leaf as a [`Tile`] over the cells it covers, top-left first.
    pub fn tiles(&self) -> Tiles<'_, T> {
        Tiles::new(&self.root, self.tree_region(), self.boundaries())
    }

    /// Every cell's value, tile by tile. This is not row-major order, see
    /// [`QuadTree::row_major`] for that.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        tile::expand(self.tiles())
    }

    /// Every cell's value, one row after the other.
    pub fn row_major(&self) -> Vec<&T> {
        let length = self.length as usize;
        let mut cells = vec![None; length * self.width as usize];

        for Tile { value, region } in self.tiles() {
            for y in region.top..=region.bottom {
                let row = y as usize * length;

                for x in region.left..=region.right {
                    cells[row + x as usize] = Some(value);
                }
            }
        }

        debug_assert!(
            cells.iter().all(Option::is_some),
            "tiles left a visible cell uncovered"
        );

        cells.into_iter().flatten().collect()
    }

    /// Folds over every cell. The visiting order follows the tiles, so `f` should not depend on
    /// it.
    pub fn fold<B>(&self, init: B, f: impl FnMut(B, &T) -> B) -> B {
        self.values().fold(init, f)
    }

    /// Folds over tiles instead of cells.
    pub fn fold_tiles<B>(&self, init: B, f: impl FnMut(B, Tile<&T>) -> B) -> B {
        self.tiles().fold(init, f)
    }

    pub fn filter_tiles(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<Tile<&T>> {
        self.tiles().filter(|t| predicate(t.value)).collect()
    }

    /// Every cell whose value matches `predicate`.
    pub fn filter(&self, predicate: impl FnMut(&T) -> bool) -> Vec<&T> {
        tile::expand(self.filter_tiles(predicate)).collect()
    }

    /// Tiles stably sorted on their values.
    pub fn sort_tiles_by(&self, mut compare: impl FnMut(&T, &T) -> Ordering) -> Vec<Tile<&T>> {
        let mut tiles: Vec<_> = self.tiles().collect();
        tiles.sort_by(|a, b| compare(a.value, b.value));

        tiles
    }

    /// Every cell's value, stably sorted.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) -> Vec<&T> {
        tile::expand(self.sort_tiles_by(compare)).collect()
    }

    /// Applies `f` to every leaf. The result keeps this tree's shape and may not be fused.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> QuadTree<U> {
        QuadTree {
            root: self.root.map(f),
            length: self.length,
            width: self.width,
            depth: self.depth,
        }
    }
}

impl<T: PartialEq> QuadTree<T> {
    /// Write `value` at `location`. The tree stays fused.
    pub fn set(&mut self, location: impl Into<Location>, value: T) -> Result<(), TreeError>
    where
        T: Clone,
    {
        let location = location.into();
        let (x, y) = self.internal(location)?;

        self.root
            .set(self.depth, x, y, value)
            .map_err(|_| inconsistency(location))
    }

    /// Replace the value at `location` with `f` of it. The tree stays fused.
    pub fn update(
        &mut self,
        location: impl Into<Location>,
        f: impl FnOnce(&T) -> T,
    ) -> Result<(), TreeError>
    where
        T: Clone,
    {
        let location = location.into();
        let value = f(self.get(location)?);

        self.set(location, value)
    }

    pub fn contains_value(&self, value: &T) -> bool {
        self.tiles().any(|t| t.value == value)
    }

    /// Collapse every node of four equal leaves, restoring compression after [`QuadTree::map`].
    pub fn fuse(self) -> Self {
        let before = self.root.leaf_count();
        let root = self.root.fuse_all();

        debug!(before, after = root.leaf_count(), "fused tree");

        QuadTree { root, ..self }
    }

    pub fn is_fused(&self) -> bool {
        self.root.is_fused()
    }
}

fn inconsistency(location: Location) -> TreeError {
    TreeError::StructuralInconsistency {
        x: location.x,
        y: location.y,
    }
}

#[cfg(test)]
mod test {
    use super::QuadTree;
    use super::TreeError;
    use crate::Coord;
    use crate::quadrant::Quadrant;
    use crate::region::Region;

    #[test]
    fn depth_from_dimensions() {
        let depth = |l, w| QuadTree::new(l, w, ()).unwrap().depth();

        assert_eq!(depth(1, 1), 0);
        assert_eq!(depth(2, 2), 1);
        assert_eq!(depth(5, 5), 3);
        assert_eq!(depth(8, 8), 3);
        assert_eq!(depth(9, 1), 4);
        assert_eq!(depth(1, 9), 4);
    }

    #[test]
    fn invalid_dimensions() {
        assert_eq!(
            QuadTree::new(0, 5, 'x'),
            Err(TreeError::InvalidDimensions {
                length: 0,
                width: 5
            })
        );
        assert!(QuadTree::new(3, -1, 'x').is_err());
    }

    #[test]
    fn too_large() {
        let huge = 1 << 62;

        #[cfg(target_pointer_width = "64")]
        assert!(QuadTree::new(huge, 1, 'x').is_ok());
        assert_eq!(
            QuadTree::new(huge + 1, 1, 'x'),
            Err(TreeError::DimensionsTooLarge {
                length: huge + 1,
                width: 1
            })
        );
    }

    #[test]
    fn cell_count_must_fit() {
        let side = 1 << 32;

        assert_eq!(
            QuadTree::new(side, side, 0u8),
            Err(TreeError::DimensionsTooLarge {
                length: side,
                width: side
            })
        );
        assert_eq!(
            QuadTree::new(Coord::MAX / 2 + 1, 2, 0u8),
            Err(TreeError::DimensionsTooLarge {
                length: Coord::MAX / 2 + 1,
                width: 2
            })
        );

        #[cfg(target_pointer_width = "64")]
        {
            let t = QuadTree::new(1 << 31, 1 << 31, 0u8).unwrap();
            let total: Coord = t.tiles().map(|tile| tile.area()).sum();

            assert_eq!(t.area(), 1 << 62);
            assert_eq!(total, 1 << 62);
        }
    }

    #[test]
    fn row_major_matches_get_with_padding() {
        let mut t = QuadTree::new(5, 3, 0).unwrap();
        for (i, loc) in [(0, 0), (4, 0), (2, 1), (1, 2), (4, 2)].into_iter().enumerate() {
            t.set(loc, i + 1).unwrap();
        }

        let cells = t.row_major();
        assert_eq!(cells.len(), 15);

        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(cells[(y * 5 + x) as usize], t.get((x, y)).unwrap());
            }
        }
    }

    #[test]
    fn offsets_center_the_grid() {
        let t = QuadTree::new(5, 3, 0).unwrap();

        assert_eq!(t.offsets(), (1, 2));
        assert_eq!(t.tree_region(), Region::new(0, 0, 7, 7));
        assert_eq!(t.boundaries(), Region::new(1, 2, 5, 4));
    }

    #[test]
    fn out_of_bounds() {
        let mut t = QuadTree::new(3, 3, 'x').unwrap();

        for loc in [(3, 0), (-1, 0), (0, 3), (0, -1)] {
            let err = TreeError::OutOfBounds {
                x: loc.0,
                y: loc.1,
                length: 3,
                width: 3,
            };

            assert_eq!(t.get(loc), Err(err));
            assert_eq!(t.set(loc, 'y'), Err(err));
            assert_eq!(t.update(loc, |_| 'y'), Err(err));
        }

        assert_eq!(t.root(), &Quadrant::Leaf('x'));
    }

    #[test]
    fn update_applies_function() {
        let mut t = QuadTree::new(4, 2, 10).unwrap();

        t.update((3, 1), |v| v + 1).unwrap();
        t.update((3, 1), |v| v * 2).unwrap();

        assert_eq!(t.get((3, 1)), Ok(&22));
        assert_eq!(t.get((2, 1)), Ok(&10));
        assert!(t.is_fused());
    }

    #[test]
    fn too_deep_root_is_inconsistent() {
        let deep = Quadrant::node(
            Quadrant::Leaf(1),
            Quadrant::Leaf(2),
            Quadrant::Leaf(3),
            Quadrant::Leaf(4),
        );
        let mut t = QuadTree::from_root(deep, 1, 1).unwrap();

        let err = TreeError::StructuralInconsistency { x: 0, y: 0 };
        assert_eq!(t.get((0, 0)), Err(err));
        assert_eq!(t.set((0, 0), 5), Err(err));
    }

    #[test]
    fn row_major_of_non_square() {
        let mut t = QuadTree::new(3, 2, '.').unwrap();

        t.set((2, 0), 'a').unwrap();
        t.set((0, 1), 'b').unwrap();

        let cells: String = t.row_major().into_iter().collect();

        assert_eq!(cells, "..ab..");
    }

    #[test]
    fn contains_value() {
        let mut t = QuadTree::new(6, 6, false).unwrap();

        assert!(!t.contains_value(&true));

        t.set((5, 5), true).unwrap();

        assert!(t.contains_value(&true));
        assert!(t.contains_value(&false));
    }

    #[test]
    fn fuse_after_map() {
        let mut t = QuadTree::new(4, 4, 0u8).unwrap();
        t.set((0, 0), 1).unwrap();
        t.set((3, 3), 2).unwrap();

        let mapped = t.map(|_| 'z');
        assert!(!mapped.is_fused());

        let fused = mapped.fuse();
        assert!(fused.is_fused());
        assert_eq!(fused.root(), &Quadrant::Leaf('z'));
        assert_eq!(fused.dimensions(), (4, 4));
    }
}
