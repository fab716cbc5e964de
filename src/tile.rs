use std::iter::FusedIterator;

use crate::Coord;
use crate::quadrant::Child;
use crate::quadrant::Quadrant;
use crate::region::Region;

/// A value together with the rectangle of cells over which it holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Tile<T> {
    pub value: T,
    pub region: Region,
}

impl<T> Tile<T> {
    pub fn new(value: T, region: Region) -> Self {
        Tile { value, region }
    }

    /// Number of cells covered by the tile.
    pub fn area(&self) -> Coord {
        self.region.area()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tile<U> {
        Tile {
            value: f(self.value),
            region: self.region,
        }
    }
}

/// Repeats each tile's value once per cell it covers.
pub fn expand<'a, T, I>(tiles: I) -> impl Iterator<Item = &'a T>
where
    T: 'a,
    I: IntoIterator<Item = Tile<&'a T>>,
{
    tiles
        .into_iter()
        .flat_map(|tile| std::iter::repeat_n(tile.value, tile.area() as usize))
}

/// Walks a quadrant depth-first (top-left, top-right, bottom-left, bottom-right) and yields one
/// [`Tile`] per leaf, clipped to `bounds` and expressed relative to its top left corner.
///
/// Subtrees that lie entirely outside of `bounds` are never visited, so every yielded tile
/// covers at least one cell.
pub struct Tiles<'a, T> {
    stack: Vec<(Region, &'a Quadrant<T>)>,
    bounds: Region,
}

impl<'a, T> Tiles<'a, T> {
    /// `square` is the region covered by `root`, `bounds` the visible part of it. Both are in the
    /// same (internal) frame.
    pub fn new(root: &'a Quadrant<T>, square: Region, bounds: Region) -> Self {
        let mut stack = Vec::new();

        if square.overlaps(&bounds) {
            stack.push((square, root));
        }

        Tiles { stack, bounds }
    }
}

impl<'a, T> Iterator for Tiles<'a, T> {
    type Item = Tile<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((region, quadrant)) = self.stack.pop() {
            match quadrant {
                Quadrant::Leaf(value) => {
                    let clipped = region.intersection(&self.bounds);

                    if clipped.is_empty() {
                        continue;
                    }

                    let region = clipped.offset(-self.bounds.left, -self.bounds.top);

                    return Some(Tile { value, region });
                }
                Quadrant::Node(quad) => {
                    // pushed in reverse so the top left child pops first
                    let children = Child::ALL.into_iter().zip(region.split()).rev();

                    for (child, sub) in children {
                        if sub.overlaps(&self.bounds) {
                            self.stack.push((sub, &quad[child]));
                        }
                    }
                }
            }
        }

        None
    }
}

impl<T> FusedIterator for Tiles<'_, T> {}
