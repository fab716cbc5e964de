use std::ops::Index;
use std::ops::IndexMut;

use thiserror::Error;
use tracing::error;
use tracing::trace;

use crate::Coord;

/// Names the four children of a [`Quad`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Child {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Child {
    /// All children, in traversal order.
    pub const ALL: [Child; 4] = [
        Child::TopLeft,
        Child::TopRight,
        Child::BottomLeft,
        Child::BottomRight,
    ];

    /// Picks the child holding `(x, y)` inside a square of sidelength `2^depth`, and returns the
    /// coordinates relative to that child.
    ///
    /// `depth` must be at least 1.
    pub fn locate(depth: u32, x: Coord, y: Coord) -> (Child, Coord, Coord) {
        let mid: Coord = 1 << (depth - 1);

        let child = match (x < mid, y < mid) {
            (true, true) => Child::TopLeft,
            (false, true) => Child::TopRight,
            (true, false) => Child::BottomLeft,
            (false, false) => Child::BottomRight,
        };

        (child, x.rem_euclid(mid), y.rem_euclid(mid))
    }
}

/// Four values, one per [`Child`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Quad<T> {
    pub top_left: T,
    pub top_right: T,
    pub bottom_left: T,
    pub bottom_right: T,
}

impl<T> Quad<T> {
    pub fn new(top_left: T, top_right: T, bottom_left: T, bottom_right: T) -> Self {
        Quad {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Four copies of `value`.
    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Quad {
            top_left: value.clone(),
            top_right: value.clone(),
            bottom_left: value.clone(),
            bottom_right: value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        Child::ALL.into_iter().map(|c| &self[c])
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Quad<U> {
        Quad {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }
}

impl<T> Index<Child> for Quad<T> {
    type Output = T;

    fn index(&self, index: Child) -> &Self::Output {
        match index {
            Child::TopLeft => &self.top_left,
            Child::TopRight => &self.top_right,
            Child::BottomLeft => &self.bottom_left,
            Child::BottomRight => &self.bottom_right,
        }
    }
}

impl<T> IndexMut<Child> for Quad<T> {
    fn index_mut(&mut self, index: Child) -> &mut Self::Output {
        match index {
            Child::TopLeft => &mut self.top_left,
            Child::TopRight => &mut self.top_right,
            Child::BottomLeft => &mut self.bottom_left,
            Child::BottomRight => &mut self.bottom_right,
        }
    }
}

/// Returned when a descent runs out of depth while still standing on a [`Quadrant::Node`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Reached a node where a leaf was expected")]
pub struct DepthMismatch;

/// A square region of cells.
///
/// # Fusion
///
/// A fused quadrant never has a [`Quadrant::Node`] whose four children are leaves holding equal
/// values. Point writes ([`Quadrant::set`]) keep a fused quadrant fused, while
/// [`Quadrant::map`] may break it and [`Quadrant::fuse_all`] restores it.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Quadrant<T> {
    /// Every cell of the region holds this value.
    Leaf(T),

    /// The region split into four equal squares.
    Node(Box<Quad<Quadrant<T>>>),
}

impl<T> Quadrant<T> {
    pub fn node(
        top_left: Quadrant<T>,
        top_right: Quadrant<T>,
        bottom_left: Quadrant<T>,
        bottom_right: Quadrant<T>,
    ) -> Self {
        Quadrant::Node(Box::new(Quad::new(
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        )))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Quadrant::Leaf(_))
    }

    /// Number of leaves below (and including) this quadrant.
    pub fn leaf_count(&self) -> usize {
        match self {
            Quadrant::Leaf(_) => 1,
            Quadrant::Node(quad) => quad.iter().map(Quadrant::leaf_count).sum(),
        }
    }

    /// Levels between this quadrant and its deepest leaf.
    pub fn height(&self) -> u32 {
        match self {
            Quadrant::Leaf(_) => 0,
            Quadrant::Node(quad) => 1 + quad.iter().map(Quadrant::height).max().unwrap_or(0),
        }
    }

    /// Applies `f` to every leaf, keeping the shape as-is. The result may not be fused.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Quadrant<U> {
        self.map_with(&mut f)
    }

    fn map_with<U, F>(&self, f: &mut F) -> Quadrant<U>
    where
        F: FnMut(&T) -> U,
    {
        match self {
            Quadrant::Leaf(value) => Quadrant::Leaf(f(value)),
            Quadrant::Node(quad) => Quadrant::node(
                quad.top_left.map_with(f),
                quad.top_right.map_with(f),
                quad.bottom_left.map_with(f),
                quad.bottom_right.map_with(f),
            ),
        }
    }

    /// Reads the value at `(x, y)` of a square with sidelength `2^depth`.
    ///
    /// Coordinates must already be inside the square.
    pub fn get(&self, depth: u32, x: Coord, y: Coord) -> Result<&T, DepthMismatch> {
        let (mut node, mut depth, mut x, mut y) = (self, depth, x, y);

        loop {
            match node {
                Quadrant::Leaf(value) => return Ok(value),
                Quadrant::Node(_) if depth == 0 => {
                    error!(x, y, "node found at the bottom of the tree");
                    return Err(DepthMismatch);
                }
                Quadrant::Node(quad) => {
                    let (child, cx, cy) = Child::locate(depth, x, y);

                    node = &quad[child];
                    (depth, x, y) = (depth - 1, cx, cy);
                }
            }
        }
    }
}

impl<T: PartialEq> Quad<Quadrant<T>> {
    /// The shared value if all four children are leaves holding equal values.
    fn uniform_value(&self) -> Option<&T> {
        let Quadrant::Leaf(value) = &self.top_left else {
            return None;
        };

        self.iter()
            .skip(1)
            .all(|q| matches!(q, Quadrant::Leaf(other) if other == value))
            .then_some(value)
    }
}

impl<T: PartialEq> Quadrant<T> {
    /// Collapses a node of four equal leaves into one leaf. Only looks one level down.
    pub fn fuse(self) -> Self {
        match self {
            Quadrant::Node(quad) if quad.uniform_value().is_some() => {
                // all four are equal leaves, keep any one of them
                let Quad { top_left, .. } = *quad;
                top_left
            }
            other => other,
        }
    }

    /// Fuses every node, bottom-up.
    pub fn fuse_all(self) -> Self {
        match self {
            Quadrant::Leaf(_) => self,
            Quadrant::Node(quad) => {
                Quadrant::Node(Box::new((*quad).map(Quadrant::fuse_all))).fuse()
            }
        }
    }

    /// Whether no node anywhere below holds four equal leaves.
    pub fn is_fused(&self) -> bool {
        match self {
            Quadrant::Leaf(_) => true,
            Quadrant::Node(quad) => {
                quad.uniform_value().is_none() && quad.iter().all(Quadrant::is_fused)
            }
        }
    }

    /// Writes `value` at `(x, y)` of a square with sidelength `2^depth`, splitting leaves on the
    /// way down and fusing nodes on the way back up.
    ///
    /// Nothing is modified when an error is returned.
    pub fn set(&mut self, depth: u32, x: Coord, y: Coord, value: T) -> Result<(), DepthMismatch>
    where
        T: Clone,
    {
        match self {
            Quadrant::Leaf(current) if *current == value => Ok(()),
            Quadrant::Leaf(current) if depth == 0 => {
                *current = value;
                Ok(())
            }
            Quadrant::Leaf(current) => {
                trace!(depth, "splitting leaf");
                let leaf = Quadrant::Leaf(current.clone());
                *self = Quadrant::Node(Box::new(Quad::splat(leaf)));

                self.set(depth, x, y, value)
            }
            Quadrant::Node(_) if depth == 0 => {
                error!(x, y, "node found at the bottom of the tree");
                Err(DepthMismatch)
            }
            Quadrant::Node(quad) => {
                let (child, cx, cy) = Child::locate(depth, x, y);
                quad[child].set(depth - 1, cx, cy, value)?;

                if let Some(value) = quad.uniform_value().cloned() {
                    trace!(depth, "fusing node");
                    *self = Quadrant::Leaf(value);
                }

                Ok(())
            }
        }
    }
}
