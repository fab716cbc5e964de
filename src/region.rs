use crate::Coord;

/// A cell address. `(0, 0)` is the top left corner, `x` grows to the right and `y` grows
/// downwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Location {
    pub x: Coord,
    pub y: Coord,
}

impl Location {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

impl From<(Coord, Coord)> for Location {
    fn from((x, y): (Coord, Coord)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, inclusive on all four sides.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Region {
    pub left: Coord,
    pub top: Coord,
    pub right: Coord,
    pub bottom: Coord,
}

impl Region {
    pub const fn new(left: Coord, top: Coord, right: Coord, bottom: Coord) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The overlap of `self` and `other`.
    ///
    /// No overlap check is done: two disjoint regions produce an empty region (see
    /// [`Region::is_empty`]), which must not be fed to [`Region::area`].
    pub fn intersection(&self, other: &Region) -> Region {
        Region {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }

    pub fn width(&self) -> Coord {
        self.right + 1 - self.left
    }

    pub fn height(&self) -> Coord {
        self.bottom + 1 - self.top
    }

    /// Number of cells covered.
    pub fn area(&self) -> Coord {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    pub fn contains(&self, location: Location) -> bool {
        self.left <= location.x
            && location.x <= self.right
            && self.top <= location.y
            && location.y <= self.bottom
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Shift the region by `(dx, dy)`.
    pub fn offset(&self, dx: Coord, dy: Coord) -> Region {
        Region {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }

    /// Splits the region into four quadrants at its midpoints, in top-left, top-right,
    /// bottom-left, bottom-right order.
    ///
    /// On a single cell the three quadrants past the top-left one come out empty.
    pub fn split(&self) -> [Region; 4] {
        let mid_x = (self.left + self.right).div_euclid(2);
        let mid_y = (self.top + self.bottom).div_euclid(2);

        [
            Region::new(self.left, self.top, mid_x, mid_y),
            Region::new(mid_x + 1, self.top, self.right, mid_y),
            Region::new(self.left, mid_y + 1, mid_x, self.bottom),
            Region::new(mid_x + 1, mid_y + 1, self.right, self.bottom),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::Location;
    use super::Region;

    #[test]
    fn intersection_of_overlapping() {
        let a = Region::new(0, 0, 7, 7);
        let b = Region::new(2, 1, 4, 9);

        assert_eq!(a.intersection(&b), Region::new(2, 1, 4, 7));
        assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn intersection_of_disjoint_is_empty() {
        let a = Region::new(0, 0, 3, 3);
        let b = Region::new(4, 0, 7, 3);

        assert!(a.intersection(&b).is_empty());
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn area_is_inclusive() {
        assert_eq!(Region::new(0, 0, 0, 0).area(), 1);
        assert_eq!(Region::new(1, 2, 3, 2).area(), 3);
        assert_eq!(Region::new(0, 0, 7, 7).area(), 64);
    }

    #[test]
    fn contains_edges() {
        let r = Region::new(1, 1, 3, 2);

        assert!(r.contains(Location::new(1, 1)));
        assert!(r.contains(Location::new(3, 2)));
        assert!(!r.contains(Location::new(0, 1)));
        assert!(!r.contains(Location::new(3, 3)));
    }

    #[test]
    fn split_square() {
        let [tl, tr, bl, br] = Region::new(0, 0, 3, 3).split();

        assert_eq!(tl, Region::new(0, 0, 1, 1));
        assert_eq!(tr, Region::new(2, 0, 3, 1));
        assert_eq!(bl, Region::new(0, 2, 1, 3));
        assert_eq!(br, Region::new(2, 2, 3, 3));
    }

    #[test]
    fn split_single_cell() {
        let [tl, tr, bl, br] = Region::new(5, 5, 5, 5).split();

        assert_eq!(tl, Region::new(5, 5, 5, 5));
        assert!(tr.is_empty());
        assert!(bl.is_empty());
        assert!(br.is_empty());
    }
}
