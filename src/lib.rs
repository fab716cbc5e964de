pub mod quadrant;
pub mod region;
pub mod tile;
pub mod tree;

pub use quadrant::Quad;
pub use quadrant::Quadrant;
pub use region::Location;
pub use region::Region;
pub use tile::Tile;
pub use tree::QuadTree;
pub use tree::TreeError;

pub type Coord = i64;
