mod bbox;
mod geom;

use bbox::BoundingBox;
pub use geom::Geometries;
