// private sub-modules defined in other files
mod bounding_box;
mod point;
mod polygon;
mod polygon_with_holes;

// exports identifiers from private sub-modules in the current module namespace
pub use self::bounding_box::BoundingBox;
pub use self::point::Point;
pub use self::polygon::Polygon;
pub use self::polygon_with_holes::PolygonWithHoles;
