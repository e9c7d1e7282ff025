// private sub-modules defined in other files
mod line_ops;
mod point_in_poly;

// exports identifiers from private sub-modules in the current module namespace
pub use self::line_ops::{point_line_distance, point_line_distance_squared, ray_y_intersects, segment_intersection};
pub use self::point_in_poly::{interior_point, point_in_poly, winding_number};
