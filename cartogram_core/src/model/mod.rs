// private sub-modules defined in other files
mod inset;
mod map_model;
mod region;
mod target_map;

// exports identifiers from private sub-modules in the current module namespace
pub use self::inset::{Inset, InsetPos};
pub use self::map_model::MapModel;
pub use self::region::Region;
pub use self::target_map::{mean_density, repair_targets, TargetMap};
