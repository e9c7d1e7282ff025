// private sub-modules defined in other files
mod blur;
mod dct;
mod poisson;

// exports identifiers from private sub-modules in the current module namespace
pub use self::blur::gaussian_blur_in_place;
pub use self::dct::SpectralPlan;
pub use self::poisson::{velocity, PoissonSolver};
