//! Domain models for the brewery directory

mod location;
mod rating;
mod review;
mod schedule;
mod user;

pub use location::*;
pub use rating::*;
pub use review::*;
pub use schedule::*;
pub use user::*;
