//! Business logic services for the brewery directory

pub mod auth;
pub mod hours;
pub mod location;
pub mod rating;
pub mod review;
pub mod search;
pub mod user;

pub use auth::AuthService;
pub use hours::BusinessHoursStore;
pub use location::LocationService;
pub use rating::RatingAggregator;
pub use review::ReviewService;
pub use search::GeoSearchEngine;
pub use user::UserService;
