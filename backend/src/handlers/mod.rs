//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod location;
pub mod review;
pub mod search;
pub mod user;

pub use auth::*;
pub use health::*;
pub use location::*;
pub use review::*;
pub use search::*;
pub use user::*;
