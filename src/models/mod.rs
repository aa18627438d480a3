// Database rows and request/response payloads

pub mod analytics;
pub mod duel;
pub mod exercise;
pub mod gamification;
pub mod goal;
pub mod measurement;
pub mod social;
pub mod user;
pub mod validation;
pub mod workout;

pub use analytics::*;
pub use duel::*;
pub use exercise::*;
pub use gamification::*;
pub use goal::*;
pub use measurement::*;
pub use social::*;
pub use user::*;
pub use workout::*;
