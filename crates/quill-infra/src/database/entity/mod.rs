//! SeaORM entities.

pub mod login_attempt;
pub mod post;
