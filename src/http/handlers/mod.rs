//! Route handlers.

pub mod health;
pub mod pantry;
pub mod products;
pub mod recipes;
pub mod users;
