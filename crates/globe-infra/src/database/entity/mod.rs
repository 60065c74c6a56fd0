//! SeaORM entities, one table per blog collection.

pub mod category;
pub mod comment;
pub mod post;
