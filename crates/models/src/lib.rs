//! SeaORM entities, field validators and connection helpers.

pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod post;
pub mod comment;

#[cfg(test)]
mod tests;
