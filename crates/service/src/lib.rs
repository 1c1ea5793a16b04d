//! Service layer for the job/service board.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Each area is split into domain, repository and service.

pub mod errors;
pub mod authz;
pub mod pagination;
pub mod post;
pub mod comment;
pub mod auth;
#[cfg(test)]
pub mod test_support;
