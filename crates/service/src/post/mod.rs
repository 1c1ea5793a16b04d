//! Job and service listings: domain types, listing query, persistence and use cases.

pub mod domain;
pub mod query;
pub mod repository;
pub mod service;

pub use service::{PostPage, PostService};
