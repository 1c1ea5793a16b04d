//! Comments attached to a post.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CommentService;
