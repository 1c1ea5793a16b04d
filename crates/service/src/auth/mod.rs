//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and bearer-token resolution for the board's users.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
