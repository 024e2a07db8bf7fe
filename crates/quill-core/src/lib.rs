//! # Quill Core
//!
//! The domain layer of the Quill blog.
//! This crate holds the post cache synchronizer and the login throttle,
//! plus the ports they drive. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{Denial, DomainError, RepoError};
