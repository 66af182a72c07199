//! Core types and trait definitions for the CourseFinder backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod application;
pub mod catalog;
pub mod contact;
pub mod error;
pub mod profile;
pub mod review;
pub mod store;
pub mod user;

pub use error::{Error, Result};
