//! HTTP route handlers, grouped by concern.

pub mod accounts;
pub mod admin;
pub mod applications;
pub mod catalog;
pub mod chatbot;
pub mod contact;
pub mod reviews;
