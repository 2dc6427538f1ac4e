//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `skill` - Skill request endpoint

pub mod api;
pub mod skill;
