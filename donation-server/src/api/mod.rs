//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`auth`] - admin login and session
//! - [`campaigns`] - public campaign listing and admin campaign CRUD
//! - [`donations`] - public donation flow and admin ledger
//! - [`payment`] - gateway callbacks and the simulated payment page
//! - [`analytics`] - admin dashboard stats and reports

pub mod analytics;
pub mod auth;
pub mod campaigns;
pub mod donations;
pub mod health;
pub mod payment;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
