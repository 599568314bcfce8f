pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod voter;
