pub mod candidate;
pub mod voter;
