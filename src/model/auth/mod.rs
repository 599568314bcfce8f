mod token;
mod user;

pub use token::AuthToken;
pub use user::{Actor, Administrator, Registrant, Role};
