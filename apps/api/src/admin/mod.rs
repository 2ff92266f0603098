pub mod handlers;
pub mod identities;
