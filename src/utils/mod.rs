pub mod auth;
pub mod hash;
pub mod slug;
pub mod validation;
