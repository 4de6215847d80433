pub mod assets;
pub mod auth;
pub mod health;
pub mod posts;
pub mod taxonomy;
pub mod users;
