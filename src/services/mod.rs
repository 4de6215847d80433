pub mod asset_service;
pub mod post_service;
pub mod storage;
pub mod taxonomy_service;
pub mod user_service;
pub mod worker;
