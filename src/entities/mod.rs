pub mod prelude;

pub mod assets;
pub mod categories;
pub mod post_tags;
pub mod posts;
pub mod seo_metadata;
pub mod subcategories;
pub mod tags;
pub mod users;
