pub use super::assets::Entity as Assets;
pub use super::categories::Entity as Categories;
pub use super::post_tags::Entity as PostTags;
pub use super::posts::Entity as Posts;
pub use super::seo_metadata::Entity as SeoMetadata;
pub use super::subcategories::Entity as Subcategories;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
