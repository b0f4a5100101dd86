pub mod community;
pub mod level_role;
pub mod member;
pub mod suppression;
pub mod tenant;
