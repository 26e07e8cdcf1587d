pub mod entry;
pub mod image;
pub mod import;
pub mod page;
pub mod revision;
pub mod site;
pub mod tag;
pub mod user;
