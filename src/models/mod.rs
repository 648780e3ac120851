pub mod application;
pub mod directory;
