pub mod backup;
pub mod compression;
pub mod core_api;
pub mod cursor;
pub mod document;
pub mod error;
pub mod layout;
pub mod materials;
pub mod prism;
pub mod world;
