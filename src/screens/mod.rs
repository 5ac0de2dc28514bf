pub mod admin;
pub mod arena;
pub mod theme;
