pub mod admin;
pub mod assets;
pub mod tokens;
pub mod upload;
pub mod users;
pub mod videos;
