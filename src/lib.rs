pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod media;
pub mod state;
pub mod storage;
