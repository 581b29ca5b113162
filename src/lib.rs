pub mod client;
pub mod comment;
pub mod config;
pub mod database;
pub mod like;
pub mod middleware;
pub mod post;
pub mod router;
pub mod uploader;
pub mod user;
pub mod utils;
