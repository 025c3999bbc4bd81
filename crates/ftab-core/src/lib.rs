pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod httpfile;
pub mod mock;
pub mod resolve;

pub use error::FtabError;
