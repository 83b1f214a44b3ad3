pub mod credentials;
pub mod error;
pub mod file_input;
pub mod http_message;
pub mod portal_config;
pub mod upload;
