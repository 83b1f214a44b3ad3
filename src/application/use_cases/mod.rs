pub mod file_payload;
pub mod request_dispatch;
pub mod table_negotiator;
pub mod testtext;
pub mod touchstone;
