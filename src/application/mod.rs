pub mod use_cases;

pub use use_cases::request_dispatch::RequestOptions;
pub use use_cases::table_negotiator::ExtraRequestOptions;
pub use use_cases::testtext::{TestTextClient, TestTextSession};
pub use use_cases::touchstone::{TouchstoneClient, TouchstoneSession, UploadDataOptions};
