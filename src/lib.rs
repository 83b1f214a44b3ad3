mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::run;
pub use application::{
    ExtraRequestOptions, RequestOptions, TestTextClient, TestTextSession, TouchstoneClient,
    TouchstoneSession, UploadDataOptions,
};
pub use domain::credentials::Credentials;
pub use domain::error::{AppError, Result};
pub use domain::file_input::FileInput;
pub use domain::http_message::HttpResponse;
pub use domain::portal_config::{TestTextConfig, TouchstoneConfig};
pub use domain::upload::{ContentType, DateFormat, UploadResult};
pub use infrastructure::http::{ReqwestTransport, Transport, TransportConfig};
