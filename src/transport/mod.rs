//! HTTP transport layer.

mod http;
mod reqwest;

pub use self::http::{http_error, ByteStream, HttpRequest, HttpResponse, HttpTransport};
pub use self::reqwest::ReqwestTransport;
