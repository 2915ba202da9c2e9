//! Request execution layer
//!
//! Transport abstraction, header building, interceptors, response
//! classification and the executor that ties them into one pipeline.

pub mod classify;
pub mod executor;
pub mod headers;
pub mod interceptor;
pub mod transport;

pub use classify::{ConsumptionMode, classify_http_error, consumption_mode};
pub use executor::RequestExecutor;
pub use headers::{HttpHeaderBuilder, merge_headers};
pub use interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor, generate_request_id};
pub use transport::{
    ByteStream, HttpTransport, HttpTransportRequest, HttpTransportResponse, ReqwestTransport,
};
