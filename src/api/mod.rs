//! Remote API support
//!
//! `registry` stores named endpoints and credentials, `client` performs calls
//! over an `HttpTransport`, and `remote` runs calls in the background for
//! button clicks.

pub mod client;
pub mod registry;
pub mod remote;
pub mod transport;

pub use client::{ApiClient, ApiRequest, ApiResponse};
pub use registry::{ensure_url_scheme, join_url, ApiConfig, ApiRegistry};
pub use remote::{ApiCallSpec, RemoteCaller};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody,
    TransportError,
};
