//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → redirect.rs (`/` answered locally)
//!     → [routing decides route + cluster]
//!     → forward.rs (upstream request, gzip decoded)
//!     → passthrough: stream body unchanged
//!       translated:  transform.rs (buffer, translate, re-frame)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod redirect;
pub mod request;
pub mod server;
pub mod transform;

pub use forward::Forwarder;
pub use redirect::DefaultLanguage;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
pub use transform::ResponseTransformer;
