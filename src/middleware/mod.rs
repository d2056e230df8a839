//! Pipeline stages. Each stage is an axum `from_fn` middleware returning a typed result.

pub mod body;
pub mod cors;
pub mod errors;
pub mod request;

pub use body::{parse_json_body, JsonBody};
pub use cors::preflight;
pub use errors::{handle_errors, panic_response};
pub use request::{init_envelope, validate, RouteScope};
