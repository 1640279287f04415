pub mod endpoints;
mod error;
mod requester;

pub use error::HttpError;
pub use requester::{Requester, RequestError, RetryConfig};
