mod request;
mod response;

pub use request::Request;
pub use response::{Action, Response};
