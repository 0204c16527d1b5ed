mod blocking;
mod http;
mod traits;

pub use blocking::BlockingHttpService;
pub use http::HttpService;
pub use traits::{ServiceError, TreeService};
