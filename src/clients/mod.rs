pub mod responses;
pub mod traits;

pub use responses::ResponsesClient;
pub use traits::{CompletionRequest, CompletionService, UpstreamResponse};
