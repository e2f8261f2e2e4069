mod http_completion_client;
mod mock_completion_client;

pub use http_completion_client::HttpCompletionClient;
pub use mock_completion_client::MockCompletionClient;
