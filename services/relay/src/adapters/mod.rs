pub mod backend;
pub mod relay_client;

pub use backend::HttpBackendGateway;
pub use relay_client::HttpRelayClient;
