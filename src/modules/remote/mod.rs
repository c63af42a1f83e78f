pub mod gateway;
pub mod invoker;
pub mod retry_policy;
pub mod transport;

// Re-exports for easy external access
pub use gateway::FunctionGateway;
pub use invoker::invoke;
pub use retry_policy::RetryPolicy;
pub use transport::{FunctionTransport, HttpFunctionTransport, RestClient};
