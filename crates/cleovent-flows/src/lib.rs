pub mod actions;
pub mod engine;
pub mod flows;
mod gateway;
pub mod http;
pub mod location;
mod parse;
mod prompt;

pub use engine::{CompletionBackend, CompletionRequest, LlmEngine};
pub use flows::{FlowDefinition, FlowRegistry};
pub use gateway::Gateway;
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
