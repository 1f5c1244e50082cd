pub mod types;
pub mod traits;
pub mod streaming;
pub mod http;
pub mod simulated;
pub mod tokens;

pub use traits::{
    InferenceClient,
    GenerateRequest, GenerateOptions,
    FragmentStream,
};

pub use types::{ChatTurn, Role};
pub use streaming::ChatStreamChunk;
pub use http::HttpInferenceClient;
pub use simulated::SimulatedInferenceClient;
pub use tokens::estimate_tokens;
