mod app;
mod target;
mod transport;

pub use app::{resolve_path, tokenize_path, PathToken, TestApp, TestRequest, TestResponse};
pub use target::{RecordingTarget, TargetOp};
pub use transport::{page_payload, MockTransport};
