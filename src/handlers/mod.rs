pub mod api;
pub mod stream;

pub use api::{bootstrap_session, health_check};
pub use stream::stream_handler;
