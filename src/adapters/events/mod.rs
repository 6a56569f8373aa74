//! Order event adapters.
//!
//! - `LoggingOrderEventPublisher` - Writes events to the tracing pipeline
//! - `RecordingOrderEventPublisher` - Captures events for test assertions

mod recording;

pub use recording::{LoggingOrderEventPublisher, RecordingOrderEventPublisher};
