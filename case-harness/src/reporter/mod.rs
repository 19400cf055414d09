//! The reporter: a typed event stream decoupled from how it is rendered.

pub mod defaults;
pub mod displayer;
pub mod events;

pub use defaults::HarnessConfig;
pub use displayer::{BufferSink, FatalMode, ReportSink, Reporter, StdoutSink, TextReporter};
pub use events::CaseEvent;
