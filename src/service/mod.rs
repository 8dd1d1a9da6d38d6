//! Guarded access, response framing and the OBD/lighting services.

pub mod guard;
pub mod lighting;
pub mod obd;
pub mod response;
pub mod stream;

pub use guard::AccessGuard;
pub use lighting::LightingService;
pub use obd::{CallFailure, ObdService, StreamError, StreamHandle};
pub use response::{Reading, ResponseBuilder, Status};
pub use stream::{SessionEnd, SessionState, SessionSummary, StreamingSession};
