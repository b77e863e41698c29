//! Remote session orchestration

pub mod error;
pub mod manager;
pub mod russh_transport;
pub mod session;
pub mod state;
pub mod stream;
pub mod transport;

pub use error::{ErrorKind, SessionError};
pub use manager::{SessionEvent, SessionHandle, SessionManager};
pub use session::Session;
pub use state::SessionState;
pub use stream::OutputGate;
pub use transport::{BoxedReader, BoxedWriter, Connection, Connector, PtySize, RemoteStreams};
