// Relay sessions: directional forwarding between the local RTMP engine and
// a remote RTMP endpoint.
//
// - session.rs  - direction, session key, session record
// - worker.rs   - RelayWorker / RelayFactory seams and RelayError
// - command.rs  - worker backed by an external relay program
// - registry.rs - the session registry owned by the control plane

pub mod command;
pub mod registry;
pub mod session;
pub mod worker;

pub use command::{CommandRelay, CommandRelayFactory};
pub use registry::{RelaySessionRegistry, StartOutcome};
pub use session::{Direction, SessionInfo, SessionKey};
pub use worker::{RelayError, RelayFactory, RelayWorker};
