pub mod coordinator;
pub mod error;
pub mod messages;
pub mod presence;
pub mod registry;
pub mod rooms;
pub mod snapshot;
pub mod types;

pub use coordinator::{Outbound, SessionCoordinator};
pub use error::RealtimeError;
pub use messages::{ChangePayload, ClientMessage, JoinPayload, ServerMessage};
pub use registry::{ConnectionEntry, ConnectionRegistry};
pub use rooms::RoomDirectory;
pub use snapshot::SnapshotCache;
pub use types::{Blob, ConnectionId, RoomId, User};
