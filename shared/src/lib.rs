pub mod intent;
pub mod ipc;

pub use intent::{IntentSource, PatternInfo, PatternSource, ResolvedIntent, RoutingMode};
pub use ipc::{Command, IpcError, Response, StatusInfo};
