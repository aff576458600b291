pub mod hooks;
pub mod status;

pub use hooks::{Hooks, NullHooks};
pub use status::{PlayerSample, PlayersInfo, StatusPayload, VersionInfo};
