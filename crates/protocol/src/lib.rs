//! Wire protocol for statichost.
//!
//! The deploy CLI never talks to the document store or the blob
//! backends directly — everything goes through named, access-controlled
//! entry points. This crate defines the registry data model, the
//! function names, the request/response payloads, and the JSON
//! envelope that carries them.

pub mod envelope;
pub mod functions;
pub mod messages;
pub mod types;

pub use envelope::{CallError, Message};
pub use functions::FunctionName;
pub use types::{Asset, DeploymentInfo, StorageRef, UploadUrl};
