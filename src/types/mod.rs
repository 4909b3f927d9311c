// ABOUTME: Validated names and phantom-typed identifiers shared by all handlers.
// ABOUTME: Keeps Rancher, UpCloud and container ids from being mixed up at compile time.

mod id;
mod image_ref;
mod operation_id;
mod project_name;

pub use id::{ContainerId, EnvironmentId, Id, ServerUuid, ServiceId, StackId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use operation_id::{OperationId, OperationIdError};
pub use project_name::{ProjectName, ProjectNameError};
