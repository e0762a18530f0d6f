//! Adaptation layer turning externally provided tools into agent capabilities.
//!
//! Setup flows one way: providers are listed, a [`policy::SelectionPolicy`]
//! picks and renames tools, and the [`builder::CapabilityBuilder`] registers
//! each one before handing out a [`capability::Capability`]. At call time the
//! capability routes through the [`dispatcher::ExecutionDispatcher`], which
//! resolves the tool by name and always answers with text.

#![warn(missing_docs, clippy::pedantic)]

pub mod builder;
pub mod capability;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod policy;
pub mod precondition;
pub mod registry;
pub mod tool;

pub use builder::CapabilityBuilder;
pub use capability::Capability;
pub use discovery::discover_capabilities;
pub use dispatcher::{DispatchError, DispatcherConfig, ExecutionDispatcher};
pub use error::{ToolError, ToolResult};
pub use policy::{AliasRule, SelectionPolicy};
pub use precondition::{Precondition, PreconditionViolation, RequiredArgument};
pub use registry::{Resolution, ToolRegistry};
pub use tool::{FnTool, Tool, ToolOutput, ToolProvider};
