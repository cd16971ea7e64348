//! Control Actions
//!
//! Typed form of the array, parity, container and VM commands the agent
//! accepts, parsed from the `/api/control/{target}[/{id}]/{action}` route.
//! Execution is a single POST through [`UnraidClient`]; callers request a
//! refresh afterwards so sensors reflect the new state.

use crate::error::{ClientError, ExporterError};
use crate::unraid::types::ActionResponse;
use crate::unraid::UnraidClient;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerOp {
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmOp {
    Start,
    Stop,
    Restart,
    Pause,
    Resume,
    Hibernate,
    ForceStop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    StartArray,
    StopArray,
    StartParityCheck,
    StopParityCheck,
    PauseParityCheck,
    ResumeParityCheck,
    Container { id: String, op: ContainerOp },
    Vm { id: String, op: VmOp },
}

impl ControlAction {
    /// Parse a route triple such as `("docker", Some("plex"), "restart")`
    pub fn parse(target: &str, id: Option<&str>, action: &str) -> Result<Self, ExporterError> {
        let invalid = || {
            ExporterError::InvalidAction(match id {
                Some(id) => format!("{}/{}/{}", target, id, action),
                None => format!("{}/{}", target, action),
            })
        };

        let action = match (target, id) {
            ("array", None) => match action {
                "start" => Self::StartArray,
                "stop" => Self::StopArray,
                _ => return Err(invalid()),
            },
            ("parity", None) => match action {
                "start" => Self::StartParityCheck,
                "stop" => Self::StopParityCheck,
                "pause" => Self::PauseParityCheck,
                "resume" => Self::ResumeParityCheck,
                _ => return Err(invalid()),
            },
            ("docker" | "container", Some(id)) if !id.is_empty() => {
                let op = match action {
                    "start" => ContainerOp::Start,
                    "stop" => ContainerOp::Stop,
                    "restart" => ContainerOp::Restart,
                    "pause" => ContainerOp::Pause,
                    "unpause" | "resume" => ContainerOp::Unpause,
                    _ => return Err(invalid()),
                };
                Self::Container {
                    id: id.to_string(),
                    op,
                }
            }
            ("vm", Some(id)) if !id.is_empty() => {
                let op = match action {
                    "start" => VmOp::Start,
                    "stop" => VmOp::Stop,
                    "restart" => VmOp::Restart,
                    "pause" => VmOp::Pause,
                    "resume" => VmOp::Resume,
                    "hibernate" => VmOp::Hibernate,
                    "force-stop" | "force_stop" => VmOp::ForceStop,
                    _ => return Err(invalid()),
                };
                Self::Vm {
                    id: id.to_string(),
                    op,
                }
            }
            _ => return Err(invalid()),
        };

        Ok(action)
    }

    pub async fn execute(&self, client: &UnraidClient) -> Result<ActionResponse, ClientError> {
        info!("Executing control action {}", self);

        match self {
            Self::StartArray => client.start_array().await,
            Self::StopArray => client.stop_array().await,
            Self::StartParityCheck => client.start_parity_check().await,
            Self::StopParityCheck => client.stop_parity_check().await,
            Self::PauseParityCheck => client.pause_parity_check().await,
            Self::ResumeParityCheck => client.resume_parity_check().await,
            Self::Container { id, op } => match op {
                ContainerOp::Start => client.start_container(id).await,
                ContainerOp::Stop => client.stop_container(id).await,
                ContainerOp::Restart => client.restart_container(id).await,
                ContainerOp::Pause => client.pause_container(id).await,
                ContainerOp::Unpause => client.unpause_container(id).await,
            },
            Self::Vm { id, op } => match op {
                VmOp::Start => client.start_vm(id).await,
                VmOp::Stop => client.stop_vm(id).await,
                VmOp::Restart => client.restart_vm(id).await,
                VmOp::Pause => client.pause_vm(id).await,
                VmOp::Resume => client.resume_vm(id).await,
                VmOp::Hibernate => client.hibernate_vm(id).await,
                VmOp::ForceStop => client.force_stop_vm(id).await,
            },
        }
    }
}

impl ContainerOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
        }
    }
}

impl VmOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Hibernate => "hibernate",
            Self::ForceStop => "force-stop",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartArray => f.write_str("array/start"),
            Self::StopArray => f.write_str("array/stop"),
            Self::StartParityCheck => f.write_str("parity/start"),
            Self::StopParityCheck => f.write_str("parity/stop"),
            Self::PauseParityCheck => f.write_str("parity/pause"),
            Self::ResumeParityCheck => f.write_str("parity/resume"),
            Self::Container { id, op } => write!(f, "docker/{}/{}", id, op.as_str()),
            Self::Vm { id, op } => write!(f, "vm/{}/{}", id, op.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_and_parity() {
        assert_eq!(
            ControlAction::parse("array", None, "start").unwrap(),
            ControlAction::StartArray
        );
        assert_eq!(
            ControlAction::parse("parity", None, "resume").unwrap(),
            ControlAction::ResumeParityCheck
        );
    }

    #[test]
    fn test_parse_container_and_vm() {
        let action = ControlAction::parse("docker", Some("plex"), "resume").unwrap();
        assert_eq!(action.to_string(), "docker/plex/unpause");

        let action = ControlAction::parse("vm", Some("win11"), "force-stop").unwrap();
        assert_eq!(action.to_string(), "vm/win11/force-stop");
    }

    #[test]
    fn test_parse_rejects_unknown_or_malformed() {
        assert!(ControlAction::parse("array", None, "explode").is_err());
        assert!(ControlAction::parse("array", Some("x"), "start").is_err());
        assert!(ControlAction::parse("docker", None, "start").is_err());
        assert!(ControlAction::parse("vm", Some(""), "start").is_err());

        let err = ControlAction::parse("nas", None, "reboot").unwrap_err();
        assert_eq!(err.to_string(), "Invalid control action: nas/reboot");
    }
}
