//! Process restart.
//!
//! The host equivalent of a device reset: replace the running process with a
//! fresh copy of itself, same arguments.

use std::process::Command;

use stationmon_app::Restarter;

use crate::DeviceError;

/// Restarts by re-executing the current binary.
#[derive(Debug, Clone, Default)]
pub struct ExecRestarter;

impl ExecRestarter {
    /// Create a restarter.
    pub fn new() -> Self {
        Self
    }

    fn command() -> Result<Command, DeviceError> {
        let exe = std::env::current_exe().map_err(DeviceError::Restart)?;
        let mut command = Command::new(exe);
        command.args(std::env::args_os().skip(1));
        Ok(command)
    }
}

impl Restarter for ExecRestarter {
    type Error = DeviceError;

    #[cfg(unix)]
    fn restart(&mut self) -> Result<(), DeviceError> {
        use std::os::unix::process::CommandExt;

        // Only returns on failure
        let err = Self::command()?.exec();
        Err(DeviceError::Restart(err))
    }

    #[cfg(not(unix))]
    fn restart(&mut self) -> Result<(), DeviceError> {
        Self::command()?.spawn().map_err(DeviceError::Restart)?;
        std::process::exit(0)
    }
}
