use crate::error::{CatalogError, Result};
use log::debug;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::thread;

pub trait Launcher: Send + Sync {
    /// Starts `exec_command` and returns once the OS has created the process.
    fn launch(&self, exec_command: &str) -> Result<()>;
}

/// Spawns detached child processes in their own process group.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, exec_command: &str) -> Result<()> {
        let cmd_parts: Vec<&str> = exec_command.split_whitespace().collect();
        let Some((program, args)) = cmd_parts.split_first() else {
            return Err(CatalogError::InvalidArgument("exec command is empty".into()));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0);

        let mut child = command.spawn().map_err(|source| CatalogError::Launch {
            command: exec_command.to_string(),
            source,
        })?;
        debug!("Launched '{}' as pid {}", exec_command, child.id());

        let program = program.to_string();
        thread::spawn(move || {
            if let Ok(status) = child.wait() {
                debug!("'{}' exited with {}", program, status);
            }
        });

        Ok(())
    }
}
