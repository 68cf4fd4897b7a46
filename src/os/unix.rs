// OS abstraction layer - Unix implementation
// (c) 2024 Ross Younger

use std::path::PathBuf;

use tracing::warn;

use super::AbstractPlatform;

#[derive(Debug, Clone, Copy)]
/// OS abstraction layer for Unix-like platforms
pub struct Platform {}

impl AbstractPlatform for Platform {
    fn system_ssh_config() -> &'static str {
        "/etc/ssh/ssh_config"
    }

    fn system_ssh_dir() -> &'static str {
        "/etc/ssh"
    }

    fn user_ssh_config() -> Option<PathBuf> {
        let mut p = Self::user_ssh_dir()?;
        p.push("config");
        Some(p)
    }

    fn user_ssh_dir() -> Option<PathBuf> {
        let Some(mut p) = dirs::home_dir() else {
            warn!("could not determine home directory");
            return None;
        };
        p.push(".ssh");
        Some(p)
    }
}
