//! Clipboard and open-locator helpers.
//!
//! Each helper is a [LocatorProvider]. A [ProviderChain] holds them in preference order and
//! hands a locator to the first provider that reports itself available on this system.

use crate::core::error::LaunchError;

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

/// Something that can take a locator and do one thing with it.
pub trait LocatorProvider {
    fn name(&self) -> &str;
    fn available(&self) -> bool;
    fn deliver(&self, locator: &str) -> Result<(), LaunchError>;
}

/// How a [CommandProvider] passes the locator to its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the child's stdin, then stdin is closed.
    Stdin,
    /// Appended as the last argument. The child is not waited for.
    Argument,
}

/// An external program found on `PATH`.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
    delivery: Delivery,
}

impl CommandProvider {
    pub fn new(program: &str, args: &[&str], delivery: Delivery) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            delivery,
        }
    }

    fn failed(&self, reason: impl ToString) -> LaunchError {
        LaunchError::Failed {
            program: self.program.clone(),
            reason: reason.to_string(),
        }
    }
}

impl LocatorProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.program
    }

    fn available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn deliver(&self, locator: &str) -> Result<(), LaunchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdout(Stdio::null()).stderr(Stdio::null());

        match self.delivery {
            Delivery::Stdin => {
                let mut child = cmd
                    .stdin(Stdio::piped())
                    .spawn()
                    .map_err(|e| self.failed(e))?;
                let written = match child.stdin.take() {
                    // stdin is closed when dropped at the end of this arm
                    Some(mut stdin) => stdin.write_all(locator.as_bytes()),
                    None => Ok(()),
                };
                if let Err(e) = written {
                    if let Err(kill) = child.kill() {
                        debug!(program = %self.program, error = %kill, "kill after failed write");
                    }
                    let _ = child.wait();
                    return Err(self.failed(e));
                }
                let status = child.wait().map_err(|e| self.failed(e))?;
                if !status.success() {
                    return Err(self.failed(format!("exited with {}", status)));
                }
            }
            Delivery::Argument => {
                let mut child = cmd
                    .arg(locator)
                    .stdin(Stdio::null())
                    .spawn()
                    .map_err(|e| self.failed(e))?;
                // reap without blocking the caller
                thread::spawn(move || child.wait());
            }
        }
        Ok(())
    }
}

/// Ordered providers for one capability.
pub struct ProviderChain {
    capability: &'static str,
    providers: Vec<Box<dyn LocatorProvider>>,
}

impl ProviderChain {
    pub fn new(capability: &'static str, providers: Vec<Box<dyn LocatorProvider>>) -> Self {
        Self {
            capability,
            providers,
        }
    }

    /// wl-copy, xclip, xsel, pbcopy, then clip on windows.
    pub fn clipboard() -> Self {
        let mut providers: Vec<Box<dyn LocatorProvider>> = vec![
            Box::new(CommandProvider::new("wl-copy", &[], Delivery::Stdin)),
            Box::new(CommandProvider::new(
                "xclip",
                &["-selection", "clipboard"],
                Delivery::Stdin,
            )),
            Box::new(CommandProvider::new(
                "xsel",
                &["--clipboard", "--input"],
                Delivery::Stdin,
            )),
            Box::new(CommandProvider::new("pbcopy", &[], Delivery::Stdin)),
        ];
        if cfg!(windows) {
            providers.push(Box::new(CommandProvider::new("clip", &[], Delivery::Stdin)));
        }
        Self::new("clipboard", providers)
    }

    /// xdg-open, open on macOS, `cmd /C start` on windows.
    pub fn opener() -> Self {
        let mut providers: Vec<Box<dyn LocatorProvider>> = vec![Box::new(CommandProvider::new(
            "xdg-open",
            &[],
            Delivery::Argument,
        ))];
        if cfg!(target_os = "macos") {
            providers.push(Box::new(CommandProvider::new("open", &[], Delivery::Argument)));
        }
        if cfg!(windows) {
            providers.push(Box::new(CommandProvider::new(
                "cmd",
                &["/C", "start", ""],
                Delivery::Argument,
            )));
        }
        Self::new("open", providers)
    }

    #[inline]
    pub fn capability(&self) -> &'static str {
        self.capability
    }

    /// Delivers through the first available provider and returns its name.
    pub fn deliver(&self, locator: &str) -> Result<String, LaunchError> {
        let Some(provider) = self.providers.iter().find(|p| p.available()) else {
            warn!(capability = self.capability, "no provider available");
            return Err(LaunchError::Unavailable(self.capability));
        };
        debug!(capability = self.capability, provider = provider.name(), locator, "deliver");
        provider.deliver(locator)?;
        Ok(provider.name().to_string())
    }
}
