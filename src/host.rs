/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::process::{Command, Stdio};

use snafu::ResultExt;
use log::*;

use crate::error::Result;
use crate::error;

/// Description of the machine running the program, using the Node.js naming
/// conventions (process.platform, process.arch).
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    pub platform: String,
    pub arch: String,
    /// Version of the Node.js runtime installed on the host, if any
    pub runtime_version: Option<String>,
}

impl Host {
    pub fn is_windows(&self) -> bool {
        self.platform == "win32"
    }
}

/// Translate a Rust OS name to the Node.js one
pub fn node_platform(os: &str) -> &str {
    match os {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

/// Translate a Rust architecture name to the Node.js one
pub fn node_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        "arm" => "armv7l",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        other => other,
    }
}

/// Ask the installed Node.js runtime for its version
fn runtime_version() -> Result<Option<String>> {
    let output = match Command::new("node")
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output() {
        Ok(output) => output,
        Err(err) => {
            debug!("Could not run node: {}", err);
            return Ok(None);
        },
    };
    if ! output.status.success() {
        debug!("node --version exited with {}", output.status);
        return Ok(None);
    }
    let version = String::from_utf8(output.stdout)
        .context(error::FailedToDecodeUTF8{})?;
    let version = version.trim();
    Ok(if version.is_empty() { None } else { Some(version.to_string()) })
}

pub fn detect() -> Result<Host> {
    let host = Host {
        platform: node_platform(std::env::consts::OS).to_string(),
        arch: node_arch(std::env::consts::ARCH).to_string(),
        runtime_version: runtime_version()?,
    };
    debug!("Running on {:?}", host);
    Ok(host)
}
