/* This is part of nodegyp-offline - which is under the MIT License ***********/

use crate::error::Result;
use crate::error;
use log::*;

use snafu::{ResultExt, ensure};

use std::path::Path;
use std::process::{Command, Stdio};

/// Packages bundled when nothing else is configured
pub const DEFAULT_PACKAGES: &[&str] = &["node-gyp", "cmake-js", "node-addon-api"];

/// Name of the npm program on the host
pub fn default_program(host_windows: bool) -> &'static str {
    if host_windows { "npm.cmd" } else { "npm" }
}

/// Compose the command installing packages globally in prefix
pub fn install_command(program: &str, prefix: &Path, packages: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("install")
        .args(packages)
        .arg("--global")
        .arg("--prefix").arg(prefix)
        .stdin(Stdio::null());
    cmd
}

/// Run npm to install packages globally, using prefix as the global
/// installation directory.
pub fn install(program: &str, prefix: &Path, packages: &[String]) -> Result<()> {
    info!("Installing {} into {:#?}", packages.join(" "), prefix);
    let status = install_command(program, prefix, packages)
        .status()
        .context(error::ProgFailed{ proc: program })?;
    ensure!(status.success(), error::NpmFailed{
        proc: program,
        packages: packages.join(" "),
        prefix: prefix.to_path_buf(),
    });
    Ok(())
}
