/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::path::{Path, PathBuf};
use snafu::ResultExt;
use clap::ArgMatches;
use serde_derive::Deserialize;
use log::*;

use crate::archive::ArchiveFormat;
use crate::error::Result;
use crate::error;
use crate::host::Host;
use crate::layout::PlanOptions;
use crate::npm;
use crate::resolve::RawOptions;

#[derive(Debug)]
pub struct Config {
    /// Target settings from the command line, completed by the
    /// configuration file
    pub options: RawOptions,
    /// Target settings from the environment. They override the options.
    pub env: RawOptions,
    pub plan: PlanOptions,
}

/// Contents of the optional TOML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    platform: Option<String>,
    arch: Option<String>,
    version: Option<String>,
    mirror: Option<String>,
    auto_lts_count: Option<usize>,
    archive_format: Option<String>,
    output_dir: Option<PathBuf>,
    tools_dir: Option<PathBuf>,
    npm: Option<String>,
    packages: Option<Vec<String>>,
}

impl FileConfig {
    fn options(&self) -> RawOptions {
        RawOptions {
            platform: self.platform.clone(),
            arch: self.arch.clone(),
            version: self.version.clone(),
            mirror: self.mirror.clone(),
            auto_lts_count: self.auto_lts_count.map(|n| n.to_string()),
        }
    }
}

/// Read the contents of a input file. In case of failure, the error is wrapped
/// to my pretty error that clearly states why it failed.
fn load_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).context(error::FailedToRead {
        path: path.to_path_buf(),
    })
}

/// Decode the configuration file. Relative paths it contains are relative
/// to the directory of the file.
fn load_file_config(path: &Path) -> Result<FileConfig> {
    let file_contents = load_file(path)?;
    let mut cfg: FileConfig = toml::from_slice(file_contents.as_slice())
        .context(error::FailedToDeser{ path: path.to_path_buf() })?;
    info!("Using configuration at path {:#?}", path);

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.output_dir = cfg.output_dir.map(|p| dir.join(p));
    cfg.tools_dir = cfg.tools_dir.map(|p| dir.join(p));
    Ok(cfg)
}

fn cli_options(matches: &ArgMatches) -> RawOptions {
    let value = |name: &str| matches.value_of(name).map(|s| s.to_string());
    RawOptions {
        platform: value("platform"),
        arch: value("arch"),
        version: value("version"),
        mirror: value("mirror"),
        auto_lts_count: value("auto_lts_count"),
    }
}

pub fn new(matches: &ArgMatches, host: &Host) -> Result<Config> {
    let current_dir = std::env::current_dir().context(error::CwdAccess{})?;

    let file = match matches.value_of("config") {
        Some(path) => load_file_config(Path::new(path))?,
        None => FileConfig::default(),
    };

    // Output directory - if not provided, bundles are created in the
    // current working directory. It is only created once the targets are
    // known to be feasible.
    let work_dir = match matches.value_of("output_dir").map(PathBuf::from)
        .or_else(|| file.output_dir.clone()) {
        Some(val) => current_dir.join(val),
        None => current_dir.clone(),
    };

    // Tools directory - where 7za lives. Defaults to the current working
    // directory as well.
    let tools_dir = match matches.value_of("tools_dir").map(PathBuf::from)
        .or_else(|| file.tools_dir.clone()) {
        Some(val) => val.canonicalize()
            .context(error::CanonFailed{dir: val.clone()})?,
        None => current_dir,
    };

    let format = match matches.value_of("archive_format")
        .map(|s| s.to_string())
        .or_else(|| file.archive_format.clone()) {
        Some(val) => ArchiveFormat::parse(&val)?,
        None => ArchiveFormat::Zip,
    };

    let npm = matches.value_of("npm")
        .map(|s| s.to_string())
        .or_else(|| file.npm.clone())
        .unwrap_or_else(|| npm::default_program(host.is_windows()).to_string());

    let packages = file.packages.clone().unwrap_or_else(|| {
        npm::DEFAULT_PACKAGES.iter().map(|s| s.to_string()).collect()
    });

    Ok(Config {
        options: cli_options(matches).or(file.options()),
        env: RawOptions::from_env(),
        plan: PlanOptions {
            work_dir: work_dir,
            tools_dir: tools_dir,
            format: format,
            npm: npm,
            packages: packages,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn host() -> Host {
        Host {
            platform: "linux".to_string(),
            arch: "x64".to_string(),
            runtime_version: None,
        }
    }

    #[test]
    fn command_line() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        let matches = crate::app().get_matches_from(vec![
            "nodegyp-offline",
            "-p", "linux", "-a", "arm64", "-v", "v20.0.0",
            "-m", "https://nodejs.org/dist",
            "--autoLTSCount", "2",
            "-f", "tar.gz",
            "-O", out.to_str().unwrap(),
            "-T", tmp.path().to_str().unwrap(),
        ]);
        let cfg = new(&matches, &host()).unwrap();
        assert_eq!(cfg.options, RawOptions {
            platform: Some("linux".to_string()),
            arch: Some("arm64".to_string()),
            version: Some("v20.0.0".to_string()),
            mirror: Some("https://nodejs.org/dist".to_string()),
            auto_lts_count: Some("2".to_string()),
        });
        assert!(! out.exists());
        assert_eq!(cfg.plan.work_dir, out);
        assert_eq!(cfg.plan.tools_dir, tmp.path().canonicalize().unwrap());
        assert_eq!(cfg.plan.format, ArchiveFormat::TarGz);
        assert_eq!(cfg.plan.npm, "npm");
        assert_eq!(cfg.plan.packages, vec!["node-gyp", "cmake-js", "node-addon-api"]);
    }

    #[test]
    fn configuration_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bundle.toml");
        std::fs::create_dir(tmp.path().join("tools")).unwrap();
        std::fs::write(&path, r#"
platform = "win32"
arch = "ia32"
mirror = "https://nodejs.org/dist/"
auto_lts_count = 3
archive_format = "zip"
output_dir = "bundles"
tools_dir = "tools"
npm = "/opt/node/bin/npm"
packages = ["node-gyp@9", "node-addon-api"]
"#).unwrap();

        let matches = crate::app().get_matches_from(vec![
            "nodegyp-offline", "-C", path.to_str().unwrap(), "-a", "x64",
        ]);
        let cfg = new(&matches, &host()).unwrap();
        // The command line wins over the file
        assert_eq!(cfg.options.arch.as_deref(), Some("x64"));
        assert_eq!(cfg.options.platform.as_deref(), Some("win32"));
        assert_eq!(cfg.options.auto_lts_count.as_deref(), Some("3"));
        assert_eq!(cfg.plan.work_dir, tmp.path().join("bundles"));
        assert_eq!(cfg.plan.tools_dir, tmp.path().join("tools").canonicalize().unwrap());
        assert_eq!(cfg.plan.npm, "/opt/node/bin/npm");
        assert_eq!(cfg.plan.packages, vec!["node-gyp@9", "node-addon-api"]);
    }

    #[test]
    fn bad_configuration_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bundle.toml");
        std::fs::write(&path, "platfrom = \"linux\"\n").unwrap();
        let err = load_file_config(&path).unwrap_err();
        assert!(matches!(err, error::Error::FailedToDeser { .. }));

        let err = load_file_config(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, error::Error::FailedToRead { .. }));
    }

    #[test]
    fn windows_npm() {
        let windows = Host { platform: "win32".to_string(), ..host() };
        let matches = crate::app().get_matches_from(vec!["nodegyp-offline"]);
        let cfg = new(&matches, &windows).unwrap();
        assert_eq!(cfg.plan.npm, "npm.cmd");
        assert_eq!(cfg.plan.format, ArchiveFormat::Zip);
    }
}
