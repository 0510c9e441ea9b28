/* This is part of nodegyp-offline - which is under the MIT License ***********/

//! Everything a bundle is made of: what to download, where to put it and
//! how to pack it. Computing a plan has no side effect; executing it is the
//! job of the bundle module.

use std::path::{Path, PathBuf};

use snafu::{ResultExt, ensure};
use log::*;

use crate::archive::{ArchiveFormat, ArchiveOp, Extraction};
use crate::error::Result;
use crate::error;
use crate::host::Host;
use crate::resolve::{BuildTarget, Platform};
use crate::script;

/// Version of the node-gyp cache layout, as written in installVersion
const NODE_GYP_INSTALL_VERSION: &str = "9";

/// Settings that are common to all the targets of a run
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    /// Directory in which the layout roots are created
    pub work_dir: PathBuf,
    /// Directory providing the 7za decompression tool
    pub tools_dir: PathBuf,
    pub format: ArchiveFormat,
    /// npm executable
    pub npm: String,
    /// npm packages to bundle
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub url: url::Url,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileCopy {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFile {
    pub path: PathBuf,
    pub contents: String,
    pub executable: bool,
}

/// Global installation of the npm packages in a scratch prefix, followed
/// by the removal of what is meaningless on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInstall {
    pub program: String,
    pub prefix: PathBuf,
    pub packages: Vec<String>,
    pub removals: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallPlan {
    /// Layout root. Deleted and created again before anything else.
    pub root: PathBuf,
    pub directories: Vec<PathBuf>,
    pub downloads: Vec<Download>,
    pub copies: Vec<FileCopy>,
    pub packages: PackageInstall,
    pub extractions: Vec<Extraction>,
    pub files: Vec<TextFile>,
    pub script: TextFile,
    pub archives: Vec<ArchiveOp>,
}

/// Name of the directory holding the bundle of a target
pub fn root_name(target: &BuildTarget) -> String {
    format!("node-gyp-offline-install-{}-{}-v{}",
        target.platform, target.arch, target.version)
}

/// Compose the URL of a file in the release directory of the target
fn release_url(target: &BuildTarget, file: &str) -> Result<url::Url> {
    let rel = format!("v{}/{}", target.version, file);
    target.mirror.join(&rel).context(error::InvalidDownloadURL{base: target.mirror.clone()})
}

/// File name of the Node.js runtime package
fn runtime_file(target: &BuildTarget) -> String {
    match target.platform {
        Platform::Windows => format!("node-v{}-{}.msi", target.version, target.arch),
        Platform::Linux => format!("node-v{}-linux-{}.tar.gz", target.version, target.arch),
    }
}

fn headers_file(target: &BuildTarget) -> String {
    format!("node-v{}-headers.tar.gz", target.version)
}

/// Name of the command installed by an npm package specification
/// (e.g. '@scope/tool@1.2.3' provides 'tool').
fn package_command(spec: &str) -> &str {
    let unversioned = match spec.rfind('@') {
        Some(pos) if pos > 0 => &spec[..pos],
        _ => spec,
    };
    match unversioned.rfind('/') {
        Some(pos) => &unversioned[pos + 1..],
        None => unversioned,
    }
}

fn package_install(target: &BuildTarget, host: &Host, options: &PlanOptions, root: &Path) -> PackageInstall {
    let module = root.join("node-gyp-module");
    let (prefix, removals) = match (target.platform, host.is_windows()) {
        (Platform::Windows, _) => (module.join("npm"), vec![]),
        // npm on Windows puts node_modules/ at the root of the prefix, next
        // to .cmd/.ps1 launchers. Using lib/ as the prefix makes it land
        // where a POSIX prefix has it. The launchers are dropped.
        (Platform::Linux, true) => {
            let prefix = module.join("lib");
            let removals = options.packages.iter()
                .map(|p| package_command(p))
                .flat_map(|cmd| vec![
                    prefix.join(cmd),
                    prefix.join(format!("{}.cmd", cmd)),
                    prefix.join(format!("{}.ps1", cmd)),
                ])
                .collect();
            (prefix, removals)
        },
        // The links in bin/ point to the prefix of the host. The installer
        // script creates them again on the target.
        (Platform::Linux, false) => (module.clone(), vec![module.join("bin")]),
    };
    PackageInstall {
        program: options.npm.clone(),
        prefix: prefix,
        packages: options.packages.clone(),
        removals: removals,
    }
}

fn archive(root: &Path, dir: &str, name: &str, format: ArchiveFormat, include_root: bool) -> ArchiveOp {
    ArchiveOp {
        source: root.join(dir),
        dest: root.join(format!("{}.{}", name, format.extension())),
        format: format,
        remove_source: true,
        include_root: include_root,
    }
}

/// Windows bundles need the Windows build of npm, hence a Windows host
pub fn check_host(platform: Platform, host: &Host) -> Result<()> {
    ensure!(platform != Platform::Windows || host.is_windows(),
        error::UnsupportedHost{
            target: platform.as_str(),
            host: host.platform.clone(),
        });
    Ok(())
}

/// Compute everything needed to produce the bundle of a target
pub fn plan(target: &BuildTarget, host: &Host, options: &PlanOptions) -> Result<InstallPlan> {
    check_host(target.platform, host)?;

    // The Windows installer script relies on 7za.exe
    let format = match target.platform {
        Platform::Windows => {
            if options.format != ArchiveFormat::Zip {
                warn!("Windows bundles are always packed as zip archives");
            }
            ArchiveFormat::Zip
        },
        Platform::Linux => options.format,
    };

    let root = options.work_dir.join(root_name(target));
    let version = target.version.as_str();
    let node_gyp_dir = root.join("node-gyp");
    let cmake_js_dir = root.join(".cmake-js");

    let mut directories = Vec::new();
    let mut downloads = vec![
        Download {
            url: release_url(target, &runtime_file(target))?,
            path: root.join(runtime_file(target)),
        },
        Download {
            url: release_url(target, &headers_file(target))?,
            path: root.join(headers_file(target)),
        },
    ];
    let mut copies = Vec::new();
    let mut extractions = Vec::new();
    let mut files = Vec::new();
    let mut archives = Vec::new();

    match (target.platform, format) {
        (Platform::Windows, _) => {
            // node-gyp and cmake-js both want node.lib, but do not expect
            // it at the same place.
            let cache = node_gyp_dir.join("Cache");
            directories.push(cache.clone());
            directories.push(cmake_js_dir.join("node-ia32"));
            directories.push(cmake_js_dir.join("node-x64"));
            let libs = [("x86", "ia32"), ("x64", "x64")];
            for (_, node_arch) in libs.iter() {
                directories.push(cache.join(version).join(node_arch));
            }
            for (win_arch, node_arch) in libs.iter() {
                directories.push(cmake_js_dir
                    .join(format!("node-{}", node_arch))
                    .join(format!("v{}", version))
                    .join(format!("win-{}", win_arch)));
            }
            for (win_arch, node_arch) in libs.iter() {
                downloads.push(Download {
                    url: release_url(target, &format!("win-{}/node.lib", win_arch))?,
                    path: cache.join(version).join(node_arch).join("node.lib"),
                });
            }
            for (win_arch, node_arch) in libs.iter() {
                copies.push(FileCopy {
                    from: cache.join(version).join(node_arch).join("node.lib"),
                    to: cmake_js_dir
                        .join(format!("node-{}", node_arch))
                        .join(format!("v{}", version))
                        .join(format!("win-{}", win_arch))
                        .join("node.lib"),
                });
            }
            copies.push(FileCopy {
                from: options.tools_dir.join("7za.exe"),
                to: root.join("7za.exe"),
            });
            archives.push(archive(&root, "node-gyp", "node-gyp-cache", format, true));
            archives.push(archive(&root, ".cmake-js", "cmake-js-cache", format, true));
        },
        (Platform::Linux, ArchiveFormat::Zip) => {
            copies.push(FileCopy {
                from: options.tools_dir.join("7za"),
                to: root.join("7za"),
            });
        },
        (Platform::Linux, ArchiveFormat::TarGz) => {
            // Lay the caches out now, so that the target only has to
            // extract them. cmake-js gets the same folders as with 7za.
            directories.push(node_gyp_dir.clone());
            let headers = root.join(headers_file(target));
            let top = format!("node-v{}", version);
            extractions.push(Extraction {
                archive: headers.clone(),
                dest: node_gyp_dir.clone(),
                rename: Some((top.clone(), version.to_string())),
            });
            for node_arch in &["ia32", "x64"] {
                let dest = cmake_js_dir.join(format!("node-{}", node_arch));
                directories.push(dest.clone());
                extractions.push(Extraction {
                    archive: headers.clone(),
                    dest: dest,
                    rename: Some((top.clone(), format!("v{}", version))),
                });
            }
            files.push(TextFile {
                path: node_gyp_dir.join(version).join("installVersion"),
                contents: format!("{}\n", NODE_GYP_INSTALL_VERSION),
                executable: false,
            });
            archives.push(archive(&root, "node-gyp", "node-gyp-cache", format, true));
            archives.push(archive(&root, ".cmake-js", "cmake-js-cache", format, true));
        },
    }
    archives.push(archive(&root, "node-gyp-module", "node-gyp-module", format, false));

    let script = TextFile {
        path: root.join(script::file_name(target.platform)),
        contents: script::render(target.platform, version, &target.arch, format),
        executable: script::is_executable(target.platform),
    };

    Ok(InstallPlan {
        packages: package_install(target, host, options, &root),
        root: root,
        directories: directories,
        downloads: downloads,
        copies: copies,
        extractions: extractions,
        files: files,
        script: script,
        archives: archives,
    })
}
