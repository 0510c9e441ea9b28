/* This is part of nodegyp-offline - which is under the MIT License ***********/

mod archive;
mod bundle;
mod catalog;
mod config;
mod download;
mod error;
mod host;
mod interrupt;
mod layout;
mod logging;
mod npm;
mod resolve;
mod script;
mod util;

use clap::{Arg, App, AppSettings};
use crate::error::Result;
use snafu::ResultExt;
use log::*;

/// Returns whether every bundle is complete
fn run(matches: &clap::ArgMatches) -> Result<bool> {
    let host = host::detect()?;
    let config = config::new(matches, &host)?;

    // Bail out before any download or write if this host cannot produce
    // the requested bundles
    let platform = resolve::resolve_platform(&config.options, &config.env, &host)?;
    layout::check_host(platform, &host)?;

    let interrupt = interrupt::get()?;

    let mirror = resolve::resolve_mirror(&config.options, &config.env)?;
    let index = mirror.join("index.json")
        .context(error::InvalidDownloadURL{base: mirror.clone()})?;
    let mut handle = curl::easy::Easy::new();
    let releases = catalog::fetch(&mut handle, &index)?;
    match catalog::latest_lts(&releases) {
        Ok(lts) => info!("Latest LTS release is v{} ({})", lts.version, lts.date),
        Err(err) => warn!("{}", err),
    }

    let targets = resolve::resolve(&config.options, &config.env, &host, &releases)?;

    // Nothing is written on disk before all targets are known to be
    // feasible on this host
    let mut plans = Vec::new();
    for target in &targets {
        plans.push(layout::plan(target, &host, &config.plan)?);
    }
    util::create_dir(&config.plan.work_dir)?;

    let mut report = bundle::Report::default();
    for (target, plan) in targets.iter().zip(plans.iter()) {
        bundle::run(target, plan, &mut handle, &interrupt, &mut report);
    }
    report.log_summary();
    Ok(report.is_complete())
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    // -v/--version selects the Node.js version
    App::new("nodegyp-offline")
        .setting(AppSettings::DisableVersion)
        .author("Jean Guyomarc'h <jean@guyomarch.bzh>")
        .about("Assemble offline install bundles for building Node.js native addons")
        .arg(Arg::with_name("platform")
            .short("p")
            .long("platform")
            .value_name("PLATFORM")
            .help("Target platform: 'win32' or 'linux'. Defaults to the host platform")
            .takes_value(true))
        .arg(Arg::with_name("arch")
            .short("a")
            .long("arch")
            .value_name("ARCH")
            .help("Target architecture (e.g. x64, ia32, arm64). Defaults to the host architecture")
            .takes_value(true))
        .arg(Arg::with_name("version")
            .short("v")
            .long("version")
            .value_name("VERSION")
            .help("Node.js version to bundle, with or without a leading 'v'")
            .takes_value(true))
        .arg(Arg::with_name("mirror")
            .short("m")
            .long("mirror")
            .value_name("URL")
            .help("Base URL of the Node.js distribution mirror")
            .takes_value(true))
        .arg(Arg::with_name("auto_lts_count")
            .short("c")
            .long("auto-lts-count")
            .alias("autoLTSCount")
            .value_name("N")
            .help("Bundle the latest LTS release of the N most recent LTS major lines")
            .takes_value(true))
        .arg(Arg::with_name("archive_format")
            .short("f")
            .long("archive-format")
            .value_name("FORMAT")
            .help("Format of the archives of a Linux bundle: 'zip' (default) or 'tar.gz'")
            .takes_value(true))
        .arg(Arg::with_name("output_dir")
            .short("O")
            .long("output-dir")
            .value_name("DIR")
            .help("Set the directory in which bundles are created")
            .takes_value(true))
        .arg(Arg::with_name("tools_dir")
            .short("T")
            .long("tools-dir")
            .value_name("DIR")
            .help("Set the directory containing 7za and 7za.exe")
            .takes_value(true))
        .arg(Arg::with_name("config")
            .short("C")
            .long("config")
            .value_name("FILE")
            .help("Read settings from a TOML configuration file")
            .takes_value(true))
        .arg(Arg::with_name("npm")
            .long("npm")
            .value_name("PROGRAM")
            .help("npm executable used to install the build tools")
            .takes_value(true))
        .arg(Arg::with_name("version_info")
            .short("V")
            .long("version-info")
            .help("Print the version of this program"))
        .arg(Arg::with_name("verbose")
            .long("verbose")
            .multiple(true)
            .help("Increase verbosity. May be repeated"))
}

fn main() {
    let matches = app().get_matches();
    if matches.is_present("version_info") {
        println!("nodegyp-offline {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let level = logging::level_from_verbosity(matches.occurrences_of("verbose"));
    if let Err(err) = logging::init(level) {
        eprintln!("ERROR: {}", err);
        std::process::exit(3);
    };

    match run(&matches) {
        Ok(true) => {},
        Ok(false) => std::process::exit(5),
        Err(err) => {
            error!("{}", err);
            std::process::exit(if err.is_unsupported() { 4 } else { 2 });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(args: &[&str]) -> Result<bool> {
        let mut argv = vec!["nodegyp-offline"];
        argv.extend_from_slice(args);
        run(&app().get_matches_from(argv))
    }

    // Nothing listens on port 9: reaching the network would fail with a
    // download error instead.
    #[cfg(not(windows))]
    #[test]
    fn windows_target_rejected_first() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("fresh-out");
        let err = run_with(&["-p", "win32", "-m", "http://127.0.0.1:9/",
                             "-O", out.to_str().unwrap()]).unwrap_err();
        assert!(err.is_unsupported(), "{}", err);
        assert!(! out.exists());
    }

    #[test]
    fn unknown_platform_rejected_first() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("fresh-out");
        let err = run_with(&["-p", "solaris", "-m", "http://127.0.0.1:9/",
                             "-O", out.to_str().unwrap()]).unwrap_err();
        assert!(matches!(err, error::Error::UnsupportedPlatform { .. }), "{}", err);
        assert!(! out.exists());
    }
}
