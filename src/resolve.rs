/* This is part of nodegyp-offline - which is under the MIT License ***********/

use snafu::{ResultExt, ensure};
use log::*;

use crate::catalog::{self, ReleaseRecord};
use crate::error::Result;
use crate::error;
use crate::host::Host;

/// Mirror used when nothing else has been specified
pub const FALLBACK_MIRROR: &str = "https://npmmirror.com/mirrors/node/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    pub fn parse(name: &str) -> Result<Platform> {
        match name.to_ascii_lowercase().as_str() {
            "win32" | "windows" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => error::UnsupportedPlatform{platform: name}.fail(),
        }
    }

    /// Name of the platform, as Node.js calls it
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "win32",
            Platform::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything needed to assemble one bundle
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    /// Node.js version, without the leading 'v'
    pub version: String,
    pub platform: Platform,
    pub arch: String,
    /// Base URL of the mirror, always ending with a '/'
    pub mirror: url::Url,
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{} v{}", self.platform, self.arch, self.version)
    }
}

/// Unprocessed user settings. The same structure is used for the command
/// line and for the environment overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOptions {
    pub platform: Option<String>,
    pub arch: Option<String>,
    pub version: Option<String>,
    pub mirror: Option<String>,
    pub auto_lts_count: Option<String>,
}

fn getenv(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

impl RawOptions {
    /// Collect the overrides from the environment
    pub fn from_env() -> RawOptions {
        RawOptions {
            platform: getenv("TARGET_PLATFORM"),
            arch: getenv("TARGET_ARCH"),
            version: getenv("TARGET_VERSION"),
            mirror: getenv("NODEJS_MIRROR"),
            auto_lts_count: getenv("AUTO_LTS_COUNT"),
        }
    }

    /// Fill the settings that are not set with the ones of other
    pub fn or(self, other: RawOptions) -> RawOptions {
        RawOptions {
            platform: self.platform.or(other.platform),
            arch: self.arch.or(other.arch),
            version: self.version.or(other.version),
            mirror: self.mirror.or(other.mirror),
            auto_lts_count: self.auto_lts_count.or(other.auto_lts_count),
        }
    }
}

/// Strip the leading 'v' of a version. An empty or missing version is
/// no version at all.
pub fn normalize_version(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let version = if raw.starts_with('v') { &raw[1..] } else { raw };
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

/// Make sure the mirror ends with exactly one '/'. An empty or missing
/// mirror is no mirror at all.
pub fn normalize_mirror(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    Some(format!("{}/", raw.trim_end_matches('/')))
}

/// First non-empty value, by order of precedence
fn pick(values: &[&Option<String>]) -> Option<String> {
    values.iter()
        .filter_map(|v| v.as_ref())
        .find(|v| ! v.is_empty())
        .cloned()
}

pub fn resolve_mirror(options: &RawOptions, env: &RawOptions) -> Result<url::Url> {
    let mirror = normalize_mirror(env.mirror.as_deref())
        .or_else(|| normalize_mirror(options.mirror.as_deref()))
        .unwrap_or_else(|| FALLBACK_MIRROR.to_string());
    url::Url::parse(&mirror).context(error::InvalidMirrorURL{url: mirror.clone()})
}

/// Target platform. Cheap enough to be checked before anything else.
pub fn resolve_platform(options: &RawOptions, env: &RawOptions, host: &Host) -> Result<Platform> {
    let platform = pick(&[&env.platform, &options.platform])
        .unwrap_or_else(|| host.platform.clone());
    Platform::parse(&platform)
}

fn resolve_lts_count(options: &RawOptions, env: &RawOptions) -> Result<Option<usize>> {
    match pick(&[&env.auto_lts_count, &options.auto_lts_count]) {
        Some(val) => {
            let nb: usize = val.trim().parse()
                .context(error::InvalidLtsCount{value: val.clone()})?;
            ensure!(nb > 0, error::ZeroLtsCount{});
            Ok(Some(nb))
        },
        None => Ok(None),
    }
}

fn resolve_version(options: &RawOptions, env: &RawOptions, host: &Host,
                   catalog: &[ReleaseRecord]) -> Result<String> {
    let explicit = normalize_version(env.version.as_deref())
        .or_else(|| normalize_version(options.version.as_deref()))
        .or_else(|| normalize_version(host.runtime_version.as_deref()));
    match explicit {
        Some(version) => Ok(version),
        None => {
            let lts = catalog::latest_lts(catalog)?;
            info!("No version requested and no Node.js installed: using latest LTS v{}",
                lts.version);
            Ok(lts.version.clone())
        },
    }
}

/// Compute the build targets requested by the user. Environment overrides
/// take precedence over the options, which take precedence over what the
/// host provides.
pub fn resolve(options: &RawOptions, env: &RawOptions, host: &Host,
               catalog: &[ReleaseRecord]) -> Result<Vec<BuildTarget>> {
    let platform = resolve_platform(options, env, host)?;
    let arch = pick(&[&env.arch, &options.arch])
        .unwrap_or_else(|| host.arch.clone());
    let mirror = resolve_mirror(options, env)?;

    let versions = match resolve_lts_count(options, env)? {
        Some(count) => {
            let lines = catalog::lts_per_major_line(catalog);
            ensure!(! lines.is_empty(), error::NoLtsRelease{});
            if count > lines.len() {
                warn!("{} LTS lines requested, but only {} are available",
                    count, lines.len());
            }
            lines.iter()
                .take(count)
                .map(|r| r.version.clone())
                .collect()
        },
        None => vec![resolve_version(options, env, host, catalog)?],
    };

    Ok(versions.into_iter()
        .map(|version| BuildTarget {
            version: version,
            platform: platform,
            arch: arch.clone(),
            mirror: mirror.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{record, sample};

    fn host() -> Host {
        Host {
            platform: "linux".to_string(),
            arch: "x64".to_string(),
            runtime_version: Some("v18.12.1".to_string()),
        }
    }

    fn opt(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn version_normalization() {
        for v in &["16.14.0", "20.0.0", "0.10.48", "18.0.0-rc.1"] {
            let prefixed = format!("v{}", v);
            assert_eq!(normalize_version(Some(v)), normalize_version(Some(&prefixed)));
            assert!(! normalize_version(Some(v)).unwrap().starts_with('v'));
        }
        assert_eq!(normalize_version(None), None);
        assert_eq!(normalize_version(Some("")), None);
        assert_eq!(normalize_version(Some("v")), None);
    }

    #[test]
    fn mirror_normalization() {
        for u in &["https://nodejs.org/dist", "https://nodejs.org/dist/",
                   "https://example.test/node//", "http://localhost:8080"] {
            let once = normalize_mirror(Some(u)).unwrap();
            assert!(once.ends_with('/'));
            assert!(! once.ends_with("//"));
            assert_eq!(normalize_mirror(Some(&once)).unwrap(), once);
        }
        assert_eq!(normalize_mirror(None), None);
        assert_eq!(normalize_mirror(Some("")), None);
    }

    #[test]
    fn platforms() {
        assert_eq!(Platform::parse("win32").unwrap(), Platform::Windows);
        assert_eq!(Platform::parse("Windows").unwrap(), Platform::Windows);
        assert_eq!(Platform::parse("linux").unwrap(), Platform::Linux);
        let err = Platform::parse("darwin").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn host_defaults() {
        let targets = resolve(&RawOptions::default(), &RawOptions::default(),
            &host(), &sample()).unwrap();
        assert_eq!(targets, vec![BuildTarget {
            version: "18.12.1".to_string(),
            platform: Platform::Linux,
            arch: "x64".to_string(),
            mirror: url::Url::parse(FALLBACK_MIRROR).unwrap(),
        }]);
    }

    #[test]
    fn environment_wins() {
        let options = RawOptions {
            platform: opt("linux"),
            arch: opt("arm64"),
            version: opt("v16.14.0"),
            mirror: opt("https://cli.test/node"),
            auto_lts_count: None,
        };
        let env = RawOptions {
            platform: None,
            arch: opt("armv7l"),
            version: opt("v20.0.0"),
            mirror: opt("https://env.test/node"),
            auto_lts_count: None,
        };
        let targets = resolve(&options, &env, &host(), &sample()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].arch, "armv7l");
        assert_eq!(targets[0].version, "20.0.0");
        assert_eq!(targets[0].mirror.as_str(), "https://env.test/node/");

        let targets = resolve(&options, &RawOptions::default(), &host(), &sample()).unwrap();
        assert_eq!(targets[0].arch, "arm64");
        assert_eq!(targets[0].version, "16.14.0");
        assert_eq!(targets[0].mirror.as_str(), "https://cli.test/node/");
    }

    #[test]
    fn empty_values_fall_through() {
        let env = RawOptions {
            platform: opt(""),
            arch: opt(""),
            version: opt(""),
            mirror: opt(""),
            auto_lts_count: opt(""),
        };
        let options = RawOptions {
            version: opt("16.14.0"),
            ..RawOptions::default()
        };
        let targets = resolve(&options, &env, &host(), &sample()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].version, "16.14.0");
        assert_eq!(targets[0].arch, "x64");
        assert_eq!(targets[0].mirror.as_str(), FALLBACK_MIRROR);
    }

    #[test]
    fn latest_lts_without_runtime() {
        let mut host = host();
        host.runtime_version = None;
        let targets = resolve(&RawOptions::default(), &RawOptions::default(),
            &host, &sample()).unwrap();
        assert_eq!(targets[0].version, "22.1.0");

        let err = resolve(&RawOptions::default(), &RawOptions::default(),
            &host, &[record("21.0.0", None)]).unwrap_err();
        assert!(matches!(err, error::Error::NoLtsRelease { .. }));
    }

    #[test]
    fn auto_lts_is_capped() {
        let options = RawOptions {
            version: opt("16.14.0"),
            auto_lts_count: opt("5"),
            ..RawOptions::default()
        };
        let targets = resolve(&options, &RawOptions::default(), &host(), &sample()).unwrap();
        let versions: Vec<&str> = targets.iter().map(|t| t.version.as_str()).collect();
        assert_eq!(versions, vec!["22.1.0", "20.3.0"]);
        assert!(targets.iter().all(|t| t.platform == Platform::Linux && t.arch == "x64"));
    }

    #[test]
    fn auto_lts_takes_most_recent_lines() {
        let options = RawOptions {
            auto_lts_count: opt("1"),
            ..RawOptions::default()
        };
        let targets = resolve(&options, &RawOptions::default(), &host(), &sample()).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].version, "22.1.0");
    }

    #[test]
    fn auto_lts_count_must_be_valid() {
        let zero = RawOptions { auto_lts_count: opt("0"), ..RawOptions::default() };
        let err = resolve(&zero, &RawOptions::default(), &host(), &sample()).unwrap_err();
        assert!(matches!(err, error::Error::ZeroLtsCount { .. }));

        let garbage = RawOptions { auto_lts_count: opt("two"), ..RawOptions::default() };
        let err = resolve(&garbage, &RawOptions::default(), &host(), &sample()).unwrap_err();
        assert!(matches!(err, error::Error::InvalidLtsCount { .. }));

        let none = vec![record("21.0.0", None)];
        let one = RawOptions { auto_lts_count: opt("1"), ..RawOptions::default() };
        let err = resolve(&one, &RawOptions::default(), &host(), &none).unwrap_err();
        assert!(matches!(err, error::Error::NoLtsRelease { .. }));
    }

    #[test]
    fn unsupported_platform() {
        let options = RawOptions { platform: opt("darwin"), ..RawOptions::default() };
        let err = resolve(&options, &RawOptions::default(), &host(), &sample()).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn platform_needs_no_catalog() {
        let env = RawOptions { platform: opt("win32"), ..RawOptions::default() };
        let options = RawOptions { platform: opt("linux"), ..RawOptions::default() };
        assert_eq!(resolve_platform(&options, &env, &host()).unwrap(), Platform::Windows);
        assert_eq!(resolve_platform(&options, &RawOptions::default(), &host()).unwrap(),
            Platform::Linux);
        let options = RawOptions { platform: opt("freebsd"), ..RawOptions::default() };
        let err = resolve_platform(&options, &RawOptions::default(), &host()).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn invalid_mirror() {
        let options = RawOptions { mirror: opt("not a url"), ..RawOptions::default() };
        let err = resolve_mirror(&options, &RawOptions::default()).unwrap_err();
        assert!(matches!(err, error::Error::InvalidMirrorURL { .. }));
    }

    #[test]
    fn options_merge() {
        let cli = RawOptions { arch: opt("x64"), ..RawOptions::default() };
        let file = RawOptions { arch: opt("arm64"), version: opt("16.0.0"), ..RawOptions::default() };
        let merged = cli.or(file);
        assert_eq!(merged.arch, opt("x64"));
        assert_eq!(merged.version, opt("16.0.0"));
    }
}
