/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::collections::HashSet;

use serde_derive::Deserialize;
use snafu::{ResultExt, OptionExt};
use log::*;

use crate::error::Result;
use crate::error;
use crate::download;
use crate::resolve::normalize_version;

/// One release, as listed in the mirror's index.json
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRecord {
    /// Version, without the leading 'v'
    pub version: String,
    pub date: String,
    /// LTS codename. None if the release is not an LTS one.
    pub lts: Option<String>,
}

/// The "lts" field of index.json is either `false` or the codename of the
/// LTS line (e.g. "Gallium").
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LtsField {
    Label(String),
    Flag(bool),
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    version: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    lts: Option<LtsField>,
}

impl From<RawRelease> for ReleaseRecord {
    fn from(raw: RawRelease) -> Self {
        let lts = match raw.lts {
            Some(LtsField::Label(label)) if ! label.is_empty() => Some(label),
            _ => None,
        };
        ReleaseRecord {
            version: normalize_version(Some(&raw.version))
                .unwrap_or(raw.version),
            date: raw.date,
            lts: lts,
        }
    }
}

impl ReleaseRecord {
    pub fn is_lts(&self) -> bool {
        self.lts.is_some()
    }
}

/// Decode the contents of an index.json document. The URL is only used
/// to report errors.
pub fn parse(data: &[u8], url: &url::Url) -> Result<Vec<ReleaseRecord>> {
    let raw: Vec<RawRelease> = serde_json::from_slice(data)
        .context(error::CatalogFormat{url: url.clone()})?;
    Ok(raw.into_iter().map(ReleaseRecord::from).collect())
}

/// Retrieve and decode the list of releases served by a mirror
pub fn fetch(handle: &mut curl::easy::Easy, url: &url::Url) -> Result<Vec<ReleaseRecord>> {
    info!("Retrieving the list of Node.js releases from {}", url);
    let data = download::to_memory(handle, url)?;
    let records = parse(&data, url)?;
    debug!("The release index lists {} releases", records.len());
    Ok(records)
}

/// The most recent LTS release. The index is sorted from the most recent
/// release to the oldest one.
pub fn latest_lts(records: &[ReleaseRecord]) -> Result<&ReleaseRecord> {
    records.iter()
        .find(|r| r.is_lts())
        .context(error::NoLtsRelease{})
}

/// Extract the major number of a 'X.Y.Z' version. Anything else is
/// rejected.
fn major_of(version: &str) -> Option<u64> {
    let vec: Vec<&str> = version.split('.').collect();
    if vec.len() != 3 {
        return None;
    }
    if vec.iter().any(|n| n.is_empty() || ! n.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    vec[0].parse().ok()
}

/// Keep the most recent release of each major line, and only then retain
/// the LTS ones. A major line whose latest release is not an LTS is dropped
/// even if older releases of that line were.
pub fn lts_per_major_line(records: &[ReleaseRecord]) -> Vec<&ReleaseRecord> {
    let mut seen = HashSet::new();
    records.iter()
        .filter(|r| match major_of(&r.version) {
            Some(major) => seen.insert(major),
            None => {
                trace!("Ignoring release with unexpected version '{}'", r.version);
                false
            },
        })
        .filter(|r| r.is_lts())
        .collect()
}
