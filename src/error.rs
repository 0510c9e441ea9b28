/* This is part of nodegyp-offline - which is under the MIT License ***********/

use snafu::{Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to initialize logging"))]
    LogInitFailed {
    },

    #[snafu(display("Could not retrieve current directory: {}", source))]
    CwdAccess {
        source: std::io::Error,
    },

    #[snafu(display("Failed to retrieve the canonical path to {:#?}: {}", dir, source))]
    CanonFailed {
        dir: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("The mirror URL '{}' seems invalid: {}", url, source))]
    InvalidMirrorURL {
        url: String,
        source: url::ParseError,
    },

    #[snafu(display("Failed to compose a download URL from {}: {}", base, source))]
    InvalidDownloadURL {
        base: url::Url,
        source: url::ParseError,
    },

    #[snafu(display("Invalid LTS count '{}': {}", value, source))]
    InvalidLtsCount {
        value: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("An LTS count of 0 is meaningless"))]
    ZeroLtsCount {
    },

    #[snafu(display("Unknown archive format '{}' (expected 'zip' or 'tar.gz')", format))]
    InvalidArchiveFormat {
        format: String,
    },

    #[snafu(display("Platform '{}' is not supported (expected 'win32' or 'linux')", platform))]
    UnsupportedPlatform {
        platform: String,
    },

    #[snafu(display("Bundling for platform '{}' is not supported on a '{}' host", target, host))]
    UnsupportedHost {
        target: String,
        host: String,
    },

    #[snafu(display("The release index does not contain any LTS release"))]
    NoLtsRelease {
    },

    #[snafu(display("The release index at {} is not valid: {}", url, source))]
    CatalogFormat {
        url: url::Url,
        source: serde_json::Error,
    },

    #[snafu(display("Failed to read file {:#?}: {}", path, source))]
    FailedToRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to read file {:#?}: {}", path, source))]
    FailedToDeser {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("Failed to decode UTF-8 string {}", source))]
    FailedToDecodeUTF8 {
        source: std::string::FromUtf8Error,
    },

    #[snafu(display("Ill-formed path {:#?}", path))]
    IllFormedPath {
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to run process '{}': {}", proc, source))]
    ProgFailed {
        source: std::io::Error,
        proc: String,
    },

    #[snafu(display("'{}' failed to install {} into {:#?}", proc, packages, prefix))]
    NpmFailed {
        proc: String,
        packages: String,
        prefix: std::path::PathBuf,
    },

    #[snafu(display("Failed to create directory {:?}: {}", path, source))]
    CreateDirError {
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to remove {:?}: {}", path, source))]
    RemoveError {
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to create/open file {:#?}: {}", path, source))]
    CreateFileError {
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to write data at path {:#?}: {}", path, source))]
    FailedToWrite {
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to set permissions of {:#?}: {}", path, source))]
    SetPermissionsFailed {
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    #[snafu(display("Failed to copy {:#?} to {:#?}: {}", from, to, source))]
    CopyFailed {
        from: std::path::PathBuf,
        to: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to iterate over directory {:#?}: {}", dir, source))]
    DirIterFailed {
        dir: std::path::PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("Failed to build zip archive {:#?}: {}", path, source))]
    ZipFailed {
        path: std::path::PathBuf,
        source: zip::result::ZipError,
    },

    #[snafu(display("Failed to build archive {:#?}: {}", path, source))]
    ArchiveFailed {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to decompress {:#?}: {}", path, source))]
    TarFailed {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Archive {:#?} contains an entry escaping the destination: {:#?}", arch, entry))]
    UnsafeArchiveEntry {
        arch: std::path::PathBuf,
        entry: std::path::PathBuf,
    },

    #[snafu(display("curl refused url '{}': {}", url, source))]
    URLError {
        source: curl::Error,
        url: url::Url,
    },

    #[snafu(display("Failed to setup curl: {}", source))]
    CURLSetupError {
        source: curl::Error,
    },

    #[snafu(display("Failed to download file from URL {}: HTTP code: {}", url, code))]
    DownloadError {
        code: u32,
        url: url::Url,
    },

    #[snafu(display("Failed to download file from URL {}: {}", url, source))]
    RequestError {
        source: curl::Error,
        url: url::Url,
    },

    #[snafu(display("Failed to setup signal handler: {}", source))]
    CtrlCFailed {
        source: ctrlc::Error,
    },
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether the error denotes a platform combination we cannot bundle
    /// for. Such errors are reported with their own exit status.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Error::UnsupportedPlatform { .. } | Error::UnsupportedHost { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_printed_plainly() {
        let url = url::Url::parse("https://example.test/node/v20.0.0/node.lib").unwrap();
        let err = Error::DownloadError { code: 404, url: url };
        assert_eq!(err.to_string(),
            "Failed to download file from URL https://example.test/node/v20.0.0/node.lib: HTTP code: 404");
        assert!(! err.is_unsupported());
    }
}
