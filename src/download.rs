/* This is part of nodegyp-offline - which is under the MIT License ***********/

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::error;

use indicatif::{ProgressBar, ProgressStyle};
use snafu::{ResultExt, ensure};
use log::*;
use curl::easy::Easy;

/// Perform a GET request and keep the whole response body in memory.
/// Only meant for small documents, such as the release index.
pub fn to_memory(handle: &mut Easy, url: &url::Url) -> Result<Vec<u8>> {
    debug!("Fetching {}", url);
    handle.url(url.as_str()).context(error::URLError{url: url.clone()})?;
    handle.follow_location(true).context(error::CURLSetupError{})?;
    handle.progress(false).context(error::CURLSetupError{})?;

    let mut data = Vec::new();
    {
        let mut transfer = handle.transfer();
        transfer.write_function(|chunk| {
            data.extend_from_slice(chunk);
            Ok(chunk.len())
        }).context(error::CURLSetupError{})?;
        transfer.perform().context(error::RequestError{url: url.clone()})?;
    }

    let code = handle.response_code()
        .context(error::RequestError{url: url.clone()})?;
    ensure!(code == 200, error::DownloadError{
        url: url.clone(),
        code: code,
    });
    Ok(data)
}

fn stream_to_file(handle: &mut Easy, url: &url::Url, path: &Path) -> Result<()> {
    handle.url(url.as_str()).context(error::URLError{url: url.clone()})?;
    handle.follow_location(true).context(error::CURLSetupError{})?;

    let mut file = std::fs::File::create(path).context(
        error::CreateFileError{ path: path.to_path_buf() }
    )?;

    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .progress_chars("#>-"));

    handle.progress(true).context(error::CURLSetupError{})?;
    let mut write_error = None;
    let performed = {
        let mut transfer = handle.transfer();
        transfer.progress_function(|total, dl, _, _| {
            pb.set_length(total as u64);
            pb.set_position(dl as u64);
            true
        }).context(error::CURLSetupError{})?;
        // Reporting less bytes than received makes curl abort the transfer.
        // The actual I/O error is kept aside to be reported instead.
        transfer.write_function(|data| {
            match file.write_all(data) {
                Ok(()) => Ok(data.len()),
                Err(err) => {
                    write_error = Some(err);
                    Ok(0)
                },
            }
        }).context(error::CURLSetupError{})?;

        info!("Downloading file from {}", url);
        transfer.perform()
    };
    pb.finish_and_clear();

    if let Some(err) = write_error {
        return Err(err).context(error::FailedToWrite{path: path.to_path_buf()});
    }
    performed.context(error::RequestError{url: url.clone()})?;

    // The transfer went fine, but the server may still have refused to
    // serve the file.
    let code = handle.response_code()
        .context(error::RequestError{url: url.clone()})?;
    ensure!(code == 200, error::DownloadError{
        url: url.clone(),
        code: code,
    });
    Ok(())
}

/// Download the file at the given URL to path. Upon failure, nothing is left
/// behind at path.
pub fn to_file(handle: &mut Easy, url: &url::Url, path: &Path) -> Result<()> {
    let result = stream_to_file(handle, url, path);
    if result.is_err() && path.is_file() {
        debug!("Removing incomplete download {:#?}", path);
        if let Err(err) = std::fs::remove_file(path) {
            warn!("Failed to remove incomplete download {:#?}: {}", path, err);
        }
    }
    result
}

/// Something able to retrieve a remote file into a local path
pub trait Fetcher {
    fn fetch(&mut self, url: &url::Url, path: &Path) -> Result<()>;
}

impl Fetcher for Easy {
    fn fetch(&mut self, url: &url::Url, path: &Path) -> Result<()> {
        to_file(self, url, path)
    }
}
