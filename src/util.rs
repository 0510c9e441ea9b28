/* This is part of nodegyp-offline - which is under the MIT License ***********/

use snafu::ResultExt;

use std::io::Write;
use std::path::Path;
use crate::error::Result;
use crate::error;
use log::*;

/// Remove a file or a whole directory. Removing something that does not
/// exist is not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(ref err) if err.kind() == std::io::ErrorKind::NotFound => {
            trace!("Nothing to remove at {:#?}", path);
            return Ok(());
        },
        Err(err) => return Err(err).context(error::RemoveError{path: path.to_path_buf()}),
    };
    debug!("Removing {:#?}", path);
    let removed = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.context(error::RemoveError{path: path.to_path_buf()})
}

pub fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).context(
        error::CreateDirError{ path: path.to_path_buf() })
}

/// Delete the directory, if any, and create it again empty
pub fn recreate_dir(path: &Path) -> Result<()> {
    remove_path(path)?;
    create_dir(path)
}

/// Copy a file, creating the destination directory if needed
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(dir) = to.parent() {
        create_dir(dir)?;
    }
    debug!("Copying {:#?} to {:#?}", from, to);
    std::fs::copy(from, to).context(error::CopyFailed{
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    })?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms)
        .context(error::SetPermissionsFailed{path: path.to_path_buf()})
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> Result<()> {
    trace!("No executable bit to set on {:#?}", path);
    Ok(())
}

/// Write a text file. When executable is set, the file is given the
/// 0755 mode on platforms that know about it.
pub fn write_text(path: &Path, contents: &str, executable: bool) -> Result<()> {
    let mut file = std::fs::File::create(path).context(
        error::CreateFileError{path: path.to_path_buf()})?;
    file.write_all(contents.as_bytes())
        .context(error::FailedToWrite{path: path.to_path_buf()})?;
    if executable {
        make_executable(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_anything() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        create_dir(&dir).unwrap();
        let file = dir.join("file");
        write_text(&file, "data", false).unwrap();

        remove_path(&file).unwrap();
        assert!(! file.exists());
        remove_path(&tmp.path().join("a")).unwrap();
        assert!(! dir.exists());
        remove_path(&tmp.path().join("missing")).unwrap();
    }

    #[test]
    fn recreate_empties() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("root");
        create_dir(&dir).unwrap();
        write_text(&dir.join("stale"), "old", false).unwrap();
        recreate_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn copy_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("node.lib");
        write_text(&from, "lib", false).unwrap();
        let to = tmp.path().join("x/y/node.lib");
        copy_file(&from, &to).unwrap();
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "lib");

        let err = copy_file(&tmp.path().join("nope"), &to).unwrap_err();
        assert!(matches!(err, error::Error::CopyFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn executable_script() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("install.sh");
        write_text(&path, "#!/bin/sh\n", true).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
