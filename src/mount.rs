//! Paths under which resolved assets appear in the bithorde FUSE mount.
//!
//! The mount exposes every asset at `<fusedir>/<magnet link>`, so the path is
//! a pure function of the asset's fingerprint and display name.

use std::path::{Component, Path, PathBuf};

use hordebrowse_common::{Error, Result};
use hordebrowse_db::Record;

/// `magnet:?xt=urn:tree:tiger:<hash>[&dn=<name>]` for a record.
pub fn magnet_url(record: &Record) -> Result<String> {
    let fingerprint = record.id.fingerprint().ok_or_else(|| {
        Error::invalid_input(format!("{} has no tree:tiger fingerprint", record.id))
    })?;

    let mut url = format!("magnet:?xt=urn:tree:tiger:{}", fingerprint);
    if let Some(name) = record.first("name").filter(|name| !name.is_empty()) {
        url.push_str("&dn=");
        url.push_str(&urlencoding::encode(name));
    }
    Ok(url)
}

/// Location of a record's content inside the mount at `fusedir`.
pub fn fuse_path(fusedir: &Path, record: &Record) -> Result<PathBuf> {
    Ok(fusedir.join(magnet_url(record)?))
}

/// `file://` URL for a local path, each segment percent-encoded.
pub fn file_url(path: &Path) -> String {
    let mut url = String::from("file://");
    for component in path.components() {
        match component {
            Component::RootDir => {}
            Component::Normal(segment) => {
                url.push('/');
                url.push_str(&urlencoding::encode(&segment.to_string_lossy()));
            }
            other => {
                url.push('/');
                url.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    url
}
