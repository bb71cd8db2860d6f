//! Sitemap file output

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes a sitemap document to `output_path`
///
/// The document is written to a sibling temporary file first and then
/// renamed over the target, so a reader never sees a partial sitemap.
///
/// # Arguments
///
/// * `output_path` - Where the sitemap should end up
/// * `xml` - The rendered document
///
/// # Returns
///
/// * `Ok(())` - Sitemap written
/// * `Err(io::Error)` - Failed to write or rename the file
pub fn write_sitemap(output_path: &Path, xml: &str) -> io::Result<()> {
    let temp_path = temp_path_for(output_path);

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(xml.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, output_path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result?;
    tracing::info!("Sitemap written to {}", output_path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("sitemap.xml"));
    name.push(".tmp");
    path.with_file_name(name)
}
