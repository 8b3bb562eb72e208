use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::error::SynthError;

/// A local folder that gets zipped, uploaded to the staging bucket and
/// copied into its destination bucket at deploy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub source: PathBuf,
    /// sha256 of the relative file paths and their contents. Moving the
    /// folder somewhere else does not change it.
    pub hash: String,
    /// key of the packaged archive inside the staging bucket.
    pub object_key: String,
}

/// Reads the folder and computes its content hash.
pub fn stage(folder: &Path) -> Result<Asset, SynthError> {
    if !folder.is_dir() {
        return Err(SynthError::AssetNotFound(folder.to_path_buf()));
    }
    let files = list_files(folder)?;
    let mut hasher = Sha256::new();
    for (relative, path) in files.iter() {
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        let contents = fs::read(path).map_err(|e| SynthError::io(path, e))?;
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }
    let hash = format!("{:x}", hasher.finalize());
    debug!(folder = ?folder, files = files.len(), %hash, "staged asset");
    Ok(Asset {
        source: folder.to_path_buf(),
        object_key: format!("assets/{hash}.zip"),
        hash,
    })
}

/// Writes `<out_dir>/assets/<hash>.zip`. Entries are sorted and carry a
/// fixed timestamp so the same folder always produces the same archive.
pub fn package(asset: &Asset, out_dir: &Path) -> Result<PathBuf, SynthError> {
    let dest_dir = out_dir.join("assets");
    fs::create_dir_all(&dest_dir).map_err(|e| SynthError::io(&dest_dir, e))?;
    let dest = dest_dir.join(format!("{}.zip", asset.hash));
    let file = fs::File::create(&dest).map_err(|e| SynthError::io(&dest, e))?;
    let package_err = |source: zip::result::ZipError| SynthError::Package { path: dest.clone(), source };

    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);
    for (relative, path) in list_files(&asset.source)? {
        let contents = fs::read(&path).map_err(|e| SynthError::io(&path, e))?;
        zip.start_file(relative, options).map_err(package_err)?;
        zip.write_all(&contents).map_err(|e| SynthError::io(&dest, e))?;
    }
    zip.finish().map_err(package_err)?;
    debug!(archive = ?dest, "packaged asset");
    Ok(dest)
}

/// every file under `folder` as (relative path with `/` separators, full path).
fn list_files(folder: &Path) -> Result<Vec<(String, PathBuf)>, SynthError> {
    let mut out = vec![];
    for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| folder.to_path_buf());
                return Err(SynthError::io(path, e.into()));
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push((relative, entry.into_path()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn write_site(dir: &Path, index: &str) {
        fs::write(dir.join("index.html"), index).unwrap();
        fs::create_dir_all(dir.join("css")).unwrap();
        fs::write(dir.join("css").join("site.css"), "body { margin: 0 }").unwrap();
    }

    #[test]
    fn hash_ignores_folder_location() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_site(a.path(), "<h1>hi</h1>");
        write_site(b.path(), "<h1>hi</h1>");
        let asset_a = stage(a.path()).unwrap();
        let asset_b = stage(b.path()).unwrap();
        assert_eq!(asset_a.hash, asset_b.hash);
        assert_eq!(asset_a.object_key, format!("assets/{}.zip", asset_a.hash));
    }

    #[test]
    fn hash_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), "<h1>hi</h1>");
        let before = stage(dir.path()).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>bye</h1>").unwrap();
        let after = stage(dir.path()).unwrap();
        assert_ne!(before.hash, after.hash);
    }

    #[test]
    fn small_edits_change_the_hash() {
        // a +1/-2/+1 edit over adjacent bytes keeps an adler32 sum intact
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>bdb</h1>").unwrap();
        let before = stage(dir.path()).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>cbc</h1>").unwrap();
        let after = stage(dir.path()).unwrap();
        assert_ne!(before.hash, after.hash);
        assert_ne!(before.object_key, after.object_key);
        assert_eq!(after.hash.len(), 64);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = stage(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SynthError::AssetNotFound(_)));
    }

    #[test]
    fn package_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_site(dir.path(), "<h1>hi</h1>");
        let asset = stage(dir.path()).unwrap();
        let archive_path = package(&asset, out.path()).unwrap();
        assert_eq!(archive_path, out.path().join("assets").join(format!("{}.zip", asset.hash)));

        let mut archive = zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["css/site.css", "index.html"]);
        let mut index = String::new();
        archive.by_name("index.html").unwrap().read_to_string(&mut index).unwrap();
        assert_eq!(index, "<h1>hi</h1>");
    }
}
