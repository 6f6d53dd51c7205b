use std::fs::File;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::pipeline::*;

/// Packs every file under `base_dir` into a zip archive. Entries are named by
/// their path relative to `base_dir`.
///
/// The archive itself is never packed, even when it sits inside `base_dir`.
///
/// Returns the number of files written.
pub fn write_archive(base_dir: &Path, archive_path: &Path) -> AllocResult<usize> {
    let mut files: Vec<PathBuf> = Vec::new();
    collect_files(base_dir, &mut files)?;
    // A stale archive of a previous run may be among the collected files.
    if let Ok(archive_c) = fs::canonicalize(archive_path) {
        files.retain(|p| fs::canonicalize(p).map(|c| c != archive_c).unwrap_or(true));
    }
    files.sort();

    let path = archive_path.display().to_string();
    let file = File::create(archive_path).context(WritingFileSnafu { path: path.clone() })?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for p in files.iter() {
        let rel = p.strip_prefix(base_dir).unwrap_or(p.as_path());
        let entry_name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<String>>()
            .join("/");
        debug!("write_archive: adding {}", entry_name);
        zip.start_file(entry_name, options)
            .context(ArchiveSnafu { path: path.clone() })?;
        let mut input = File::open(p).context(OpeningFileSnafu {
            path: p.display().to_string(),
        })?;
        std::io::copy(&mut input, &mut zip).context(WritingFileSnafu { path: path.clone() })?;
    }
    zip.finish().context(ArchiveSnafu { path })?;
    Ok(files.len())
}

fn collect_files(dir: &Path, acc: &mut Vec<PathBuf>) -> AllocResult<()> {
    let entries = fs::read_dir(dir).context(OpeningFileSnafu {
        path: dir.display().to_string(),
    })?;
    for entry_r in entries {
        let entry = entry_r.context(OpeningFileSnafu {
            path: dir.display().to_string(),
        })?;
        let p = entry.path();
        if p.is_dir() {
            collect_files(&p, acc)?;
        } else {
            acc.push(p);
        }
    }
    Ok(())
}
