// Primitives for reading and writing CSV files.

use crate::pipeline::{
    io_common::{group_index, Table},
    *,
};

/// Reads a CSV file whose first record is the header.
///
/// Rows may have fewer cells than the header. Rows made only of blank cells are
/// skipped.
pub fn read_csv_table(path: &str) -> AllocResult<Table> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => {
            let line = line_r.context(CsvLineParseSnafu { path, lineno: 1usize })?;
            line.iter()
                .enumerate()
                .map(|(idx, s)| {
                    let s = if idx == 0 { s.trim_start_matches('\u{feff}') } else { s };
                    s.trim().to_string()
                })
                .collect()
        }
        None => return Ok(Table::default()),
    };
    debug!("read_csv_table: {} header: {:?}", path, header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let row: Vec<String> = line.iter().map(|s| s.trim().to_string()).collect();
        if row.iter().all(|s| s.is_empty()) {
            debug!("read_csv_table: skipping blank line {}", lineno);
            continue;
        }
        rows.push(row);
    }
    Ok(Table { header, rows })
}

pub fn write_table(path: &Path, table: &Table) -> AllocResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu {
        path: path_s.clone(),
    })?;
    wtr.write_record(&table.header).context(CsvWriteSnafu {
        path: path_s.clone(),
    })?;
    for row in table.rows.iter() {
        wtr.write_record(row).context(CsvWriteSnafu {
            path: path_s.clone(),
        })?;
    }
    wtr.flush().context(WritingFileSnafu { path: path_s })?;
    Ok(())
}

/// Reads all the group files (`g1.csv`, `g2.csv`, ...) of a directory, in group order.
pub fn read_group_dir(dir: &Path) -> AllocResult<Vec<(String, Table)>> {
    let dir_s = dir.display().to_string();
    let entries = fs::read_dir(dir).context(OpeningFileSnafu {
        path: dir_s.clone(),
    })?;
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry_r in entries {
        let entry = entry_r.context(OpeningFileSnafu {
            path: dir_s.clone(),
        })?;
        let p = entry.path();
        if p.extension().map(|e| e == "csv").unwrap_or(false) {
            if let Some(stem) = p.file_stem() {
                files.push((stem.to_string_lossy().to_string(), p));
            }
        }
    }
    files.sort_by_key(|(name, _)| (group_index(name).unwrap_or(usize::MAX), name.clone()));
    debug!(
        "read_group_dir: {}: {:?}",
        dir_s,
        files.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
    );

    let mut res = Vec::new();
    for (name, p) in files.into_iter() {
        let table = read_csv_table(&p.display().to_string())?;
        res.push((name, table));
    }
    Ok(res)
}
