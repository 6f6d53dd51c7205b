use calamine::DataType;
use std::path::Path;

/// A table of text cells: what is read from a source and what is written out.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// The text of a spreadsheet cell. Whole numbers are written without a
/// fractional part, so that `1.0` reads as the rank `1`.
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => format!("{}", f),
        DataType::Int(i) => format!("{}", i),
        other => other.to_string(),
    }
}

/// The position of a group file such as `g12`, used to order the groups
/// of a directory. Names that do not follow the pattern come last.
pub fn group_index(name: &str) -> Option<usize> {
    name.strip_prefix('g')?.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_to_string(&DataType::Float(3.0)), "3");
        assert_eq!(cell_to_string(&DataType::Float(8.75)), "8.75");
        assert_eq!(cell_to_string(&DataType::Int(12)), "12");
        assert_eq!(cell_to_string(&DataType::String(" CS ".to_string())), "CS");
        assert_eq!(cell_to_string(&DataType::Empty), "");
    }

    #[test]
    fn group_indexes() {
        assert_eq!(group_index("g1"), Some(1));
        assert_eq!(group_index("g10"), Some(10));
        assert_eq!(group_index("summary"), None);
        assert_eq!(group_index("gx"), None);
        assert_eq!(simplify_file_name("a/b/g2.csv"), "g2.csv");
    }
}
