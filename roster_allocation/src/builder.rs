pub use crate::config::*;

use log::debug;
use std::collections::HashSet;

/// A builder for branch-mixing rosters.
///
/// The header is given first, then the rows one at a time, as they come out of a
/// file reader. Columns that carry no information (unnamed index columns, `Unique`,
/// a stale `Branch`) are dropped, and the branch of every student is derived from
/// the roll number.
///
/// ```
/// pub use roster_allocation::builder::RosterBuilder;
/// pub use roster_allocation::AllocationRules;
/// # use roster_allocation::AllocationError;
///
/// let mut builder = RosterBuilder::new(&AllocationRules::DEFAULT_RULES)?
///     .columns(&["Roll".to_string(), "Name".to_string()])?;
///
/// builder.add_row(&["2301CS01".to_string(), "Anna".to_string()])?;
/// let roster = builder.build()?;
/// assert_eq!(roster.students[0].branch, "CS");
///
/// # Ok::<(), AllocationError>(())
/// ```
pub struct RosterBuilder {
    pub(crate) _rules: AllocationRules,
    pub(crate) _columns: Vec<String>,
    // Positions of the kept columns in the source header.
    pub(crate) _kept: Vec<usize>,
    pub(crate) _roll_idx: usize,
    pub(crate) _students: Vec<Student>,
}

impl RosterBuilder {
    pub fn new(rules: &AllocationRules) -> Result<RosterBuilder, AllocationError> {
        Ok(RosterBuilder {
            _rules: rules.clone(),
            _columns: Vec::new(),
            _kept: Vec::new(),
            _roll_idx: 0,
            _students: Vec::new(),
        })
    }

    pub fn columns(self, header: &[String]) -> Result<RosterBuilder, AllocationError> {
        let kept = kept_columns(header);
        let roll_idx =
            find_column(header, ROLL_COLUMN).ok_or_else(|| AllocationError::MalformedInput {
                row: None,
                message: format!("no {:?} column to derive the branch from", ROLL_COLUMN),
            })?;
        debug!("RosterBuilder: kept columns: {:?}", kept);
        Ok(RosterBuilder {
            _rules: self._rules,
            _columns: kept.iter().map(|idx| header[*idx].trim().to_string()).collect(),
            _kept: kept,
            _roll_idx: roll_idx,
            _students: Vec::new(),
        })
    }

    /// Adds a row of the source table. Missing trailing cells are read as empty.
    pub fn add_row(&mut self, row: &[String]) -> Result<(), AllocationError> {
        let lineno = self._students.len() + 1;
        let roll = cell(row, self._roll_idx).trim().to_string();
        let branch = self
            ._rules
            .branch_rule
            .branch_of(&roll)
            .ok_or_else(|| AllocationError::MalformedInput {
                row: Some(lineno),
                message: format!(
                    "roll number {:?} is too short to hold a branch code (need {} characters)",
                    roll,
                    self._rules.branch_rule.start + self._rules.branch_rule.len
                ),
            })?;
        let fields = self._kept.iter().map(|idx| cell(row, *idx).to_string()).collect();
        self._students.push(Student {
            roll,
            branch,
            fields,
        });
        Ok(())
    }

    /// The roster, which must contain at least one student.
    pub fn build(self) -> Result<Roster, AllocationError> {
        if self._students.is_empty() {
            return Err(AllocationError::EmptyRoster);
        }
        Ok(self.build_allow_empty())
    }

    /// The roster, possibly without any student. Used for group tables, which may
    /// legitimately be empty.
    pub fn build_allow_empty(self) -> Roster {
        Roster {
            columns: self._columns,
            students: self._students,
        }
    }
}

/// Where the faculty preference columns are found.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FacultyColumns {
    /// Every kept column that is not `Roll`, `Name`, `Email` or `CGPA`, in source order.
    Remaining,
    Named(Vec<String>),
}

/// A builder for faculty-allocation rosters.
///
/// ```
/// pub use roster_allocation::builder::{FacultyColumns, PreferenceRosterBuilder};
/// pub use roster_allocation::AllocationRules;
/// # use roster_allocation::AllocationError;
///
/// let header: Vec<String> = ["Roll", "Name", "Email", "CGPA", "A", "B"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let mut builder = PreferenceRosterBuilder::new(&AllocationRules::DEFAULT_RULES)?
///     .columns(&header, &FacultyColumns::Remaining)?;
/// builder.add_row(&["r1", "Anna", "anna@x", "9.1", "2", "1"].map(String::from))?;
/// let roster = builder.build()?;
/// assert_eq!(roster.faculties, vec!["A".to_string(), "B".to_string()]);
///
/// # Ok::<(), AllocationError>(())
/// ```
pub struct PreferenceRosterBuilder {
    pub(crate) _rules: AllocationRules,
    pub(crate) _faculties: Vec<(String, usize)>,
    pub(crate) _roll_idx: usize,
    pub(crate) _name_idx: usize,
    pub(crate) _email_idx: usize,
    pub(crate) _cgpa_idx: usize,
    pub(crate) _students: Vec<RankedStudent>,
}

impl PreferenceRosterBuilder {
    pub fn new(rules: &AllocationRules) -> Result<PreferenceRosterBuilder, AllocationError> {
        Ok(PreferenceRosterBuilder {
            _rules: rules.clone(),
            _faculties: Vec::new(),
            _roll_idx: 0,
            _name_idx: 0,
            _email_idx: 0,
            _cgpa_idx: 0,
            _students: Vec::new(),
        })
    }

    pub fn columns(
        self,
        header: &[String],
        faculty_columns: &FacultyColumns,
    ) -> Result<PreferenceRosterBuilder, AllocationError> {
        let roll_idx =
            find_column(header, ROLL_COLUMN).ok_or_else(|| AllocationError::MalformedInput {
                row: None,
                message: format!("no {:?} column", ROLL_COLUMN),
            })?;
        let required = |name: &str| {
            find_column(header, name).ok_or_else(|| AllocationError::MissingColumn {
                column: name.to_string(),
            })
        };
        let name_idx = required(NAME_COLUMN)?;
        let email_idx = required(EMAIL_COLUMN)?;
        let cgpa_idx = required(CGPA_COLUMN)?;

        let faculties: Vec<(String, usize)> = match faculty_columns {
            FacultyColumns::Remaining => {
                let fixed = [ROLL_COLUMN, NAME_COLUMN, EMAIL_COLUMN, CGPA_COLUMN];
                kept_columns(header)
                    .into_iter()
                    .map(|idx| (header[idx].trim().to_string(), idx))
                    .filter(|(name, _)| !fixed.contains(&name.as_str()))
                    .collect()
            }
            FacultyColumns::Named(names) => {
                let mut res = Vec::new();
                for name in names {
                    res.push((name.clone(), required(name.as_str())?));
                }
                res
            }
        };
        if faculties.is_empty() {
            return Err(AllocationError::MissingColumn {
                column: "faculty preference columns".to_string(),
            });
        }
        debug!("PreferenceRosterBuilder: faculties: {:?}", faculties);

        Ok(PreferenceRosterBuilder {
            _rules: self._rules,
            _faculties: faculties,
            _roll_idx: roll_idx,
            _name_idx: name_idx,
            _email_idx: email_idx,
            _cgpa_idx: cgpa_idx,
            _students: Vec::new(),
        })
    }

    pub fn add_row(&mut self, row: &[String]) -> Result<(), AllocationError> {
        let lineno = self._students.len() + 1;
        let roll = cell(row, self._roll_idx).trim().to_string();
        let cgpa_label = cell(row, self._cgpa_idx).trim().to_string();
        let cgpa = cgpa_label
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| AllocationError::MalformedInput {
                row: Some(lineno),
                message: format!("CGPA {:?} of student {:?} is not a number", cgpa_label, roll),
            })?;

        let preferences: Vec<Option<u32>> = self
            ._faculties
            .iter()
            .map(|(_, idx)| parse_rank(cell(row, *idx)))
            .collect();
        if self._rules.preference_validation == PreferenceValidation::Strict {
            check_permutation(
                &roll,
                &preferences,
                self._faculties.iter().map(|(name, _)| name.as_str()),
            )?;
        }

        self._students.push(RankedStudent {
            roll,
            name: cell(row, self._name_idx).trim().to_string(),
            email: cell(row, self._email_idx).trim().to_string(),
            cgpa,
            cgpa_label,
            preferences,
        });
        Ok(())
    }

    pub fn build(self) -> Result<PreferenceRoster, AllocationError> {
        if self._students.is_empty() {
            return Err(AllocationError::EmptyRoster);
        }
        Ok(PreferenceRoster {
            faculties: self._faculties.into_iter().map(|(name, _)| name).collect(),
            students: self._students,
        })
    }
}

/// Whether a source column is dropped when loading a roster.
pub fn is_dropped_column(name: &str) -> bool {
    let name = name.trim();
    name.is_empty()
        || name.starts_with(UNNAMED_PREFIX)
        || name == UNIQUE_COLUMN
        || name == BRANCH_COLUMN
}

fn kept_columns(header: &[String]) -> Vec<usize> {
    header
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_dropped_column(name))
        .map(|(idx, _)| idx)
        .collect()
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

// Spreadsheets hand out integers as floats ("2.0").
fn parse_rank(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(x) = s.parse::<u32>() {
        return Some(x);
    }
    s.parse::<f64>()
        .ok()
        .filter(|x| x.fract() == 0.0 && *x >= 0.0 && *x <= u32::MAX as f64)
        .map(|x| x as u32)
}

/// Checks that the ranks of a student are a permutation of `1..=F`, where `F`
/// is the number of preferences.
pub(crate) fn check_permutation<'a>(
    roll: &str,
    preferences: &[Option<u32>],
    faculties: impl Iterator<Item = &'a str>,
) -> Result<(), AllocationError> {
    let num_faculties = preferences.len() as u32;
    let mut seen: HashSet<u32> = HashSet::new();
    for (pref, faculty) in preferences.iter().zip(faculties) {
        let invalid = |message: String| AllocationError::InvalidPreference {
            roll: roll.to_string(),
            message,
        };
        match pref {
            None => {
                return Err(invalid(format!("no readable rank for faculty {}", faculty)));
            }
            Some(rank) if *rank < 1 || *rank > num_faculties => {
                return Err(invalid(format!(
                    "rank {} for faculty {} is outside 1..={}",
                    rank, faculty, num_faculties
                )));
            }
            Some(rank) if !seen.insert(*rank) => {
                return Err(invalid(format!("rank {} is given more than once", rank)));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
