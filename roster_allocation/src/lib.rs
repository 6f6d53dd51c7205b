mod config;
use log::{debug, info};

use std::collections::HashMap;

pub mod builder;
pub mod manual;
mod mixing;
mod preference;
mod summary;

pub use crate::config::*;
pub use crate::mixing::{group_name, group_sizes, mix_largest_remaining, mix_round_robin};
pub use crate::preference::allocate_faculties;
pub use crate::summary::summarize_groups;

use crate::builder::{FacultyColumns, PreferenceRosterBuilder, RosterBuilder};

/// Loads a branch-mixing roster from the header and the rows of a table.
///
/// Index-like columns are dropped and the branch of every student is derived from
/// its roll number.
///
/// Arguments:
/// * `header` the names of the columns, in order
/// * `rows` the data rows, without the header
/// * `rules` the rules that govern this run (only the branch rule is used here)
pub fn load_roster(
    header: &[String],
    rows: &[Vec<String>],
    rules: &AllocationRules,
) -> Result<Roster, AllocationError> {
    let mut builder = RosterBuilder::new(rules)?.columns(header)?;
    for row in rows.iter() {
        builder.add_row(row)?;
    }
    let roster = builder.build()?;
    info!(
        "Loaded {} students, columns: {:?}",
        roster.students.len(),
        roster.columns
    );
    Ok(roster)
}

/// Loads a group table that was previously written out. The table may be empty.
pub fn load_group(
    name: &str,
    header: &[String],
    rows: &[Vec<String>],
    rules: &AllocationRules,
) -> Result<Group, AllocationError> {
    let mut builder = RosterBuilder::new(rules)?.columns(header)?;
    for row in rows.iter() {
        builder.add_row(row)?;
    }
    Ok(Group {
        name: name.to_string(),
        students: builder.build_allow_empty().students,
    })
}

/// Loads a faculty-allocation roster: `Roll`, `Name`, `Email`, `CGPA` and one
/// preference column per faculty.
pub fn load_preference_roster(
    header: &[String],
    rows: &[Vec<String>],
    faculty_columns: &FacultyColumns,
    rules: &AllocationRules,
) -> Result<PreferenceRoster, AllocationError> {
    let mut builder = PreferenceRosterBuilder::new(rules)?.columns(header, faculty_columns)?;
    for row in rows.iter() {
        builder.add_row(row)?;
    }
    let roster = builder.build()?;
    info!(
        "Loaded {} students with preferences for {} faculties",
        roster.students.len(),
        roster.faculties.len()
    );
    Ok(roster)
}

/// Splits the roster by branch.
///
/// Branches come in the order of their first student, and students keep their
/// roster order inside a branch.
pub fn partition_by_branch(roster: &Roster) -> Vec<BranchTable> {
    let mut tables: Vec<BranchTable> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for s in roster.students.iter() {
        match positions.get(s.branch.as_str()) {
            Some(idx) => tables[*idx].students.push(s.clone()),
            None => {
                positions.insert(s.branch.as_str(), tables.len());
                tables.push(BranchTable {
                    branch: s.branch.clone(),
                    students: vec![s.clone()],
                });
            }
        }
    }
    debug!(
        "partition_by_branch: {:?}",
        tables
            .iter()
            .map(|t| (t.branch.as_str(), t.students.len()))
            .collect::<Vec<_>>()
    );
    tables
}
