// ********* Column names ***********

use std::error::Error;
use std::fmt::Display;

pub const ROLL_COLUMN: &str = "Roll";
pub const NAME_COLUMN: &str = "Name";
pub const EMAIL_COLUMN: &str = "Email";
pub const CGPA_COLUMN: &str = "CGPA";
pub const BRANCH_COLUMN: &str = "Branch";
/// Source columns with this name are always dropped.
pub const UNIQUE_COLUMN: &str = "Unique";
/// Prefix given by spreadsheet exports to index columns without a header.
pub const UNNAMED_PREFIX: &str = "Unnamed";

pub const ALLOCATED_COLUMN: &str = "Allocated";
pub const FACULTY_COLUMN: &str = "Faculty";
pub const GROUP_COLUMN: &str = "Group";
pub const TOTAL_COLUMN: &str = "Total";

/// Label written for the students that could not be placed in their cycle.
pub const UNALLOCATED: &str = "UNALLOCATED";

/// Header of the statistics column for the given preference rank (1-based).
pub fn preference_count_column(rank: u32) -> String {
    format!("Count Pref {}", rank)
}

// ********* Input data structures ***********

/// A student of a branch-mixing roster.
///
/// `fields` holds the cells of the row, aligned with [`Roster::columns`].
/// The branch is not one of them: it is derived from the roll number.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct Student {
    pub roll: String,
    pub branch: String,
    pub fields: Vec<String>,
}

/// The students in source order, with the columns that are written back out.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Roster {
    pub columns: Vec<String>,
    pub students: Vec<Student>,
}

/// A student of a faculty-allocation roster.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedStudent {
    pub roll: String,
    pub name: String,
    pub email: String,
    pub cgpa: f64,
    /// The CGPA as written in the source, used for output.
    pub cgpa_label: String,
    /// One entry per faculty, aligned with [`PreferenceRoster::faculties`].
    /// `None` when the cell could not be read as a rank.
    pub preferences: Vec<Option<u32>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PreferenceRoster {
    pub faculties: Vec<String>,
    pub students: Vec<RankedStudent>,
}

// ******** Output data structures *********

/// All the students of one branch, in roster order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct BranchTable {
    pub branch: String,
    pub students: Vec<Student>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Group {
    pub name: String,
    pub students: Vec<Student>,
}

/// Branch composition of a set of groups.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct GroupSummary {
    /// Sorted branch codes, one per count column.
    pub branches: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SummaryRow {
    pub group: String,
    pub counts: Vec<u64>,
    pub total: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllocatedStudent {
    pub student: RankedStudent,
    pub faculty: Option<String>,
}

impl AllocatedStudent {
    pub fn allocated_label(&self) -> &str {
        self.faculty.as_deref().unwrap_or(UNALLOCATED)
    }
}

/// How many students a faculty received at each preference rank.
/// `counts[k]` is the number of students placed at rank `k + 1`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PreferenceStats {
    pub faculty: String,
    pub counts: Vec<u64>,
}

/// One step of the allocation, in processing order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum AllocationEvent {
    Assigned {
        cycle: usize,
        position: usize,
        roll: String,
        faculty: String,
        rank: u32,
    },
    Unallocated {
        cycle: usize,
        position: usize,
        roll: String,
    },
    /// A complete cycle in which some faculty did not receive a student.
    IncompleteCycle {
        cycle: usize,
        allocated: usize,
        expected: usize,
    },
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct AllocationReport {
    pub complete_cycles: usize,
    pub remaining_students: usize,
    pub allocated: usize,
    pub unallocated: usize,
    pub per_faculty: Vec<(String, u64)>,
    /// Set only when every cycle is complete: whether all the faculties
    /// received the same number of students.
    pub balanced: Option<bool>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllocationResult {
    /// Students in CGPA order, highest first.
    pub students: Vec<AllocatedStudent>,
    pub stats: Vec<PreferenceStats>,
    pub events: Vec<AllocationEvent>,
    pub report: AllocationReport,
}

/// Errors that prevent a roster from being loaded or allocated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AllocationError {
    MissingColumn {
        column: String,
    },
    /// `row` is the 1-based data row, if the problem is tied to one.
    MalformedInput {
        row: Option<usize>,
        message: String,
    },
    InvalidPreference {
        roll: String,
        message: String,
    },
    EmptyRoster,
    InvalidGroupCount,
}

impl Error for AllocationError {}

impl Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::MissingColumn { column } => {
                write!(f, "missing required column {:?}", column)
            }
            AllocationError::MalformedInput {
                row: Some(row),
                message,
            } => write!(f, "malformed input at row {}: {}", row, message),
            AllocationError::MalformedInput { row: None, message } => {
                write!(f, "malformed input: {}", message)
            }
            AllocationError::InvalidPreference { roll, message } => {
                write!(f, "invalid preferences for student {}: {}", roll, message)
            }
            AllocationError::EmptyRoster => write!(f, "the roster does not contain any student"),
            AllocationError::InvalidGroupCount => {
                write!(f, "the number of groups must be at least 1")
            }
        }
    }
}

// ********* Configuration **********

/// Where the branch code sits in the roll number, in characters.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct BranchRule {
    pub start: usize,
    pub len: usize,
}

impl BranchRule {
    /// Characters 4 and 5 of the roll number, e.g. `CS` in `2301CS01`.
    pub const DEFAULT: BranchRule = BranchRule { start: 4, len: 2 };

    /// The branch code of a roll number, or `None` when the roll is too short.
    pub fn branch_of(&self, roll: &str) -> Option<String> {
        if roll.chars().count() < self.start + self.len {
            return None;
        }
        Some(roll.chars().skip(self.start).take(self.len).collect())
    }
}

/// What the summary does with a group that received no student.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EmptyGroupPolicy {
    Skip,
    IncludeAsZeroRow,
}

/// Tiebreak between branches with the same number of remaining students,
/// for the largest-remaining mix.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BranchTieBreak {
    /// The smallest branch code wins.
    NameAscending,
    /// The greatest branch code wins. This is what older versions of the tool did.
    NameDescending,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PreferenceValidation {
    /// Every student must rank each faculty exactly once, from 1 to the number of faculties.
    Strict,
    /// Unreadable cells are ignored and the students that cannot be placed are left unallocated.
    BestEffort,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AllocationRules {
    pub branch_rule: BranchRule,
    pub empty_group_policy: EmptyGroupPolicy,
    pub tie_break: BranchTieBreak,
    pub preference_validation: PreferenceValidation,
}

impl AllocationRules {
    pub const DEFAULT_RULES: AllocationRules = AllocationRules {
        branch_rule: BranchRule::DEFAULT,
        empty_group_policy: EmptyGroupPolicy::Skip,
        tie_break: BranchTieBreak::NameAscending,
        preference_validation: PreferenceValidation::Strict,
    };
}
