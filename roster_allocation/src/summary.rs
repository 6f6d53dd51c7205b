use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::*;

/// Counts the students of each branch in every group.
///
/// The branch is derived again from the roll number of each student, since group
/// tables are written without it. Branch columns are sorted, and branches absent
/// from a group count as zero. Groups without students follow `rules.empty_group_policy`.
pub fn summarize_groups(
    groups: &[Group],
    rules: &AllocationRules,
) -> Result<GroupSummary, AllocationError> {
    let mut per_group: Vec<(String, BTreeMap<String, u64>)> = Vec::new();
    for g in groups.iter() {
        if g.students.is_empty() && rules.empty_group_policy == EmptyGroupPolicy::Skip {
            debug!("summarize_groups: skipping empty group {}", g.name);
            continue;
        }
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for (idx, s) in g.students.iter().enumerate() {
            let branch = rules.branch_rule.branch_of(&s.roll).ok_or_else(|| {
                AllocationError::MalformedInput {
                    row: Some(idx + 1),
                    message: format!(
                        "roll number {:?} in group {} is too short to hold a branch code",
                        s.roll, g.name
                    ),
                }
            })?;
            *counts.entry(branch).or_insert(0) += 1;
        }
        per_group.push((g.name.clone(), counts));
    }

    let branches: Vec<String> = per_group
        .iter()
        .flat_map(|(_, counts)| counts.keys().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();

    let rows = per_group
        .into_iter()
        .map(|(group, counts)| {
            let counts: Vec<u64> = branches
                .iter()
                .map(|b| counts.get(b).cloned().unwrap_or(0))
                .collect();
            SummaryRow {
                group,
                total: counts.iter().sum(),
                counts,
            }
        })
        .collect();

    Ok(GroupSummary { branches, rows })
}
