use log::debug;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::config::*;

/// The size of each group when `total` students are split in `num_groups` groups.
///
/// The first `total % num_groups` groups receive one extra student.
pub fn group_sizes(total: usize, num_groups: usize) -> Result<Vec<usize>, AllocationError> {
    if num_groups == 0 {
        return Err(AllocationError::InvalidGroupCount);
    }
    let (q, r) = (total / num_groups, total % num_groups);
    Ok((0..num_groups)
        .map(|idx| if idx < r { q + 1 } else { q })
        .collect())
}

/// Name of the group at the given 0-based position: `g1`, `g2`, ...
pub fn group_name(idx: usize) -> String {
    format!("g{}", idx + 1)
}

/// Splits the roster in `num_groups` groups by sweeping the branches in the order
/// in which they first appear, one student per branch at a time.
///
/// Within a branch, students keep their roster order.
pub fn mix_round_robin(roster: &Roster, num_groups: usize) -> Result<Vec<Group>, AllocationError> {
    let sizes = group_sizes(roster.students.len(), num_groups)?;

    // Queues in order of first appearance.
    let mut queues: Vec<(String, VecDeque<Student>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for s in roster.students.iter() {
        let idx = *positions.entry(s.branch.clone()).or_insert_with(|| {
            queues.push((s.branch.clone(), VecDeque::new()));
            queues.len() - 1
        });
        queues[idx].1.push_back(s.clone());
    }
    debug!(
        "mix_round_robin: branch order: {:?}",
        queues.iter().map(|(b, _)| b).collect::<Vec<_>>()
    );

    let mut groups: Vec<Group> = Vec::new();
    for (idx, size) in sizes.iter().enumerate() {
        let mut students: Vec<Student> = Vec::new();
        while students.len() < *size && queues.iter().any(|(_, q)| !q.is_empty()) {
            for (_, queue) in queues.iter_mut() {
                if students.len() >= *size {
                    break;
                }
                if let Some(s) = queue.pop_front() {
                    students.push(s);
                }
            }
        }
        debug!("mix_round_robin: {}: {} students", group_name(idx), students.len());
        groups.push(Group {
            name: group_name(idx),
            students,
        });
    }
    Ok(groups)
}

/// Splits the roster in `num_groups` groups by repeatedly taking as many students as
/// possible from the branch with the most remaining students.
///
/// Groups that cannot be filled (fewer students than groups) are returned empty.
pub fn mix_largest_remaining(
    roster: &Roster,
    num_groups: usize,
    tie_break: BranchTieBreak,
) -> Result<Vec<Group>, AllocationError> {
    let sizes = group_sizes(roster.students.len(), num_groups)?;

    let mut queues: BTreeMap<String, VecDeque<Student>> = BTreeMap::new();
    for s in roster.students.iter() {
        queues
            .entry(s.branch.clone())
            .or_insert_with(VecDeque::new)
            .push_back(s.clone());
    }

    let mut groups: Vec<Group> = Vec::new();
    for (idx, size) in sizes.iter().enumerate() {
        let mut students: Vec<Student> = Vec::new();
        let mut remaining = *size;
        while remaining > 0 {
            let branch = match select_branch(&queues, tie_break) {
                Some(b) => b,
                None => break,
            };
            // Branches are removed as soon as they are exhausted.
            let queue = match queues.get_mut(&branch) {
                Some(q) => q,
                None => break,
            };
            let take = queue.len().min(remaining);
            debug!(
                "mix_largest_remaining: {}: taking {} from {} ({} left)",
                group_name(idx),
                take,
                branch,
                queue.len()
            );
            students.extend(queue.drain(..take));
            remaining -= take;
            if queue.is_empty() {
                queues.remove(&branch);
            }
        }
        groups.push(Group {
            name: group_name(idx),
            students,
        });
    }
    Ok(groups)
}

/// The branch with the longest queue. Empty queues are never selected.
fn select_branch(
    queues: &BTreeMap<String, VecDeque<Student>>,
    tie_break: BranchTieBreak,
) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    // Iterates in increasing branch order.
    for (branch, queue) in queues.iter().filter(|(_, q)| !q.is_empty()) {
        let len = queue.len();
        best = match best {
            None => Some((branch, len)),
            Some((_, best_len)) if len > best_len => Some((branch, len)),
            Some((_, best_len))
                if len == best_len && tie_break == BranchTieBreak::NameDescending =>
            {
                Some((branch, len))
            }
            b => b,
        };
    }
    best.map(|(b, _)| b.clone())
}
