use log::{debug, info};

use crate::builder::check_permutation;
use crate::config::*;

/// Assigns every student to one faculty.
///
/// Students are ranked by decreasing CGPA (ties keep their roster order) and
/// processed in cycles of as many students as there are faculties. Within a cycle,
/// each student gets the best-ranked faculty that has not yet received a student
/// in that cycle. A student for whom no such faculty exists is left unallocated.
///
/// With [`PreferenceValidation::Strict`], the preferences of every student must be a
/// permutation of `1..=F`, whether the roster was loaded or built by hand.
///
/// The trace of the allocation is returned in [`AllocationResult::events`].
pub fn allocate_faculties(
    roster: &PreferenceRoster,
    rules: &AllocationRules,
) -> Result<AllocationResult, AllocationError> {
    let num_faculties = roster.faculties.len();
    if num_faculties == 0 {
        return Err(AllocationError::MissingColumn {
            column: "faculty preference columns".to_string(),
        });
    }
    if roster.students.is_empty() {
        return Err(AllocationError::EmptyRoster);
    }
    if let Some(s) = roster
        .students
        .iter()
        .find(|s| s.preferences.len() != num_faculties)
    {
        return Err(AllocationError::InvalidPreference {
            roll: s.roll.clone(),
            message: format!(
                "{} preferences given for {} faculties",
                s.preferences.len(),
                num_faculties
            ),
        });
    }

    if rules.preference_validation == PreferenceValidation::Strict {
        for s in roster.students.iter() {
            check_permutation(
                &s.roll,
                &s.preferences,
                roster.faculties.iter().map(|f| f.as_str()),
            )?;
        }
    }

    info!(
        "Allocating {} students to {} faculties: {:?}",
        roster.students.len(),
        num_faculties,
        roster.faculties
    );

    let mut sorted: Vec<&RankedStudent> = roster.students.iter().collect();
    // sort_by is stable.
    sorted.sort_by(|a, b| b.cgpa.total_cmp(&a.cgpa));

    let mut counts: Vec<Vec<u64>> = vec![vec![0; num_faculties]; num_faculties];
    let mut events: Vec<AllocationEvent> = Vec::new();
    let mut students: Vec<AllocatedStudent> = Vec::with_capacity(sorted.len());

    for (cycle, cycle_students) in sorted.chunks(num_faculties).enumerate() {
        let mut taken = vec![false; num_faculties];
        let mut allocated_in_cycle = 0;
        for (offset, s) in cycle_students.iter().enumerate() {
            let position = cycle * num_faculties + offset;
            let faculty = match find_slot(&s.preferences, &taken) {
                Some((fidx, rank)) => {
                    taken[fidx] = true;
                    allocated_in_cycle += 1;
                    counts[fidx][(rank - 1) as usize] += 1;
                    let faculty = roster.faculties[fidx].clone();
                    debug!(
                        "allocate_faculties: cycle {} position {}: {} (CGPA {}) -> {} (preference {})",
                        cycle, position, s.roll, s.cgpa_label, faculty, rank
                    );
                    events.push(AllocationEvent::Assigned {
                        cycle,
                        position,
                        roll: s.roll.clone(),
                        faculty: faculty.clone(),
                        rank,
                    });
                    Some(faculty)
                }
                None => {
                    debug!(
                        "allocate_faculties: cycle {} position {}: {} left unallocated",
                        cycle, position, s.roll
                    );
                    events.push(AllocationEvent::Unallocated {
                        cycle,
                        position,
                        roll: s.roll.clone(),
                    });
                    None
                }
            };
            students.push(AllocatedStudent {
                student: (*s).clone(),
                faculty,
            });
        }
        if cycle_students.len() == num_faculties && allocated_in_cycle < num_faculties {
            events.push(AllocationEvent::IncompleteCycle {
                cycle,
                allocated: allocated_in_cycle,
                expected: num_faculties,
            });
        }
    }

    let stats: Vec<PreferenceStats> = roster
        .faculties
        .iter()
        .zip(counts.into_iter())
        .map(|(faculty, counts)| PreferenceStats {
            faculty: faculty.clone(),
            counts,
        })
        .collect();
    let report = build_report(&roster.faculties, &students);
    info!(
        "Allocated {} students, {} unallocated",
        report.allocated, report.unallocated
    );

    Ok(AllocationResult {
        students,
        stats,
        events,
        report,
    })
}

// The first faculty, in column order, that the student ranks at the best possible
// rank and that is still free in this cycle.
fn find_slot(preferences: &[Option<u32>], taken: &[bool]) -> Option<(usize, u32)> {
    let num_faculties = preferences.len() as u32;
    for rank in 1..=num_faculties {
        for (fidx, pref) in preferences.iter().enumerate() {
            if *pref == Some(rank) && !taken[fidx] {
                return Some((fidx, rank));
            }
        }
    }
    None
}

fn build_report(faculties: &[String], students: &[AllocatedStudent]) -> AllocationReport {
    let num_faculties = faculties.len();
    let per_faculty: Vec<(String, u64)> = faculties
        .iter()
        .map(|f| {
            let count = students
                .iter()
                .filter(|s| s.faculty.as_ref() == Some(f))
                .count();
            (f.clone(), count as u64)
        })
        .collect();
    let allocated = students.iter().filter(|s| s.faculty.is_some()).count();
    let remaining_students = students.len() % num_faculties;
    let balanced = if remaining_students == 0 {
        let first = per_faculty.first().map(|(_, c)| *c);
        Some(per_faculty.iter().all(|(_, c)| Some(*c) == first))
    } else {
        None
    };
    AllocationReport {
        complete_cycles: students.len() / num_faculties,
        remaining_students,
        allocated,
        unallocated: students.len() - allocated,
        per_faculty,
        balanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn student(roll: &str, cgpa: f64, prefs: &[u32]) -> RankedStudent {
        RankedStudent {
            roll: roll.to_string(),
            name: format!("name {}", roll),
            email: format!("{}@example.org", roll),
            cgpa,
            cgpa_label: cgpa.to_string(),
            preferences: prefs.iter().map(|p| Some(*p)).collect(),
        }
    }

    fn faculties(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_faculties_both_first_choice() {
        let _ = env_logger::builder().is_test(true).try_init();
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B"]),
            students: vec![student("s1", 9.0, &[1, 2]), student("s2", 8.0, &[2, 1])],
        };
        let res = allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.students[0].allocated_label(), "A");
        assert_eq!(res.students[1].allocated_label(), "B");
        assert_eq!(res.stats[0].counts, vec![1, 0]);
        assert_eq!(res.stats[1].counts, vec![1, 0]);
        assert_eq!(res.report.balanced, Some(true));
    }

    #[test]
    fn conflicts_fall_back_to_next_rank() {
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B", "C"]),
            students: vec![
                student("low", 6.0, &[1, 2, 3]),
                student("top", 9.5, &[1, 2, 3]),
                student("mid", 8.0, &[1, 3, 2]),
            ],
        };
        let res = allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES).unwrap();
        let got: Vec<(&str, &str)> = res
            .students
            .iter()
            .map(|s| (s.student.roll.as_str(), s.allocated_label()))
            .collect();
        assert_eq!(got, vec![("top", "A"), ("mid", "C"), ("low", "B")]);
        // rank 1 for A, rank 2 for C and B.
        assert_eq!(res.stats[0].counts, vec![1, 0, 0]);
        assert_eq!(res.stats[1].counts, vec![0, 1, 0]);
        assert_eq!(res.stats[2].counts, vec![0, 1, 0]);
    }

    #[test]
    fn ties_keep_roster_order() {
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B"]),
            students: vec![
                student("first", 8.0, &[1, 2]),
                student("second", 8.0, &[1, 2]),
            ],
        };
        let res = allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.students[0].student.roll, "first");
        assert_eq!(res.students[0].allocated_label(), "A");
        assert_eq!(res.students[1].allocated_label(), "B");
    }

    #[test]
    fn every_complete_cycle_covers_all_faculties() {
        let prefs: [[u32; 3]; 4] = [[1, 2, 3], [3, 1, 2], [2, 3, 1], [1, 3, 2]];
        let students: Vec<RankedStudent> = (0..11)
            .map(|i| student(&format!("s{:02}", i), 10.0 - i as f64 * 0.3, &prefs[i % 4]))
            .collect();
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B", "C"]),
            students,
        };
        let res = allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.report.complete_cycles, 3);
        assert_eq!(res.report.remaining_students, 2);
        assert_eq!(res.report.unallocated, 0);
        for cycle in res.students.chunks(3).filter(|c| c.len() == 3) {
            let fs: HashSet<&str> = cycle.iter().map(|s| s.allocated_label()).collect();
            assert_eq!(fs.len(), 3);
        }
        let partial: HashSet<&str> = res.students[9..]
            .iter()
            .map(|s| s.allocated_label())
            .collect();
        assert_eq!(partial.len(), 2);

        // The statistics agree with the ranks actually used.
        for rank in 1..=3u32 {
            let from_events = res
                .events
                .iter()
                .filter(|e| matches!(e, AllocationEvent::Assigned { rank: r, .. } if *r == rank))
                .count() as u64;
            let from_stats: u64 = res.stats.iter().map(|s| s.counts[(rank - 1) as usize]).sum();
            assert_eq!(from_events, from_stats);
        }
        assert_eq!(res.report.per_faculty.iter().map(|(_, c)| c).sum::<u64>(), 11);
    }

    #[test]
    fn unreadable_preferences_leave_students_unallocated() {
        let mut s2 = student("s2", 8.0, &[1, 2]);
        s2.preferences = vec![Some(1), None];
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B"]),
            students: vec![student("s1", 9.0, &[1, 2]), s2],
        };
        let rules = AllocationRules {
            preference_validation: PreferenceValidation::BestEffort,
            ..AllocationRules::DEFAULT_RULES
        };
        let res = allocate_faculties(&roster, &rules).unwrap();
        assert_eq!(res.students[1].allocated_label(), UNALLOCATED);
        assert_eq!(res.report.unallocated, 1);
        assert_eq!(res.report.balanced, Some(false));
        assert!(res.events.contains(&AllocationEvent::IncompleteCycle {
            cycle: 0,
            allocated: 1,
            expected: 2
        }));
    }

    #[test]
    fn mismatched_preference_count() {
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B"]),
            students: vec![student("s1", 9.0, &[1])],
        };
        assert!(matches!(
            allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES),
            Err(AllocationError::InvalidPreference { .. })
        ));
    }

    #[test]
    fn strict_rules_apply_to_hand_built_rosters() {
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B"]),
            students: vec![student("s1", 9.0, &[1, 2]), student("s2", 8.0, &[1, 1])],
        };
        assert!(matches!(
            allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES),
            Err(AllocationError::InvalidPreference { roll, .. }) if roll == "s2"
        ));
        let rules = AllocationRules {
            preference_validation: PreferenceValidation::BestEffort,
            ..AllocationRules::DEFAULT_RULES
        };
        let res = allocate_faculties(&roster, &rules).unwrap();
        assert_eq!(res.students[0].allocated_label(), "A");
        assert_eq!(res.students[1].allocated_label(), UNALLOCATED);
    }

    #[test]
    fn allocation_is_deterministic() {
        let roster = PreferenceRoster {
            faculties: faculties(&["A", "B", "C"]),
            students: (0..7)
                .map(|i| student(&format!("s{}", i), (i % 3) as f64, &[3, 1, 2]))
                .collect(),
        };
        assert_eq!(allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES), allocate_faculties(&roster, &AllocationRules::DEFAULT_RULES));
    }
}
