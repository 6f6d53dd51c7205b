// Conversions from the allocation results to the tables that are written out.

use crate::pipeline::{io_common::Table, *};

pub fn students_table(columns: &[String], students: &[Student]) -> Table {
    Table {
        header: columns.to_vec(),
        rows: students.iter().map(|s| s.fields.clone()).collect(),
    }
}

pub fn summary_table(summary: &GroupSummary) -> Table {
    let mut header = vec![GROUP_COLUMN.to_string()];
    header.extend(summary.branches.iter().cloned());
    header.push(TOTAL_COLUMN.to_string());
    let rows = summary
        .rows
        .iter()
        .map(|r| {
            let mut row = vec![r.group.clone()];
            row.extend(r.counts.iter().map(|c| c.to_string()));
            row.push(r.total.to_string());
            row
        })
        .collect();
    Table { header, rows }
}

pub fn allocation_table(result: &AllocationResult) -> Table {
    let header = [
        ROLL_COLUMN,
        NAME_COLUMN,
        EMAIL_COLUMN,
        CGPA_COLUMN,
        ALLOCATED_COLUMN,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let rows = result
        .students
        .iter()
        .map(|a| {
            vec![
                a.student.roll.clone(),
                a.student.name.clone(),
                a.student.email.clone(),
                a.student.cgpa_label.clone(),
                a.allocated_label().to_string(),
            ]
        })
        .collect();
    Table { header, rows }
}

pub fn preference_count_table(result: &AllocationResult) -> Table {
    let num_ranks = result.stats.len() as u32;
    let mut header = vec![FACULTY_COLUMN.to_string()];
    header.extend((1..=num_ranks).map(preference_count_column));
    let rows = result
        .stats
        .iter()
        .map(|s| {
            let mut row = vec![s.faculty.clone()];
            row.extend(s.counts.iter().map(|c| c.to_string()));
            row
        })
        .collect();
    Table { header, rows }
}
