/*!

This is the long-form manual for `roster_allocation` and `rosteralloc`.

## Input formats

Rosters are tables with a header row. The following sources are supported:
* `csv` Comma Separated Values, UTF-8
* `excel` a workbook (`.xlsx`, `.xls`, `.ods`). The first worksheet is used, unless
  the workbook has several worksheets, in which case the name must be given.

Whatever the source, columns without a name, columns whose name starts with
`Unnamed` (index columns left by spreadsheet exports), the `Unique` column and any
existing `Branch` column are dropped.

### Group mixing rosters

Only the `Roll` column is required. The branch of a student is made of the
characters 4 and 5 of the roll number (counting from 0):

```text
Roll,Name,Email
2301CS01,Anna,anna@example.org
2301EE04,Bob,bob@example.org
```

Here `Anna` is in branch `CS` and `Bob` in branch `EE`. Every other column is
copied to the outputs as-is. The position of the branch code can be changed with
the `branchStart` and `branchLength` rules.

### Faculty allocation rosters

The columns `Roll`, `Name`, `Email` and `CGPA` are required, followed by one column
per faculty. Each faculty cell holds the rank (1 is the favourite) that the student
gives to this faculty:

```text
Roll,Name,Email,CGPA,Dr A,Dr B,Dr C
2301CS01,Anna,anna@example.org,9.1,2,1,3
2301EE04,Bob,bob@example.org,8.7,1,3,2
```

By default all the columns after the fixed ones are faculties. The list can also be
given explicitly with `facultyColumns`, in which case other columns are ignored.

## Algorithms

### Branch partition

One table per branch, in the order in which branches first appear.

### Round-robin mix

The `N` groups have sizes `q + 1` for the first `r` groups and `q` for the others,
where `q` and `r` are the quotient and the remainder of the number of students by
`N`. Each group is filled by sweeping the branches in order of first appearance and
taking the next student of every branch in turn.

### Largest-remaining mix

Same group sizes. Each group is filled by taking as many students as possible from
the branch that has the most students left. Ties between branches are broken by
branch code (`nameAscending` by default, `nameDescending` to reproduce older
outputs). When there are fewer students than groups, the last groups stay empty.

### Summary

For each mix, one row per group with the number of students of each branch and a
`Total`. Empty groups are omitted, unless `emptyGroupsInSummary` is `zeroRow`.

### Faculty allocation

Students are ranked by decreasing CGPA. The ranking is cut in cycles of as many
students as there are faculties. In every cycle, each student in turn receives the
best-ranked faculty that nobody else got in this cycle, so that a complete cycle
gives exactly one student to each faculty. A student that cannot be placed is
marked `UNALLOCATED`.

With the default `strict` validation, every student must rank each faculty exactly
once. With `bestEffort`, unreadable ranks are ignored.

## Configuration

`rosteralloc` can be run from the command line only, or with a configuration file
in JSON. Paths in the configuration file are relative to the file itself.

```json
{
  "outputSettings": {
    "outputDirectory": "outputs",
    "archivePath": "outputs.zip"
  },
  "rosterSource": {
    "provider": "csv",
    "filePath": "input.csv"
  },
  "rules": {
    "mode": "groups",
    "groupCount": 3,
    "emptyGroupsInSummary": "skip",
    "branchTieBreak": "nameAscending"
  }
}
```

The `outputSettings` also accept `summaryWorkbook`, `allocationFile`,
`preferenceCountFile` and `skipSummaryOnError`. The `rosterSource` accepts
`excelWorksheetName` and `facultyColumns`. The `rules` accept
`preferenceValidation` (`strict` or `bestEffort`), `branchStart` and `branchLength`.

The modes are:
* `groups`: branch partition, both mixes and the summary workbook
* `faculty`: faculty allocation and preference statistics
* `summary`: rebuilds the summary workbook from the group directories of a previous
  `groups` run found in the output directory

*/
