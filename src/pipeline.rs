use log::{debug, info, warn};

use roster_allocation::builder::FacultyColumns;
use roster_allocation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::pipeline::config_reader::*;
use crate::pipeline::io_common::{simplify_file_name, Table};

mod config_reader;
mod io_archive;
mod io_common;
mod io_csv;
mod io_excel;
mod tables;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";
pub const BRANCHWISE_DIR: &str = "full_branchwise";
pub const ROUND_ROBIN_DIR: &str = "group_round_robin_mix";
pub const LARGEST_REMAINING_DIR: &str = "group_largest_remaining_mix";
pub const DEFAULT_SUMMARY_WORKBOOK: &str = "output.xlsx";
pub const ROUND_ROBIN_SHEET: &str = "Round_Robin_Mix";
pub const LARGEST_REMAINING_SHEET: &str = "Largest_Remaining_Mix";
pub const DEFAULT_ALLOCATION_FILE: &str = "allocation.csv";
pub const DEFAULT_PREFERENCE_COUNT_FILE: &str = "faculty_preference_count.csv";

#[derive(Debug, Snafu)]
pub enum AllocError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The workbook {path} does not contain the expected data"))]
    EmptyExcel { path: String },
    #[snafu(display(
        "The workbook {path} has several worksheets {names:?}: use --excel-worksheet-name to pick one"
    ))]
    ExcelTooManyWorksheets { path: String, names: Vec<String> },
    #[snafu(display("Error building the archive {path}"))]
    Archive {
        source: zip::result::ZipError,
        path: String,
    },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a non-negative number for {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Unknown value for {field}: {value}"))]
    UnknownOption { field: String, value: String },
    #[snafu(display("No roster to read: use --input or add a rosterSource to the configuration"))]
    MissingInput {},
    #[snafu(display("The number of groups is required: use --groups or the groupCount rule"))]
    MissingGroupCount {},
    #[snafu(display("Cannot find the directory of the configuration file {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("{source}"))]
    Allocation { source: AllocationError },
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AllocResult<T> = Result<T, AllocError>;

/// Runs the program with the arguments of the command line. They take
/// precedence over the configuration file, if any.
pub fn run_from_args(args: &Args) -> AllocResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => AllocConfig::default(),
    };
    let config = apply_args(config, args);
    info!("config: {:?}", config);

    let summary_js = run_allocation(&config)?;
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        None | Some("") | Some("stdout") => println!("{}", pretty_js),
        Some(path) => {
            fs::write(path, &pretty_js).context(WritingFileSnafu { path })?;
            info!("Summary written to {}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        check_reference(reference_p, &pretty_js)?;
    }
    Ok(())
}

fn apply_args(mut config: AllocConfig, args: &Args) -> AllocConfig {
    if args.input.is_some() || args.input_type.is_some() || args.excel_worksheet_name.is_some() {
        let source = config
            .roster_source
            .get_or_insert_with(RosterSource::default);
        if let Some(input) = &args.input {
            source.file_path = input.clone();
        }
        if args.input_type.is_some() {
            source.provider = args.input_type.clone();
        }
        if args.excel_worksheet_name.is_some() {
            source.excel_worksheet_name = args.excel_worksheet_name.clone();
        }
    }
    if args.mode.is_some() {
        config.rules.mode = args.mode.clone();
    }
    if let Some(n) = args.groups {
        config.rules.group_count = Some(json!(n));
    }
    if args.output_dir.is_some() {
        config.output_settings.output_directory = args.output_dir.clone();
    }
    if args.archive.is_some() {
        config.output_settings.archive_path = args.archive.clone();
    }
    config
}

/// Runs one mode of the program and returns the summary of the run.
pub fn run_allocation(config: &AllocConfig) -> AllocResult<JSValue> {
    let mode = config.rules.mode()?;
    let rules = config.rules.allocation_rules()?;
    let settings = &config.output_settings;
    let out_dir = PathBuf::from(
        settings
            .output_directory
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_DIR),
    );
    info!("Running in mode {:?}, output directory: {}", mode, out_dir.display());

    let summary_js = match mode {
        // The outputs of the previous run are only cleared once the new ones
        // have been computed.
        RunMode::Groups => {
            let num_groups = config.rules.group_count()?;
            let table = read_roster_table(&config.roster_source)?;
            let run = mix_groups(&table, num_groups, &rules)?;
            reset_output_dir(&out_dir)?;
            write_groups_run(&run, settings, &out_dir)?
        }
        RunMode::Faculty => {
            let table = read_roster_table(&config.roster_source)?;
            let faculty_columns = match config
                .roster_source
                .as_ref()
                .and_then(|s| s.faculty_columns.clone())
            {
                Some(names) => FacultyColumns::Named(names),
                None => FacultyColumns::Remaining,
            };
            let (roster, result) = allocate(&table, &faculty_columns, &rules)?;
            reset_output_dir(&out_dir)?;
            write_faculty_run(&roster, &result, settings, &out_dir)?
        }
        // Reads the groups of a previous run: the directory is left as is.
        RunMode::Summary => run_summary(&rules, settings, &out_dir)?,
    };

    if let Some(archive_p) = &settings.archive_path {
        let num_files = io_archive::write_archive(&out_dir, Path::new(archive_p))?;
        info!("Archived {} files into {}", num_files, archive_p);
    }
    Ok(summary_js)
}

fn read_roster_table(source: &Option<RosterSource>) -> AllocResult<Table> {
    let source = match source {
        Some(s) if !s.file_path.is_empty() => s,
        _ => return MissingInputSnafu {}.fail(),
    };
    let table = match source.provider()? {
        Provider::Csv => io_csv::read_csv_table(&source.file_path)?,
        Provider::Excel => io_excel::read_excel_table(
            &source.file_path,
            source.excel_worksheet_name.as_deref(),
        )?,
    };
    info!(
        "Read {} rows from {}",
        table.rows.len(),
        simplify_file_name(&source.file_path)
    );
    Ok(table)
}

/// Empties the output directory, or creates it.
fn reset_output_dir(out_dir: &Path) -> AllocResult<()> {
    let path = out_dir.display().to_string();
    if out_dir.as_os_str().is_empty() || out_dir.parent().is_none() || out_dir == Path::new(".") {
        whatever!("Refusing to clear the output directory {:?}", path);
    }
    if out_dir.exists() {
        debug!("reset_output_dir: removing {}", path);
        fs::remove_dir_all(out_dir).context(WritingFileSnafu { path: path.clone() })?;
    }
    fs::create_dir_all(out_dir).context(WritingFileSnafu { path })?;
    Ok(())
}

/// Everything a `groups` run writes out.
struct GroupsRun {
    num_groups: usize,
    roster: Roster,
    branches: Vec<BranchTable>,
    round_robin: Vec<Group>,
    largest_remaining: Vec<Group>,
    rr_summary: GroupSummary,
    lr_summary: GroupSummary,
}

fn mix_groups(table: &Table, num_groups: usize, rules: &AllocationRules) -> AllocResult<GroupsRun> {
    let roster = load_roster(&table.header, &table.rows, rules).context(AllocationSnafu {})?;
    let branches = partition_by_branch(&roster);
    check_branch_file_names(&branches).context(AllocationSnafu {})?;
    let round_robin = mix_round_robin(&roster, num_groups).context(AllocationSnafu {})?;
    let largest_remaining =
        mix_largest_remaining(&roster, num_groups, rules.tie_break).context(AllocationSnafu {})?;
    let rr_summary = summarize_groups(&round_robin, rules).context(AllocationSnafu {})?;
    let lr_summary = summarize_groups(&largest_remaining, rules).context(AllocationSnafu {})?;
    Ok(GroupsRun {
        num_groups,
        roster,
        branches,
        round_robin,
        largest_remaining,
        rr_summary,
        lr_summary,
    })
}

// Branch codes name the files of the branch partition.
fn check_branch_file_names(branches: &[BranchTable]) -> Result<(), AllocationError> {
    for bt in branches.iter() {
        let b = bt.branch.as_str();
        let unusable = b.trim().is_empty()
            || b == "."
            || b == ".."
            || b.contains(|c: char| c == '/' || c == '\\' || c.is_control());
        if unusable {
            let roll = bt
                .students
                .first()
                .map(|s| s.roll.as_str())
                .unwrap_or_default();
            return Err(AllocationError::MalformedInput {
                row: None,
                message: format!(
                    "branch code {:?} of roll number {:?} cannot be used as a file name",
                    b, roll
                ),
            });
        }
    }
    Ok(())
}

fn write_groups_run(
    run: &GroupsRun,
    settings: &OutputSettings,
    out_dir: &Path,
) -> AllocResult<JSValue> {
    let columns = &run.roster.columns;
    let branch_dir = out_dir.join(BRANCHWISE_DIR);
    fs::create_dir_all(&branch_dir).context(WritingFileSnafu {
        path: branch_dir.display().to_string(),
    })?;
    for bt in run.branches.iter() {
        io_csv::write_table(
            &branch_dir.join(format!("{}.csv", bt.branch)),
            &tables::students_table(columns, &bt.students),
        )?;
    }
    info!("Wrote {} branch files", run.branches.len());

    write_groups(&out_dir.join(ROUND_ROBIN_DIR), columns, &run.round_robin)?;
    write_groups(
        &out_dir.join(LARGEST_REMAINING_DIR),
        columns,
        &run.largest_remaining,
    )?;
    let workbook = export_summaries(&run.rr_summary, &run.lr_summary, settings, out_dir)?;

    let branches_js: Vec<JSValue> = run
        .branches
        .iter()
        .map(|bt| json!({"branch": bt.branch, "students": bt.students.len()}))
        .collect();
    Ok(json!({
        "mode": "groups",
        "students": run.roster.students.len(),
        "groupCount": run.num_groups,
        "branches": branches_js,
        "roundRobinMix": mix_to_json(&run.round_robin, &run.rr_summary),
        "largestRemainingMix": mix_to_json(&run.largest_remaining, &run.lr_summary),
        "summaryWorkbook": workbook,
    }))
}

fn write_groups(dir: &Path, columns: &[String], groups: &[Group]) -> AllocResult<()> {
    fs::create_dir_all(dir).context(WritingFileSnafu {
        path: dir.display().to_string(),
    })?;
    for g in groups.iter() {
        io_csv::write_table(
            &dir.join(format!("{}.csv", g.name)),
            &tables::students_table(columns, &g.students),
        )?;
    }
    debug!("write_groups: {} groups in {}", groups.len(), dir.display());
    Ok(())
}

/// Writes the summary workbook. Returns its name, or `None` when it could not be
/// written and the settings allow to carry on without it.
fn export_summaries(
    round_robin: &GroupSummary,
    largest_remaining: &GroupSummary,
    settings: &OutputSettings,
    out_dir: &Path,
) -> AllocResult<Option<String>> {
    let name = settings
        .summary_workbook
        .clone()
        .unwrap_or_else(|| DEFAULT_SUMMARY_WORKBOOK.to_string());
    let path = out_dir.join(&name);
    let rr_table = tables::summary_table(round_robin);
    let lr_table = tables::summary_table(largest_remaining);
    let res = io_excel::write_workbook(
        &path,
        &[
            (ROUND_ROBIN_SHEET, &rr_table),
            (LARGEST_REMAINING_SHEET, &lr_table),
        ],
    );
    match res {
        Ok(()) => {
            info!("Summary workbook written to {}", path.display());
            Ok(Some(name))
        }
        Err(e) if settings.skip_summary_on_error.unwrap_or(false) => {
            warn!("Skipping the summary workbook {}: {}", path.display(), e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn mix_to_json(groups: &[Group], summary: &GroupSummary) -> JSValue {
    let sizes: Vec<usize> = groups.iter().map(|g| g.students.len()).collect();
    let rows: Vec<JSValue> = summary
        .rows
        .iter()
        .map(|r| {
            let counts: JSMap<String, JSValue> = summary
                .branches
                .iter()
                .zip(r.counts.iter())
                .map(|(b, c)| (b.clone(), json!(c)))
                .collect();
            json!({"group": r.group, "counts": counts, "total": r.total})
        })
        .collect();
    json!({"groupSizes": sizes, "summary": rows})
}

fn run_summary(
    rules: &AllocationRules,
    settings: &OutputSettings,
    out_dir: &Path,
) -> AllocResult<JSValue> {
    let round_robin = read_groups(&out_dir.join(ROUND_ROBIN_DIR), rules)?;
    let largest_remaining = read_groups(&out_dir.join(LARGEST_REMAINING_DIR), rules)?;
    let rr_summary = summarize_groups(&round_robin, rules).context(AllocationSnafu {})?;
    let lr_summary = summarize_groups(&largest_remaining, rules).context(AllocationSnafu {})?;
    let workbook = export_summaries(&rr_summary, &lr_summary, settings, out_dir)?;
    Ok(json!({
        "mode": "summary",
        "roundRobinMix": mix_to_json(&round_robin, &rr_summary),
        "largestRemainingMix": mix_to_json(&largest_remaining, &lr_summary),
        "summaryWorkbook": workbook,
    }))
}

fn read_groups(dir: &Path, rules: &AllocationRules) -> AllocResult<Vec<Group>> {
    let mut groups = Vec::new();
    for (name, table) in io_csv::read_group_dir(dir)? {
        let g = load_group(&name, &table.header, &table.rows, rules).context(AllocationSnafu {})?;
        groups.push(g);
    }
    info!("Read {} groups from {}", groups.len(), dir.display());
    Ok(groups)
}

fn allocate(
    table: &Table,
    faculty_columns: &FacultyColumns,
    rules: &AllocationRules,
) -> AllocResult<(PreferenceRoster, AllocationResult)> {
    let roster = load_preference_roster(&table.header, &table.rows, faculty_columns, rules)
        .context(AllocationSnafu {})?;
    let result = allocate_faculties(&roster, rules).context(AllocationSnafu {})?;
    log_events(&result.events);
    Ok((roster, result))
}

fn write_faculty_run(
    roster: &PreferenceRoster,
    result: &AllocationResult,
    settings: &OutputSettings,
    out_dir: &Path,
) -> AllocResult<JSValue> {
    let allocation_p = out_dir.join(
        settings
            .allocation_file
            .as_deref()
            .unwrap_or(DEFAULT_ALLOCATION_FILE),
    );
    io_csv::write_table(&allocation_p, &tables::allocation_table(result))?;
    let counts_p = out_dir.join(
        settings
            .preference_count_file
            .as_deref()
            .unwrap_or(DEFAULT_PREFERENCE_COUNT_FILE),
    );
    io_csv::write_table(&counts_p, &tables::preference_count_table(result))?;

    let report = &result.report;
    match report.balanced {
        Some(true) => info!("Every faculty received {} students", report.complete_cycles),
        Some(false) => warn!("The allocation is not balanced: {:?}", report.per_faculty),
        None => info!(
            "{} complete cycles, {} students in the last cycle",
            report.complete_cycles, report.remaining_students
        ),
    }

    let per_faculty: JSMap<String, JSValue> = report
        .per_faculty
        .iter()
        .map(|(f, c)| (f.clone(), json!(c)))
        .collect();
    let counts: Vec<JSValue> = result
        .stats
        .iter()
        .map(|s| json!({"faculty": s.faculty, "counts": s.counts}))
        .collect();
    Ok(json!({
        "mode": "faculty",
        "students": result.students.len(),
        "faculties": roster.faculties,
        "completeCycles": report.complete_cycles,
        "remainingStudents": report.remaining_students,
        "allocated": report.allocated,
        "unallocated": report.unallocated,
        "balanced": report.balanced,
        "perFaculty": per_faculty,
        "preferenceCounts": counts,
    }))
}

fn log_events(events: &[AllocationEvent]) {
    for ev in events.iter() {
        match ev {
            AllocationEvent::Assigned {
                cycle,
                position,
                roll,
                faculty,
                rank,
            } => info!(
                "cycle {} position {}: {} -> {} (preference {})",
                cycle, position, roll, faculty, rank
            ),
            AllocationEvent::Unallocated {
                cycle,
                position,
                roll,
            } => warn!(
                "cycle {} position {}: no faculty left for {}",
                cycle, position, roll
            ),
            AllocationEvent::IncompleteCycle {
                cycle,
                allocated,
                expected,
            } => warn!(
                "cycle {}: only {} of {} faculties received a student",
                cycle, allocated, expected
            ),
        }
    }
}

fn check_reference(reference_p: &str, pretty_js: &str) -> AllocResult<()> {
    let summary_ref = read_summary(reference_p)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between the summary of this run and the reference summary")
    }
    info!("The summary matches the reference {}", reference_p);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testdata(name: &str) -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
            .display()
            .to_string()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rosteralloc-run-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn args(out_dir: &Path) -> Args {
        Args {
            config: None,
            reference: None,
            out: Some(out_dir.join("summary.json").display().to_string()),
            input: None,
            input_type: None,
            mode: None,
            groups: None,
            output_dir: Some(out_dir.join("outputs").display().to_string()),
            archive: None,
            excel_worksheet_name: None,
            verbose: false,
        }
    }

    fn read_lines(p: &Path) -> Vec<String> {
        fs::read_to_string(p)
            .unwrap()
            .lines()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn groups_mode() {
        let dir = scratch_dir("groups");
        let a = Args {
            input: Some(testdata("roster.csv")),
            groups: Some(3),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let out = dir.join("outputs");

        let cs = read_lines(&out.join(BRANCHWISE_DIR).join("CS.csv"));
        assert_eq!(cs[0], "Roll,Name,Email");
        assert_eq!(cs.len(), 5);
        assert!(out.join(BRANCHWISE_DIR).join("EE.csv").exists());
        assert!(out.join(BRANCHWISE_DIR).join("ME.csv").exists());

        let g1 = read_lines(&out.join(ROUND_ROBIN_DIR).join("g1.csv"));
        let rolls: Vec<&str> = g1[1..].iter().map(|l| &l[..8]).collect();
        assert_eq!(rolls, vec!["2301CS01", "2301EE01", "2301ME01"]);
        let g3 = read_lines(&out.join(LARGEST_REMAINING_DIR).join("g3.csv"));
        let rolls: Vec<&str> = g3[1..].iter().map(|l| &l[..8]).collect();
        assert_eq!(rolls, vec!["2301CS04", "2301ME01"]);
        assert!(out.join(DEFAULT_SUMMARY_WORKBOOK).exists());

        let js = read_summary(&dir.join("summary.json").display().to_string()).unwrap();
        assert_eq!(js["students"], json!(7));
        assert_eq!(js["roundRobinMix"]["groupSizes"], json!([3, 2, 2]));
        assert_eq!(
            js["largestRemainingMix"]["summary"][0],
            json!({"group": "g1", "counts": {"CS": 3, "EE": 0, "ME": 0}, "total": 3})
        );
        assert_eq!(
            js["largestRemainingMix"]["summary"][2],
            json!({"group": "g3", "counts": {"CS": 1, "EE": 0, "ME": 1}, "total": 2})
        );
        assert_eq!(js["summaryWorkbook"], json!("output.xlsx"));

        // Rebuilding the summary from the group files gives the same mixes.
        let a = Args {
            mode: Some("summary".to_string()),
            out: Some(dir.join("summary2.json").display().to_string()),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let js2 = read_summary(&dir.join("summary2.json").display().to_string()).unwrap();
        assert_eq!(js2["roundRobinMix"], js["roundRobinMix"]);
        assert_eq!(js2["largestRemainingMix"], js["largestRemainingMix"]);
        // The branch files of the first run are still there.
        assert!(out.join(BRANCHWISE_DIR).join("CS.csv").exists());
    }

    #[test]
    fn groups_mode_requires_group_count() {
        let dir = scratch_dir("nogroups");
        let a = Args {
            input: Some(testdata("roster.csv")),
            ..args(&dir)
        };
        assert!(matches!(
            run_from_args(&a),
            Err(AllocError::MissingGroupCount {})
        ));
    }

    #[test]
    fn faculty_mode_with_reference() {
        let dir = scratch_dir("faculty");
        let a = Args {
            config: Some(testdata("faculty_config.json")),
            reference: Some(testdata("faculty_expected_summary.json")),
            archive: Some(dir.join("outputs.zip").display().to_string()),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let out = dir.join("outputs");

        let alloc = read_lines(&out.join(DEFAULT_ALLOCATION_FILE));
        assert_eq!(alloc[0], "Roll,Name,Email,CGPA,Allocated");
        assert_eq!(alloc[1], "2301CS02,Bela,bela@example.org,9.4,Dr Rao");
        assert_eq!(alloc[2], "2301EE02,Dev,dev@example.org,9.4,Dr Sen");
        assert_eq!(alloc[7], "2301ME01,Esha,esha@example.org,6.5,Dr Rao");

        let counts = read_lines(&out.join(DEFAULT_PREFERENCE_COUNT_FILE));
        assert_eq!(
            counts,
            vec![
                "Faculty,Count Pref 1,Count Pref 2,Count Pref 3",
                "Dr Rao,3,0,0",
                "Dr Sen,1,1,0",
                "Dr Iyer,1,0,1",
            ]
        );
        assert!(dir.join("outputs.zip").exists());
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let dir = scratch_dir("mismatch");
        let a = Args {
            input: Some(testdata("roster.csv")),
            groups: Some(2),
            reference: Some(testdata("faculty_expected_summary.json")),
            ..args(&dir)
        };
        assert!(matches!(
            run_from_args(&a),
            Err(AllocError::Whatever { .. })
        ));
    }

    #[test]
    fn strict_preferences_are_checked() {
        let dir = scratch_dir("strict");
        let roster = dir.join("bad.csv");
        fs::write(
            &roster,
            "Roll,Name,Email,CGPA,A,B\n2301CS01,x,x@example.org,8.0,1,1\n",
        )
        .unwrap();
        let a = Args {
            input: Some(roster.display().to_string()),
            mode: Some("faculty".to_string()),
            ..args(&dir)
        };
        assert!(matches!(
            run_from_args(&a),
            Err(AllocError::Allocation {
                source: AllocationError::InvalidPreference { .. }
            })
        ));
    }

    #[test]
    fn summary_failure_can_be_skipped() {
        let dir = scratch_dir("skip");
        let mut config = AllocConfig {
            roster_source: Some(RosterSource {
                file_path: testdata("roster.csv"),
                ..RosterSource::default()
            }),
            ..AllocConfig::default()
        };
        config.rules.group_count = Some(json!(2));
        config.output_settings.output_directory = Some(dir.join("outputs").display().to_string());
        // The parent directory of the workbook is never created.
        config.output_settings.summary_workbook = Some("missing/summary.xlsx".to_string());
        assert!(run_allocation(&config).is_err());

        config.output_settings.skip_summary_on_error = Some(true);
        let js = run_allocation(&config).unwrap();
        assert_eq!(js["summaryWorkbook"], JSValue::Null);
        assert!(dir.join("outputs").join(ROUND_ROBIN_DIR).join("g2.csv").exists());
    }

    #[test]
    fn failed_run_keeps_previous_outputs() {
        let dir = scratch_dir("keep");
        let a = Args {
            input: Some(testdata("roster.csv")),
            groups: Some(3),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let g1 = dir.join("outputs").join(ROUND_ROBIN_DIR).join("g1.csv");
        assert!(g1.exists());

        let bad = dir.join("bad.csv");
        fs::write(&bad, "Roll,Name\n2301CS01,a\n23,b\n").unwrap();
        let a = Args {
            input: Some(bad.display().to_string()),
            groups: Some(3),
            ..args(&dir)
        };
        assert!(matches!(
            run_from_args(&a),
            Err(AllocError::Allocation {
                source: AllocationError::MalformedInput { row: Some(2), .. }
            })
        ));
        assert!(g1.exists());

        // Same for a faculty run with invalid preferences.
        let a = Args {
            input: Some(testdata("preferences.csv")),
            mode: Some("faculty".to_string()),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let alloc = dir.join("outputs").join(DEFAULT_ALLOCATION_FILE);
        assert!(alloc.exists());
        fs::write(&bad, "Roll,Name,Email,CGPA,A,B\n2301CS01,x,x@example.org,8.0,2,2\n").unwrap();
        let a = Args {
            input: Some(bad.display().to_string()),
            mode: Some("faculty".to_string()),
            ..args(&dir)
        };
        assert!(run_from_args(&a).is_err());
        assert!(alloc.exists());
    }

    #[test]
    fn branch_codes_must_be_file_names() {
        let dir = scratch_dir("branchname");
        let roster = dir.join("slash.csv");
        fs::write(&roster, "Roll,Name\n2301CS01,a\n2301C/01,b\n").unwrap();
        let a = Args {
            input: Some(roster.display().to_string()),
            groups: Some(2),
            ..args(&dir)
        };
        let res = run_from_args(&a);
        assert!(matches!(
            res,
            Err(AllocError::Allocation {
                source: AllocationError::MalformedInput { ref message, .. }
            }) if message.contains("C/")
        ));
        assert!(!dir.join("outputs").exists());
    }

    #[test]
    fn summary_mode_with_empty_groups() {
        let dir = scratch_dir("emptygroups");
        let a = Args {
            input: Some(testdata("roster.csv")),
            groups: Some(9),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let js = read_summary(&dir.join("summary.json").display().to_string()).unwrap();
        let g9 = read_lines(&dir.join("outputs").join(LARGEST_REMAINING_DIR).join("g9.csv"));
        assert_eq!(g9, vec!["Roll,Name,Email"]);

        let a = Args {
            mode: Some("summary".to_string()),
            out: Some(dir.join("summary2.json").display().to_string()),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let js2 = read_summary(&dir.join("summary2.json").display().to_string()).unwrap();
        assert_eq!(
            js2["largestRemainingMix"]["groupSizes"],
            json!([1, 1, 1, 1, 1, 1, 1, 0, 0])
        );
        // Empty groups are skipped by default.
        assert_eq!(
            js2["largestRemainingMix"]["summary"]
                .as_array()
                .map(|rows| rows.len()),
            Some(7)
        );
        assert_eq!(js2["roundRobinMix"], js["roundRobinMix"]);
        assert_eq!(js2["largestRemainingMix"], js["largestRemainingMix"]);
    }

    #[test]
    fn excel_roster_with_numeric_cells() {
        let dir = scratch_dir("excel");
        let roster = dir.join("preferences.xlsx");
        let table = Table {
            header: ["Roll", "Name", "Email", "CGPA", "A", "B"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: vec![
                ["23011201", "x", "x@example.org", "8.5", "1", "2"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                ["23011202", "y", "y@example.org", "9.5", "1", "2"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ],
        };
        io_excel::write_workbook(&roster, &[("Roster", &table)]).unwrap();

        let a = Args {
            input: Some(roster.display().to_string()),
            mode: Some("faculty".to_string()),
            ..args(&dir)
        };
        run_from_args(&a).unwrap();
        let alloc = read_lines(&dir.join("outputs").join(DEFAULT_ALLOCATION_FILE));
        assert_eq!(
            alloc,
            vec![
                "Roll,Name,Email,CGPA,Allocated",
                "23011202,y,y@example.org,9.5,A",
                "23011201,x,x@example.org,8.5,B",
            ]
        );
    }

    #[test]
    fn missing_input() {
        let dir = scratch_dir("noinput");
        let a = Args {
            groups: Some(2),
            ..args(&dir)
        };
        assert!(matches!(run_from_args(&a), Err(AllocError::MissingInput {})));
    }
}
