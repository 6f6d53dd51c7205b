use clap::Parser;

/// This is a roster allocation program: branch-balanced groups and faculty allocation.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the run. Paths inside it are relative to its location.
    /// For more information about the file format, read the manual of the roster_allocation crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of a run in JSON format. If provided, rosteralloc will
    /// check that the summary of this run matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the run will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The roster to process. Setting this option overrides the roster source that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default: guessed from the file extension) The type of the input: csv or excel.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default groups) What to do with the roster: groups, faculty or summary.
    #[clap(short, long, value_parser)]
    pub mode: Option<String>,

    /// The number of groups to create in groups mode.
    #[clap(short, long, value_parser)]
    pub groups: Option<usize>,

    /// (default outputs) The directory receiving the generated files. It is cleared at the start of the run.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    /// (file path, optional) If specified, all the generated files are also packed in this zip archive.
    #[clap(long, value_parser)]
    pub archive: Option<String>,

    /// When using an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
