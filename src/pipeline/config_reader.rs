use crate::pipeline::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    /// Relative to the output directory.
    #[serde(rename = "summaryWorkbook")]
    pub summary_workbook: Option<String>,
    #[serde(rename = "allocationFile")]
    pub allocation_file: Option<String>,
    #[serde(rename = "preferenceCountFile")]
    pub preference_count_file: Option<String>,
    #[serde(rename = "archivePath")]
    pub archive_path: Option<String>,
    #[serde(rename = "skipSummaryOnError")]
    pub skip_summary_on_error: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "facultyColumns")]
    pub faculty_columns: Option<Vec<String>>,
}

/// The kinds of input files that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Excel,
}

impl RosterSource {
    /// The explicit provider, or the one guessed from the file extension.
    pub fn provider(&self) -> AllocResult<Provider> {
        match self.provider.as_deref() {
            Some("csv") => Ok(Provider::Csv),
            Some("excel") => Ok(Provider::Excel),
            Some(x) => UnknownOptionSnafu {
                field: "provider",
                value: x,
            }
            .fail(),
            None => {
                let ext = Path::new(&self.file_path)
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                match ext.as_str() {
                    "csv" | "txt" => Ok(Provider::Csv),
                    "xlsx" | "xlsm" | "xls" | "ods" => Ok(Provider::Excel),
                    _ => UnknownOptionSnafu {
                        field: "provider",
                        value: format!("(guessed from the extension of {})", self.file_path),
                    }
                    .fail(),
                }
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RunMode {
    Groups,
    Faculty,
    Summary,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunRules {
    pub mode: Option<String>,
    #[serde(rename = "groupCount")]
    pub group_count: Option<JSValue>,
    #[serde(rename = "emptyGroupsInSummary")]
    pub empty_groups_in_summary: Option<String>,
    #[serde(rename = "branchTieBreak")]
    pub branch_tie_break: Option<String>,
    #[serde(rename = "preferenceValidation")]
    pub preference_validation: Option<String>,
    #[serde(rename = "branchStart")]
    pub branch_start: Option<JSValue>,
    #[serde(rename = "branchLength")]
    pub branch_length: Option<JSValue>,
}

impl RunRules {
    pub fn mode(&self) -> AllocResult<RunMode> {
        match self.mode.as_deref() {
            None | Some("groups") => Ok(RunMode::Groups),
            Some("faculty") => Ok(RunMode::Faculty),
            Some("summary") => Ok(RunMode::Summary),
            Some(x) => UnknownOptionSnafu {
                field: "mode",
                value: x,
            }
            .fail(),
        }
    }

    pub fn group_count(&self) -> AllocResult<usize> {
        read_js_int(&self.group_count, "groupCount")?.context(MissingGroupCountSnafu {})
    }

    pub fn allocation_rules(&self) -> AllocResult<AllocationRules> {
        let defaults = AllocationRules::DEFAULT_RULES;
        let empty_group_policy = match self.empty_groups_in_summary.as_deref() {
            None => defaults.empty_group_policy,
            Some("skip") => EmptyGroupPolicy::Skip,
            Some("zeroRow") => EmptyGroupPolicy::IncludeAsZeroRow,
            Some(x) => {
                return UnknownOptionSnafu {
                    field: "emptyGroupsInSummary",
                    value: x,
                }
                .fail()
            }
        };
        let tie_break = match self.branch_tie_break.as_deref() {
            None => defaults.tie_break,
            Some("nameAscending") => BranchTieBreak::NameAscending,
            Some("nameDescending") => BranchTieBreak::NameDescending,
            Some(x) => {
                return UnknownOptionSnafu {
                    field: "branchTieBreak",
                    value: x,
                }
                .fail()
            }
        };
        let preference_validation = match self.preference_validation.as_deref() {
            None => defaults.preference_validation,
            Some("strict") => PreferenceValidation::Strict,
            Some("bestEffort") => PreferenceValidation::BestEffort,
            Some(x) => {
                return UnknownOptionSnafu {
                    field: "preferenceValidation",
                    value: x,
                }
                .fail()
            }
        };
        let start = read_js_int(&self.branch_start, "branchStart")?
            .unwrap_or(defaults.branch_rule.start);
        let len = read_js_int(&self.branch_length, "branchLength")?
            .unwrap_or(defaults.branch_rule.len);
        if len == 0 {
            return ParsingJsonNumberSnafu {
                field: "branchLength",
            }
            .fail();
        }
        Ok(AllocationRules {
            branch_rule: BranchRule { start, len },
            empty_group_policy,
            tie_break,
            preference_validation,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "rosterSource")]
    pub roster_source: Option<RosterSource>,
    #[serde(default)]
    pub rules: RunRules,
}

/// Reads a configuration file. The paths it contains are resolved against
/// the directory of the file.
pub fn read_config(path: &str) -> AllocResult<AllocConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: AllocConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root = Path::new(path)
        .parent()
        .context(MissingParentDirSnafu { path })?;
    debug!("read_config: root directory: {:?}", root);

    let resolve = |p: &str| root.join(p).display().to_string();
    if let Some(source) = config.roster_source.as_mut() {
        if !source.file_path.is_empty() {
            source.file_path = resolve(&source.file_path);
        }
    }
    let settings = &mut config.output_settings;
    settings.output_directory = Some(resolve(
        settings
            .output_directory
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_DIR),
    ));
    settings.archive_path = settings.archive_path.as_deref().map(resolve);
    Ok(config)
}

/// Reads a run summary, as written with the --out option.
pub fn read_summary(path: &str) -> AllocResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>, field: &str) -> AllocResult<Option<usize>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| Some(x as usize))
            .context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .map(Some)
            .context(ParsingJsonNumberSnafu { field }),
        _ => ParsingJsonNumberSnafu { field }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_count_accepts_numbers_and_strings() {
        let mut rules = RunRules {
            group_count: Some(json!(4)),
            ..RunRules::default()
        };
        assert_eq!(rules.group_count().unwrap(), 4);
        rules.group_count = Some(json!("12"));
        assert_eq!(rules.group_count().unwrap(), 12);
        rules.group_count = Some(json!("twelve"));
        assert!(rules.group_count().is_err());
        rules.group_count = None;
        assert!(matches!(
            rules.group_count(),
            Err(AllocError::MissingGroupCount {})
        ));
    }

    #[test]
    fn default_rules() {
        let rules = RunRules::default();
        assert_eq!(rules.mode().unwrap(), RunMode::Groups);
        assert_eq!(
            rules.allocation_rules().unwrap(),
            AllocationRules::DEFAULT_RULES
        );
    }

    #[test]
    fn parse_rules() {
        let js = json!({
            "mode": "faculty",
            "emptyGroupsInSummary": "zeroRow",
            "branchTieBreak": "nameDescending",
            "preferenceValidation": "bestEffort",
            "branchStart": "0",
            "branchLength": 3
        });
        let rules: RunRules = serde_json::from_value(js).unwrap();
        assert_eq!(rules.mode().unwrap(), RunMode::Faculty);
        let r = rules.allocation_rules().unwrap();
        assert_eq!(r.branch_rule, BranchRule { start: 0, len: 3 });
        assert_eq!(r.empty_group_policy, EmptyGroupPolicy::IncludeAsZeroRow);
        assert_eq!(r.tie_break, BranchTieBreak::NameDescending);
        assert_eq!(r.preference_validation, PreferenceValidation::BestEffort);
    }

    #[test]
    fn unknown_options_are_rejected() {
        let rules = RunRules {
            branch_tie_break: Some("random".to_string()),
            ..RunRules::default()
        };
        assert!(matches!(
            rules.allocation_rules(),
            Err(AllocError::UnknownOption { .. })
        ));
        let rules = RunRules {
            mode: Some("tally".to_string()),
            ..RunRules::default()
        };
        assert!(rules.mode().is_err());
        let rules = RunRules {
            branch_length: Some(json!(0)),
            ..RunRules::default()
        };
        assert!(rules.allocation_rules().is_err());
    }

    #[test]
    fn provider_from_extension() {
        let mut source = RosterSource {
            file_path: "data/Roster.XLSX".to_string(),
            ..RosterSource::default()
        };
        assert_eq!(source.provider().unwrap(), Provider::Excel);
        source.file_path = "data/roster.csv".to_string();
        assert_eq!(source.provider().unwrap(), Provider::Csv);
        source.file_path = "data/roster.json".to_string();
        assert!(source.provider().is_err());
        source.provider = Some("excel".to_string());
        assert_eq!(source.provider().unwrap(), Provider::Excel);
    }

    #[test]
    fn config_paths_are_relative_to_the_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join("faculty_config.json");
        let config = read_config(&path.display().to_string()).unwrap();
        let source = config.roster_source.unwrap();
        assert!(Path::new(&source.file_path).ends_with("testdata/preferences.csv"));
        let out = config.output_settings.output_directory.unwrap();
        assert!(Path::new(&out).ends_with("testdata/outputs"));
        assert_eq!(config.rules.mode().unwrap(), RunMode::Faculty);
    }
}
