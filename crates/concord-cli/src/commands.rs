use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use concord_message::{MessageCompareConfig, MessageComparator};
use concord_table::{NumericColumn, TableCompareConfig, TableComparator, TableSummary};
use concord_types::{DiffNode, Header, MemoryRowSource, Message, Outcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::*;

/// Failed leaves printed before the listing is cut short.
const MAX_LISTED_FAILURES: usize = 20;

/// Table file layout: a header and rows of nullable cells.
#[derive(Debug, Deserialize)]
struct JsonTable {
    header: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Option<String>>>,
}

/// Returns whether the comparison passed.
pub fn run_command(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Command::Table(args) => cmd_table(args, cli.format),
        Command::Message(args) => cmd_message(args, cli.format),
    }
}

fn cmd_table(args: TableArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = table_config(&args)?;
    let comparator = TableComparator::new(config).context("invalid table comparison settings")?;
    let expected = load_table("expected", &args.input.expected)?;
    let actual = load_table("actual", &args.input.actual)?;

    let diff = comparator
        .compare_owned(expected, actual)
        .context("table comparison could not run")?;
    write_output(args.input.output.as_deref(), &diff, format)?;
    if format == OutputFormat::Text {
        print_table_summary(&diff.summary);
        print_failures(&diff.result);
        print_verdict(&diff.result);
    }
    Ok(diff.is_success())
}

fn cmd_message(args: MessageArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let config = message_config(&args)?;
    let expected: Message = read_json(&args.input.expected)?;
    let actual: Message = read_json(&args.input.actual)?;

    let diff = MessageComparator::new(config)
        .compare(&expected, &actual)
        .context("message comparison could not run")?;
    write_output(args.input.output.as_deref(), &diff, format)?;
    if format == OutputFormat::Text {
        print_failures(&diff.result);
        print_verdict(&diff.result);
    }
    Ok(diff.is_success())
}

fn table_config(args: &TableArgs) -> anyhow::Result<TableCompareConfig> {
    let mut config = match &args.input.config {
        Some(path) => TableCompareConfig::from_toml_str(&read_text(path)?)
            .with_context(|| format!("invalid settings in {}", path.display()))?,
        None => TableCompareConfig::default(),
    };
    if !args.keys.is_empty() {
        config.key_columns = args.keys.clone();
    }
    for spec in &args.numeric {
        let (name, column) = NumericColumn::parse_spec(spec)?;
        config.numeric_columns.insert(name, column);
    }
    config.check_duplicates |= args.check_duplicates;
    if args.ignore_case {
        config.case_sensitive = false;
    }
    Ok(config)
}

fn message_config(args: &MessageArgs) -> anyhow::Result<MessageCompareConfig> {
    let mut config = match &args.input.config {
        Some(path) => MessageCompareConfig::from_toml_str(&read_text(path)?)
            .with_context(|| format!("invalid settings in {}", path.display()))?,
        None => MessageCompareConfig::default(),
    };
    for spec in &args.group_keys {
        let Some((group, fields)) = spec.split_once('=') else {
            bail!("group key '{spec}' is not of the form TYPE=FIELD[,FIELD...]");
        };
        let fields: Vec<&str> = fields.split(',').map(str::trim).filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            bail!("group key '{spec}' names no fields");
        }
        config = config.with_group_keys(group.trim(), fields);
    }
    if args.ignore_case {
        config.case_sensitive = false;
    }
    Ok(config)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid input", path.display()))
}

fn load_table(name: &str, path: &Path) -> anyhow::Result<MemoryRowSource> {
    let table: JsonTable = read_json(path)?;
    debug!(source = name, rows = table.rows.len(), "loaded table");
    let header = Header::new(table.header).with_context(|| format!("bad header in {}", path.display()))?;
    MemoryRowSource::new(name, header, table.rows).with_context(|| format!("bad rows in {}", path.display()))
}

fn write_output<T: Serialize>(output: Option<&Path>, diff: &T, format: OutputFormat) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(diff)?;
    if let Some(path) = output {
        fs::write(path, &json).with_context(|| format!("cannot write {}", path.display()))?;
        println!("Result written to {}", path.display().to_string().bold());
    }
    if format == OutputFormat::Json {
        println!("{json}");
    }
    Ok(())
}

fn print_table_summary(summary: &TableSummary) {
    println!(
        "Rows: {} compared, {} passed, {} failed, {} not found, {} extra",
        summary.total.to_string().bold(),
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        summary.not_found.to_string().yellow(),
        summary.extra.to_string().yellow(),
    );
    if summary.duplicates > 0 {
        println!("Duplicates: {}", summary.duplicates.to_string().red());
    }
}

fn print_failures(result: &DiffNode) {
    let mut listed = 0;
    let mut skipped = 0;
    result.walk(&mut |node| {
        let failures: Vec<_> = node.fields().iter().filter(|f| f.outcome.is_failure()).collect();
        let bare_failure = failures.is_empty() && !node.is_success() && node.fields().is_empty() && node.children().is_empty();
        if failures.is_empty() && !bare_failure {
            return;
        }
        if listed >= MAX_LISTED_FAILURES {
            skipped += 1;
            return;
        }
        listed += 1;
        let name = node.name.as_deref().unwrap_or("(unnamed)");
        println!("  {} {}", "✗".red(), name.bold());
        if let Some(comment) = &node.comment {
            println!("      {}", comment.dimmed());
        }
        for field in failures {
            let expected = field.expected.as_deref().unwrap_or("<absent>");
            let actual = field.actual.as_deref().unwrap_or("<absent>");
            match (field.outcome, &field.error) {
                (Outcome::Error, Some(error)) => {
                    println!("      {}: {} {}", field.name, "cannot evaluate".red(), error)
                }
                _ => println!(
                    "      {}: expected {}, actual {}",
                    field.name,
                    expected.green(),
                    actual.red()
                ),
            }
        }
    });
    if skipped > 0 {
        println!("  ... and {skipped} more");
    }
}

fn print_verdict(result: &DiffNode) {
    if result.is_success() {
        println!("{} Comparison passed.", "✓".green().bold());
    } else if result.has_errors() {
        println!(
            "{} Comparison failed; some expected values could not be evaluated.",
            "✗".red().bold()
        );
    } else {
        println!("{} Comparison failed.", "✗".red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use concord_types::{ExtraPolicy, RowSource};

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn input(expected: PathBuf, actual: PathBuf, config: Option<PathBuf>) -> InputArgs {
        InputArgs {
            expected,
            actual,
            config,
            output: None,
        }
    }

    #[test]
    fn table_file_with_null_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.json", r#"{"header": ["Id", "Note"], "rows": [["1", null], ["2", "x"]]}"#);
        let mut source = load_table("expected", &path).unwrap();
        assert_eq!(source.remaining(), 2);
        let first = source.next_row().unwrap().unwrap();
        assert_eq!(first.value("Note"), None);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(&dir, "c.toml", "key_columns = [\"A\"]\nextra_policy = \"info\"\n");
        let args = TableArgs {
            input: input(dir.path().join("e"), dir.path().join("a"), Some(config)),
            keys: vec!["Id".into()],
            numeric: vec!["Price:0.01".into()],
            check_duplicates: true,
            ignore_case: true,
        };
        let config = table_config(&args).unwrap();
        assert_eq!(config.key_columns, vec!["Id".to_string()]);
        assert_eq!(config.extra_policy, ExtraPolicy::Info);
        assert!(config.numeric_columns.contains_key("Price"));
        assert!(config.check_duplicates);
        assert!(!config.case_sensitive);
    }

    #[test]
    fn table_command_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write(&dir, "e.json", r#"{"header": ["Id", "Qty"], "rows": [["1", "5"]]}"#);
        let actual = write(&dir, "a.json", r#"{"header": ["Id", "Qty"], "rows": [["1", "6"]]}"#);
        let output = dir.path().join("out.json");
        let args = TableArgs {
            input: InputArgs {
                output: Some(output.clone()),
                ..input(expected, actual, None)
            },
            keys: vec!["Id".into()],
            numeric: Vec::new(),
            check_duplicates: false,
            ignore_case: false,
        };
        assert!(!cmd_table(args, OutputFormat::Text).unwrap());
        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["summary"]["failed"], 1);
    }

    #[test]
    fn message_command_with_group_keys() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write(
            &dir,
            "e.json",
            r#"{"fields": {"MsgType": "Trade"}, "groups": {"Leg": [{"fields": {"SubMsgType": "Leg", "SubMsgSource": "l1", "LegId": "1"}}]}}"#,
        );
        let actual = write(
            &dir,
            "a.json",
            r#"{"fields": {"MsgType": "Trade"}, "groups": {"Leg": [{"fields": {"LegId": "1", "Qty": "3"}}]}}"#,
        );
        let args = MessageArgs {
            input: input(expected, actual, None),
            group_keys: vec!["Leg=LegId".into()],
            ignore_case: false,
        };
        assert!(cmd_message(args, OutputFormat::Json).unwrap());
    }

    #[test]
    fn malformed_group_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = MessageArgs {
            input: input(dir.path().join("e"), dir.path().join("a"), None),
            group_keys: vec!["Leg".into()],
            ignore_case: false,
        };
        assert!(message_config(&args).is_err());
    }

    #[test]
    fn missing_input_is_a_run_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = MessageArgs {
            input: input(dir.path().join("missing.json"), dir.path().join("a"), None),
            group_keys: Vec::new(),
            ignore_case: false,
        };
        let err = cmd_message(args, OutputFormat::Text).unwrap_err();
        assert!(format!("{err:#}").contains("cannot read"));
    }
}
