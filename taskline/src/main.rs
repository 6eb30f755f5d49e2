use std::{
    collections::BTreeSet,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use taskline::config::{DialectChoice, ParseSettings};
use taskline::{Dialect, TaskDeserializer, TaskDetails, format_task};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt::format::FmtSpan};

#[derive(Debug, Parser)]
#[command(
    name = "taskline",
    about = "Read and rewrite markdown task lines",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the fields of every task line.
    Parse(ParseArgs),

    /// Re-render task lines, optionally converting between dialects.
    Format(FormatArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Markdown files or directories. Reads stdin when omitted.
    inputs: Vec<PathBuf>,
    /// Emit JSON instead of a one-line summary per task.
    #[arg(long)]
    json: bool,
    /// Dialect the lines are written in.
    #[arg(long, value_enum, conflicts_with = "config")]
    dialect: Option<DialectArg>,
    /// JSON settings file with the dialect and extension fields.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct FormatArgs {
    /// Markdown files or directories. Reads stdin when omitted.
    inputs: Vec<PathBuf>,
    /// Dialect the lines are written in.
    #[arg(long, value_enum, conflicts_with = "config")]
    from: Option<DialectArg>,
    /// Dialect to write.
    #[arg(long, value_enum, default_value_t = DialectArg::Symbol)]
    to: DialectArg,
    /// JSON settings file used for reading.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overwrite the files instead of printing to stdout.
    #[arg(long, requires = "inputs")]
    in_place: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum DialectArg {
    Symbol,
    InlineField,
}

impl DialectArg {
    fn dialect(self) -> Dialect {
        match self {
            DialectArg::Symbol => Dialect::symbol(),
            DialectArg::InlineField => Dialect::inline_field(),
        }
    }

    fn choice(self) -> DialectChoice {
        match self {
            DialectArg::Symbol => DialectChoice::Symbol,
            DialectArg::InlineField => DialectChoice::InlineField,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_tracing(cli.verbose);
    match cli.command {
        Commands::Parse(args) => handle_parse(args),
        Commands::Format(args) => handle_format(args),
    }
}

fn install_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

/// `RUST_LOG` wins when it is set and parses; otherwise WARN, or DEBUG with `--verbose`.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let fallback = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(fallback.into()))
}

fn build_deserializer(
    config: Option<&Path>,
    dialect: Option<DialectArg>,
) -> Result<TaskDeserializer> {
    let settings = match config {
        Some(path) => ParseSettings::load(path)?,
        None => ParseSettings {
            dialect: dialect.map(DialectArg::choice).unwrap_or_default(),
            ..ParseSettings::default()
        },
    };
    let deserializer = settings.build().context("building task deserializer")?;
    debug!(
        dialect = deserializer.dialect().name(),
        extensions = deserializer.extensions().len(),
        "deserializer ready"
    );
    Ok(deserializer)
}

/// A named chunk of markdown: a file, or stdin.
struct Source {
    label: String,
    path: Option<PathBuf>,
    text: String,
}

fn read_sources(inputs: &[PathBuf]) -> Result<Vec<Source>> {
    if inputs.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(vec![Source {
            label: "<stdin>".to_string(),
            path: None,
            text,
        }]);
    }

    let expanded = expand_inputs(inputs)?;
    if expanded.is_empty() {
        anyhow::bail!("no markdown files found in the provided inputs");
    }
    expanded
        .into_iter()
        .map(|path| {
            let text =
                fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
            Ok(Source {
                label: path.display().to_string(),
                path: Some(path),
                text,
            })
        })
        .collect()
}

fn handle_parse(args: ParseArgs) -> Result<()> {
    let ParseArgs {
        inputs,
        json,
        dialect,
        config,
    } = args;
    let deserializer = build_deserializer(config.as_deref(), dialect)?;
    let sources = read_sources(&inputs)?;

    #[derive(serde::Serialize)]
    struct JsonTask<'a> {
        path: &'a str,
        line: usize,
        task: TaskDetails,
    }

    let mut found = Vec::new();
    for source in &sources {
        info!(source = %source.label, "parsing");
        for (idx, line) in source.text.lines().enumerate() {
            if let Some(task) = deserializer.deserialize(line) {
                found.push(JsonTask {
                    path: &source.label,
                    line: idx + 1,
                    task,
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
    } else {
        for entry in &found {
            println!("{}:{}: {}", entry.path, entry.line, summarize(&entry.task));
        }
    }
    Ok(())
}

fn summarize(task: &TaskDetails) -> String {
    let mut out = format!("[{}] {}", task.status, task.description);
    if task.priority != taskline::Priority::None {
        out.push_str(&format!(" priority={}", task.priority));
    }
    for field in taskline::DateField::ALL {
        if let Some(date) = task.date(field) {
            out.push_str(&format!(" {}={}", field.key(), date));
        }
    }
    if !task.recurrence_rule.is_empty() {
        out.push_str(&format!(" recurrence={:?}", task.recurrence_rule));
    }
    if !task.id.is_empty() {
        out.push_str(&format!(" id={}", task.id));
    }
    if !task.blocked_by.is_empty() {
        out.push_str(&format!(" blockedBy={}", task.blocked_by.join(",")));
    }
    for (key, value) in &task.extensions {
        match value {
            Some(value) => out.push_str(&format!(" {key}={value}")),
            None => out.push_str(&format!(" {key}")),
        }
    }
    out
}

fn handle_format(args: FormatArgs) -> Result<()> {
    let FormatArgs {
        inputs,
        from,
        to,
        config,
        in_place,
    } = args;
    let deserializer = build_deserializer(config.as_deref(), from)?;
    let target = to.dialect();
    let sources = read_sources(&inputs)?;

    let mut first = true;
    for source in sources {
        info!(source = %source.label, target = target.name(), "formatting");
        let formatted = rewrite_text(&source.text, &deserializer, &target);

        match (&source.path, in_place) {
            (Some(path), true) => {
                fs::write(path, formatted.as_bytes())
                    .with_context(|| format!("writing {:?}", path))?;
            }
            _ => {
                if inputs.len() > 1 {
                    if !first {
                        println!();
                    }
                    println!("== {} ==", source.label);
                }
                first = false;
                print!("{formatted}");
            }
        }
    }
    Ok(())
}

/// Re-render task lines; every other line passes through untouched.
fn rewrite_text(text: &str, deserializer: &TaskDeserializer, target: &Dialect) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, ending) = match line.strip_suffix("\r\n") {
            Some(content) => (content, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(content) => (content, "\n"),
                None => (line, ""),
            },
        };
        match deserializer.deserialize(content) {
            Some(task) => out.push_str(&format_task(&task, target)),
            None => out.push_str(content),
        }
        out.push_str(ending);
    }
    out
}

fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut visited = BTreeSet::new();
    for path in paths {
        let canonical =
            fs::canonicalize(path).with_context(|| format!("resolving path {:?}", path))?;
        let meta = fs::metadata(&canonical)
            .with_context(|| format!("reading metadata for {:?}", canonical))?;
        if meta.is_dir() {
            debug!(dir = ?canonical, "scanning directory");
            let mut found = Vec::new();
            visit_dir(&canonical, &mut found)?;
            found.sort();
            for file in found {
                if visited.insert(file.clone()) {
                    out.push(file);
                }
            }
        } else if meta.is_file() {
            if visited.insert(canonical.clone()) {
                out.push(canonical);
            }
        }
    }
    Ok(out)
}

fn visit_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("listing {:?}", dir))? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }
        let path = entry.path();
        if file_type.is_dir() {
            visit_dir(&path, out)?;
        } else if is_markdown(&path) {
            debug!(file = ?path, "found markdown file");
            out.push(path);
        }
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "md" || ext == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_flags() {
        let cli = Cli::parse_from([
            "taskline",
            "--verbose",
            "parse",
            "--json",
            "--dialect",
            "inline-field",
            "a.md",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Parse(args) => {
                assert!(args.json);
                assert_eq!(args.dialect, Some(DialectArg::InlineField));
                assert_eq!(args.inputs, vec![PathBuf::from("a.md")]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn format_defaults_to_symbol_output() {
        let cli = Cli::parse_from(["taskline", "format", "--from", "inline-field"]);
        match cli.command {
            Commands::Format(args) => {
                assert_eq!(args.from, Some(DialectArg::InlineField));
                assert_eq!(args.to, DialectArg::Symbol);
                assert!(args.inputs.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn dialect_and_config_conflict() {
        let res = Cli::try_parse_from([
            "taskline", "parse", "--dialect", "symbol", "--config", "c.json",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn rust_log_overrides_the_default_level() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            log_filter(false, Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(true, Some("error")).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
        assert_eq!(log_filter(false, Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn rewrite_converts_tasks_and_keeps_other_lines() {
        let deserializer =
            build_deserializer(None, Some(DialectArg::Symbol)).expect("deserializer");
        let text = "# Chores\r\n- [ ] Task ⏫ 📅 2024-02-01\n\nplain text\n  - [x] Done ✅ 2024-01-02";
        let out = rewrite_text(text, &deserializer, &Dialect::inline_field());
        assert_eq!(
            out,
            "# Chores\r\n- [ ] Task [priority:: high] [due:: 2024-02-01]\n\nplain text\n  - [x] Done [completion:: 2024-01-02]"
        );
    }

    #[test]
    fn summary_lists_present_fields() {
        let task = TaskDeserializer::default()
            .deserialize("- [ ] Pay rent 🔁 every month 🔽 📅 2024-02-01")
            .expect("task line");
        assert_eq!(
            summarize(&task),
            "[ ] Pay rent priority=low dueDate=2024-02-01 recurrence=\"every month\""
        );
    }

    #[test]
    fn config_file_drives_the_deserializer() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = tmp.path().join("taskline.json");
        fs::write(
            &config,
            r#"{ "dialect": "inline-field", "extensions": [ { "key": "pomodoros", "pattern": "🍅:: *(\\d+)" } ] }"#,
        )
        .expect("write config");
        let deserializer = build_deserializer(Some(&config), None).expect("deserializer");
        assert_eq!(deserializer.dialect().name(), "inline-field");
        assert_eq!(deserializer.extensions().len(), 1);
    }

    #[test]
    fn expand_inputs_finds_markdown_in_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir_all(root.join("notes/daily")).expect("mkdir");
        fs::write(root.join("notes/b.md"), "- [ ] b").expect("write b");
        fs::write(root.join("notes/daily/a.markdown"), "- [ ] a").expect("write a");
        fs::write(root.join("notes/skip.txt"), "- [ ] skip").expect("write txt");

        let found = expand_inputs(&[root.join("notes"), root.join("notes/b.md")]).expect("expand");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.md", "a.markdown"]);
    }
}
