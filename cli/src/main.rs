//! hwpkit CLI - HWP/HWPX document toolkit
//!
//! Reads, analyzes, converts, creates and edits HWP and HWPX files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use hwpkit::{ConvertTarget, DocumentSpec, OutputFormat, ReadOptions, TableSpec};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// HWP/HWPX document toolkit
#[derive(Parser)]
#[command(
    name = "hwpkit",
    author = "iyulab",
    version,
    about = "Analyze, read, convert, create and edit HWP/HWPX documents",
    long_about = "hwpkit - HWP/HWPX document toolkit.\n\n\
                  Reads HWP 5.0 and HWPX files as Markdown, text or JSON, reports\n\
                  their structure, and creates or edits HWPX files.\n\n\
                  Usage:\n  \
                  hwpkit read <file>                 Print the document as Markdown\n  \
                  hwpkit analyze <file>...           Print a JSON structure report\n  \
                  hwpkit create out.hwpx --body ...  Create a new HWPX document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug details to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a document as Markdown, text or JSON
    Read {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "md")]
        format: ReadFormat,

        #[command(flatten)]
        read: ReadFlags,
    },

    /// Report container, metadata and structure as JSON
    Analyze {
        /// Input file paths
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Create an HWPX document
    Create {
        /// Output file path (.hwpx is appended when missing)
        output: PathBuf,

        /// Document title
        #[arg(long, default_value = "")]
        title: String,

        /// Document author
        #[arg(long, default_value = "")]
        author: String,

        #[command(flatten)]
        source: CreateSource,
    },

    /// Edit an HWPX document
    Edit {
        /// Input HWPX file
        input: PathBuf,

        /// Output HWPX file (may be the input)
        output: PathBuf,

        #[command(flatten)]
        action: EditAction,
    },

    /// Convert a document to Markdown, HTML or text
    Convert {
        /// Input file path
        input: PathBuf,

        /// Target format
        #[arg(long)]
        to: ConvertFormat,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        read: ReadFlags,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ReadFlags {
    /// Skip body sections that fail to decompress instead of failing
    #[arg(long)]
    lenient: bool,

    /// Never run external converters such as hwp5txt
    #[arg(long)]
    no_external: bool,

    /// Time limit for external converters, in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl ReadFlags {
    fn options(&self) -> ReadOptions {
        let mut options = ReadOptions::default()
            .with_converter_timeout(std::time::Duration::from_secs(self.timeout));
        if self.lenient {
            options = options.lenient();
        }
        if self.no_external {
            options = options.without_external_converters();
        }
        options
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct CreateSource {
    /// Plain text body, one paragraph per line
    #[arg(long)]
    body: Option<String>,

    /// Path to a Markdown file
    #[arg(long)]
    markdown: Option<PathBuf>,

    /// Markdown text
    #[arg(long)]
    markdown_text: Option<String>,

    /// Path to a JSON file: {"title", "author", "paragraphs", "tables"}
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct EditAction {
    /// Replace text: --replace 'old text' 'new text'
    #[arg(long, num_args = 2, value_names = ["FIND", "REPLACE"])]
    replace: Option<Vec<String>>,

    /// Add a paragraph at the end
    #[arg(long, value_name = "TEXT")]
    add_paragraph: Option<String>,

    /// Add a table: --add-table '{"headers":["A","B"],"rows":[["1","2"]]}'
    #[arg(long, value_name = "JSON")]
    add_table: Option<String>,

    /// Add a memo: --add-memo 'comment text' [paragraph_index]
    #[arg(long, num_args = 1..=2, value_names = ["TEXT", "PARA_INDEX"])]
    add_memo: Option<Vec<String>>,
}

/// Output format for `read`
#[derive(Clone, Copy, ValueEnum)]
enum ReadFormat {
    Md,
    Txt,
    Json,
}

impl From<ReadFormat> for OutputFormat {
    fn from(format: ReadFormat) -> Self {
        match format {
            ReadFormat::Md => OutputFormat::Markdown,
            ReadFormat::Txt => OutputFormat::Text,
            ReadFormat::Json => OutputFormat::Json,
        }
    }
}

/// Target format for `convert`
#[derive(Clone, Copy, ValueEnum)]
enum ConvertFormat {
    Md,
    Html,
    Txt,
}

impl From<ConvertFormat> for ConvertTarget {
    fn from(format: ConvertFormat) -> Self {
        match format {
            ConvertFormat::Md => ConvertTarget::Markdown,
            ConvertFormat::Html => ConvertTarget::Html,
            ConvertFormat::Txt => ConvertTarget::Text,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> CliResult {
    match cli.command {
        Commands::Read {
            input,
            output,
            format,
            read,
        } => {
            require_file(&input)?;
            let pb = create_spinner("Reading document...");
            let content = hwpkit::read_file(&input, format.into(), &read.options());
            pb.finish_and_clear();

            let content = content?;
            write_output(output.as_deref(), &content)?;
            if let Some(path) = output {
                status(&format!("Saved to: {}", path.display()));
            }
        }

        Commands::Analyze { inputs, compact } => {
            let pb = create_spinner("Analyzing...");
            let results = hwpkit::analyze_many(&inputs);
            pb.finish_and_clear();

            let single = inputs.len() == 1;
            let mut reports = Vec::new();
            let mut failures = 0;
            for (path, result) in inputs.iter().zip(results) {
                match result {
                    Ok(report) => reports.push(report),
                    Err(e) if single => return Err(e.into()),
                    Err(e) => {
                        failures += 1;
                        eprintln!("{} {}: {}", "✗".red().bold(), path.display(), e);
                    }
                }
            }

            let json = if single {
                to_json(&reports[0], compact)?
            } else {
                to_json(&reports, compact)?
            };
            write_output(None, &json)?;

            if failures > 0 {
                return Err(format!("{} of {} files could not be analyzed", failures, inputs.len()).into());
            }
        }

        Commands::Create {
            output,
            title,
            author,
            source,
        } => {
            let spec = build_spec(source)?
                .with_default_title(&title)
                .with_default_author(&author);
            let path = hwpkit::create_document(spec, &output)?;
            status(&format!("Created: {}", path.display()));
        }

        Commands::Edit {
            input,
            output,
            action,
        } => {
            require_file(&input)?;
            if let Some(pair) = action.replace {
                let (find, replace) = (&pair[0], &pair[1]);
                let count = hwpkit::replace_text(&input, &output, find, replace)?;
                status(&format!(
                    "Replaced '{}' → '{}' ({} occurrences) in {}",
                    find,
                    replace,
                    count,
                    output.display()
                ));
            } else if let Some(text) = action.add_paragraph {
                hwpkit::add_paragraph(&input, &output, &text)?;
                status(&format!("Added paragraph to {}", output.display()));
            } else if let Some(json) = action.add_table {
                let table: TableSpec = serde_json::from_str(&json)?;
                hwpkit::add_table(&input, &output, &table)?;
                status(&format!("Added table to {}", output.display()));
            } else if let Some(args) = action.add_memo {
                let index = memo_index(&args)?;
                if hwpkit::add_memo(&input, &output, &args[0], index)? {
                    status(&format!("Added memo to paragraph {} in {}", index, output.display()));
                } else {
                    status(&format!(
                        "No paragraph {}; wrote {} without a memo",
                        index,
                        output.display()
                    ));
                }
            }
        }

        Commands::Convert {
            input,
            to,
            output,
            read,
        } => {
            require_file(&input)?;
            let options = read.options();
            let pb = create_spinner("Converting...");
            match output {
                Some(path) => {
                    let written = hwpkit::convert_to_file(&input, to.into(), Some(&path), &options);
                    pb.finish_and_clear();
                    status(&format!("Saved to: {}", written?.display()));
                }
                None => {
                    let content = hwpkit::convert(&input, to.into(), &options);
                    pb.finish_and_clear();
                    write_output(None, &content?)?;
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn build_spec(source: CreateSource) -> CliResult<DocumentSpec> {
    if let Some(path) = source.markdown {
        let markdown = fs::read_to_string(&path)?;
        Ok(DocumentSpec::from_markdown(&markdown))
    } else if let Some(markdown) = source.markdown_text {
        Ok(DocumentSpec::from_markdown(&markdown))
    } else if let Some(path) = source.json {
        let json = fs::read_to_string(&path)?;
        Ok(DocumentSpec::from_json(&json)?)
    } else if let Some(body) = source.body {
        Ok(DocumentSpec::from_body(&body))
    } else {
        Err("Provide --body, --markdown, --markdown-text, or --json".into())
    }
}

/// Paragraph index of `--add-memo`, 0 when omitted.
fn memo_index(args: &[String]) -> CliResult<usize> {
    match args.get(1) {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("Invalid paragraph index: {}", raw).into()),
        None => Ok(0),
    }
}

fn require_file(path: &Path) -> CliResult {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("File not found: {}", path.display()).into())
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// Prints a status line on stderr so stdout carries only document output.
fn status(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

fn print_version() {
    println!("{} {}", "hwpkit".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("HWP/HWPX document toolkit");
    println!();
    println!("Read and analyze: HWP 5.0, HWPX");
    println!("Create and edit:  HWPX");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&Path>, content: &str) -> CliResult {
    match path {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_requires_one_source() {
        assert!(Cli::try_parse_from(["hwpkit", "create", "out"]).is_err());
        assert!(Cli::try_parse_from(["hwpkit", "create", "out", "--body", "a", "--json", "b.json"]).is_err());
        assert!(Cli::try_parse_from(["hwpkit", "create", "out", "--markdown-text", "# 제목"]).is_ok());
    }

    #[test]
    fn test_edit_replace_takes_two_values() {
        let cli = Cli::try_parse_from(["hwpkit", "edit", "a.hwpx", "b.hwpx", "--replace", "old", "new"]).unwrap();
        match cli.command {
            Commands::Edit { action, .. } => {
                assert_eq!(action.replace, Some(vec!["old".to_string(), "new".to_string()]));
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_edit_add_memo_index_is_optional() {
        let cli = Cli::try_parse_from(["hwpkit", "edit", "a.hwpx", "b.hwpx", "--add-memo", "메모"]).unwrap();
        match cli.command {
            Commands::Edit { action, .. } => {
                let args = action.add_memo.unwrap();
                assert_eq!(args, vec!["메모".to_string()]);
                assert_eq!(memo_index(&args).unwrap(), 0);
            }
            _ => panic!("expected edit"),
        }

        let cli = Cli::try_parse_from(["hwpkit", "edit", "a.hwpx", "b.hwpx", "--add-memo", "메모", "3"]).unwrap();
        match cli.command {
            Commands::Edit { action, .. } => assert_eq!(memo_index(&action.add_memo.unwrap()).unwrap(), 3),
            _ => panic!("expected edit"),
        }

        assert!(memo_index(&["x".to_string(), "둘".to_string()]).is_err());
        assert!(Cli::try_parse_from(["hwpkit", "edit", "a", "b", "--add-memo", "m", "--add-paragraph", "p"]).is_err());
    }

    #[test]
    fn test_build_spec_from_body() {
        let spec = build_spec(CreateSource {
            body: Some("하나\n\n둘".into()),
            markdown: None,
            markdown_text: None,
            json: None,
        })
        .unwrap()
        .with_default_title("제목");
        assert_eq!(spec.title, "제목");
        assert_eq!(spec.paragraphs, vec!["하나", "둘"]);
    }
}
