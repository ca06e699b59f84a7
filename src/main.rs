use std::env;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use sitelens_core::{AuditConfig, AuditReport, IssueKind, PageAuditor, audit_html};
use tracing_subscriber::EnvFilter;
use url::Url;

const APP_NAME: &str = "sitelens";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy, Debug, PartialEq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "md",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, PartialEq)]
enum Source {
    Url(String),
    File(PathBuf),
}

#[derive(Debug)]
struct CliOptions {
    source: Source,
    format: OutputFormat,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    save_target: Option<PathBuf>,
}

#[derive(Debug)]
enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut url: Option<String> = None;
    let mut file: Option<PathBuf> = None;
    let mut format = OutputFormat::Text;
    let mut timeout: Option<Duration> = None;
    let mut user_agent: Option<String> = None;
    let mut save_target: Option<PathBuf> = None;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if matches!(arg.as_str(), "-h" | "--help") {
            return Ok(CliCommand::Help);
        }

        if matches!(arg.as_str(), "-v" | "--version") {
            return Ok(CliCommand::Version);
        }

        if matches!(arg.as_str(), "-j" | "--json") {
            format = OutputFormat::Json;
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-t" | "--timeout") {
            let value = flag_value(args, i)?;
            timeout = Some(parse_timeout(value)?);
            i += 2;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--timeout=") {
            timeout = Some(parse_timeout(value)?);
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-u" | "--user-agent") {
            user_agent = Some(flag_value(args, i)?.to_string());
            i += 2;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--user-agent=") {
            user_agent = Some(value.to_string());
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-f" | "--file") {
            file = Some(PathBuf::from(flag_value(args, i)?));
            i += 2;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--save=").or_else(|| arg.strip_prefix("-s=")) {
            if save_target.is_some() {
                return Err(anyhow!("--save specified multiple times"));
            }
            save_target = Some(if value.is_empty() {
                PathBuf::from(".")
            } else {
                PathBuf::from(value)
            });
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-s" | "--save") {
            if save_target.is_some() {
                return Err(anyhow!("--save specified multiple times"));
            }
            let source_known = url.is_some() || file.is_some();
            let next_is_path = source_known
                && args
                    .get(i + 1)
                    .map(|next| !next.starts_with('-'))
                    .unwrap_or(false);

            if next_is_path {
                save_target = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            } else {
                save_target = Some(PathBuf::from("."));
                i += 1;
            }

            continue;
        }

        if arg.starts_with('-') {
            return Err(anyhow!("unknown flag: {arg}"));
        }

        if url.is_none() {
            url = Some(arg.clone());
        } else {
            return Err(anyhow!("unexpected additional argument: {}", arg));
        }

        i += 1;
    }

    let source = match (url, file) {
        (Some(_), Some(_)) => return Err(anyhow!("pass either <url> or --file, not both")),
        (Some(url), None) => Source::Url(url),
        (None, Some(path)) => Source::File(path),
        (None, None) => return Err(anyhow!("missing <url> argument")),
    };

    if matches!(source, Source::File(_)) && (timeout.is_some() || user_agent.is_some()) {
        return Err(anyhow!(
            "--timeout and --user-agent only apply when fetching a URL, not with --file"
        ));
    }

    Ok(CliCommand::Run(CliOptions {
        source,
        format,
        timeout,
        user_agent,
        save_target,
    }))
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing value for {}", args[i]))
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("invalid timeout: {value}"))?;
    if secs == 0 {
        return Err(anyhow!("timeout must be at least 1 second"));
    }
    Ok(Duration::from_secs(secs))
}

fn print_help() {
    println!("{APP_NAME} — single-page SEO site audit");
    println!("Usage: {APP_NAME} [OPTIONS] <URL>");
    println!("       {APP_NAME} [OPTIONS] --file <PATH>\n");
    println!("Options:");
    println!("  -j, --json              Print the report as JSON");
    println!("  -t, --timeout SECS      Fetch timeout in seconds (default 10)");
    println!("  -u, --user-agent UA     User-Agent header sent with the fetch");
    println!("  -f, --file PATH         Audit a saved HTML file instead of fetching");
    println!("                          (cannot be combined with --timeout or --user-agent)");
    println!("  -s, --save [PATH]       Save the output to a file");
    println!("  -v, --version           Show version information");
    println!("  -h, --help              Show this help message");
    println!("\nSet RUST_LOG=debug to trace each check.");
}

fn print_version() {
    println!("{APP_NAME} {VERSION}");
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let raw_args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_arguments(&raw_args)? {
        CliCommand::Help => {
            print_help();
            return Ok(());
        }
        CliCommand::Version => {
            print_version();
            return Ok(());
        }
        CliCommand::Run(options) => options,
    };

    let report = run_audit(&options).await?;

    let output = match options.format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => render_report(&report),
    };
    print!("{}", output);

    if let Some(save_base) = options.save_target.as_ref() {
        let output_path = build_output_path(save_base, &report.url, options.format);
        save_output(&output_path, &output)?;
        println!("\nWrote output to {}", output_path.display());
    }

    Ok(())
}

async fn run_audit(options: &CliOptions) -> Result<AuditReport> {
    match &options.source {
        Source::File(path) => {
            let html = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(audit_html(path.display().to_string(), &html))
        }
        Source::Url(url) => {
            let mut config = AuditConfig::default();
            if let Some(timeout) = options.timeout {
                config = config.with_timeout(timeout);
            }
            if let Some(user_agent) = options.user_agent.as_ref() {
                config = config.with_user_agent(user_agent.clone());
            }

            let auditor = PageAuditor::with_config(config)?;
            Ok(auditor.audit(url).await?)
        }
    }
}

const DIVIDER: &str = "─────────────────────────────────────────────────────────────";
const LABEL_WIDTH: usize = 16;

fn push_section_header(buf: &mut String, icon: &str, title: &str) {
    let _ = writeln!(buf, "{DIVIDER}");
    let _ = writeln!(buf, "{icon} {title}");
    let _ = writeln!(buf, "{DIVIDER}");
}

fn push_key_value(buf: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(buf, "• {:<width$} : {}", label, value, width = LABEL_WIDTH);
}

/// Score bands used by the dashboard's gauges
#[derive(Clone, Copy, Debug, PartialEq)]
enum Health {
    Good,
    NeedsWork,
    Poor,
}

impl Health {
    fn from_score(score: u8) -> Self {
        match score {
            90.. => Health::Good,
            50.. => Health::NeedsWork,
            _ => Health::Poor,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Health::Good => "🟢 Good",
            Health::NeedsWork => "🟠 Needs work",
            Health::Poor => "🔴 Poor",
        }
    }
}

fn render_report(report: &AuditReport) -> String {
    let mut output = String::new();

    push_section_header(&mut output, "🔍", &format!("Site Audit: {}", report.url));
    push_key_value(
        &mut output,
        "Score",
        &format!(
            "{}/100 ({})",
            report.score,
            Health::from_score(report.score).label()
        ),
    );
    push_key_value(&mut output, "Title", &report.title);
    push_key_value(&mut output, "Meta Description", &report.meta_description);
    let _ = writeln!(&mut output);

    if report.issues.is_empty() {
        push_section_header(&mut output, "✅", "No issues found");
    } else {
        push_section_header(
            &mut output,
            "🩺",
            &format!(
                "Issues ({} errors, {} warnings)",
                report.error_count(),
                report.warning_count()
            ),
        );
        for issue in &report.issues {
            let icon = match issue.kind {
                IssueKind::Error => "❌",
                IssueKind::Warning => "⚠️",
            };
            let _ = writeln!(&mut output, "{icon} {}", issue.message);
        }
    }
    let _ = writeln!(&mut output);

    push_section_header(&mut output, "📊", "Page Stats");
    push_key_value(&mut output, "H1 Tags", &report.stats.h1.to_string());
    push_key_value(&mut output, "Images", &report.stats.images.to_string());
    push_key_value(&mut output, "Links", &report.stats.links.to_string());

    output
}

fn save_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    fs::write(path, contents.as_bytes())
        .with_context(|| format!("failed to write output file {}", path.display()))
}

fn build_output_path(base: &Path, target: &str, format: OutputFormat) -> PathBuf {
    let has_extension = base
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(format.extension()))
        .unwrap_or(false);

    if has_extension {
        base.to_path_buf()
    } else {
        base.join(derive_output_filename(target, format))
    }
}

fn derive_output_filename(target: &str, format: OutputFormat) -> String {
    let stem = match Url::parse(target) {
        Ok(url) => {
            let host = url.host_str().unwrap_or("page");
            let mut path_component = url.path().trim_matches('/').replace('/', "_");
            if path_component.is_empty() {
                path_component = "index".to_string();
            }

            let mut parts = vec![sanitize_for_filename(host), sanitize_for_filename(&path_component)];
            if let Some(query) = url.query().filter(|q| !q.is_empty()) {
                parts.push(sanitize_for_filename(query));
            }
            parts.join("__")
        }
        // Local files are labelled with their path
        Err(_) => {
            let name = Path::new(target)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "page".to_string());
            sanitize_for_filename(&name)
        }
    };

    format!("{stem}__audit.{}", format.extension())
}

fn sanitize_for_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
