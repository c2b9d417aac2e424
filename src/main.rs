use anyhow::{Context as _, Result};
use chrono::{NaiveDate, TimeDelta};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use yore::config::{self, YoreConfig};
use yore::directive::{Directive, DirectiveParser, Kind};
use yore::duration::{natural_delta, parse_lead_time};
use yore::editor::{CheckStatus, TriggerInputs};
use yore::lifecycle::{LifecycleTable, ReleaseCycleSource};
use yore::scan::{malformed_directives, read_lines, source_files, ScanOptions};
use yore::session::{check_file, fix_file, Context, FileOutcome};
use yore::version::parse_version;

#[derive(Parser)]
#[command(name = "yore")]
#[command(
    about = "Manage legacy code in your code base with YORE comments",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check YORE comments against end-of-life dates or the next project version
    Check {
        #[command(flatten)]
        scan: ScanArgs,

        /// The next version of your project
        #[arg(short, long, value_parser = parse_version_arg)]
        bump: Option<String>,

        /// Warn this long before an end of life (e.g. "2 weeks", "1m")
        #[arg(short = 'E', long, value_parser = parse_lead_time_arg)]
        warn_before_eol: Option<TimeDelta>,

        /// Warn this long before a first release (e.g. "2 weeks", "1m")
        #[arg(short = 'B', long, value_parser = parse_lead_time_arg)]
        warn_before_bol: Option<TimeDelta>,
    },

    /// Fix YORE comments and the code they manage
    Fix {
        #[command(flatten)]
        scan: ScanArgs,

        /// The next version of your project
        #[arg(short, long, value_parser = parse_version_arg)]
        bump: Option<String>,

        /// Fix this long before an end of life (e.g. "2 weeks", "1m")
        #[arg(short = 'E', long, value_parser = parse_lead_time_arg)]
        fix_before_eol: Option<TimeDelta>,

        /// Fix this long before a first release (e.g. "2 weeks", "1m")
        #[arg(short = 'B', long, value_parser = parse_lead_time_arg)]
        fix_before_bol: Option<TimeDelta>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },
}

/// Options shared by every command.
#[derive(Args)]
struct ScanArgs {
    /// Files or directories to process (defaults to the current directory)
    paths: Vec<PathBuf>,

    /// Comment prefix to look for (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// Config file (defaults to ./yore.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory names to skip; replaces the configured list
    #[arg(long)]
    exclude: Vec<String>,

    /// Local release-cycle JSON to use instead of fetching it
    #[arg(long)]
    lifecycle_file: Option<PathBuf>,

    /// Report comments that carry the prefix but do not parse
    #[arg(long)]
    strict: bool,

    /// Print each file as it is scanned
    #[arg(short, long)]
    verbose: bool,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, hide = true, value_parser = parse_date_arg)]
    today: Option<NaiveDate>,
}

fn parse_version_arg(value: &str) -> Result<String, String> {
    parse_version(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

fn parse_lead_time_arg(value: &str) -> Result<TimeDelta, String> {
    parse_lead_time(value).map_err(|e| e.to_string())
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            scan,
            bump,
            warn_before_eol,
            warn_before_bol,
        } => cmd_check(scan, bump, warn_before_eol, warn_before_bol),

        Commands::Fix {
            scan,
            bump,
            fix_before_eol,
            fix_before_bol,
            dry_run,
            diff,
        } => cmd_fix(scan, bump, fix_before_eol, fix_before_bol, dry_run, diff),
    }
}

/// State built once per run from the arguments and the config file.
struct Setup {
    paths: Vec<PathBuf>,
    parser: DirectiveParser,
    options: ScanOptions,
    lifecycle: LifecycleTable,
    today: NaiveDate,
    strict: bool,
    verbose: bool,
}

impl Setup {
    fn new(args: ScanArgs) -> Result<Self> {
        let cwd = env::current_dir().context("cannot determine the current directory")?;
        let config: YoreConfig = config::discover(args.config.as_deref(), &cwd)?;

        let prefix = args.prefix.as_deref().unwrap_or(&config.prefix);
        let parser = DirectiveParser::new(prefix)?;

        let exclude = if args.exclude.is_empty() {
            config.exclude.clone()
        } else {
            args.exclude
        };
        let options = ScanOptions::new(&exclude, &config.extensions)?;

        let source = match (args.lifecycle_file, config.lifecycle_file, config.lifecycle_url) {
            (Some(path), _, _) | (None, Some(path), _) => ReleaseCycleSource::File(path),
            (None, None, Some(url)) => ReleaseCycleSource::Remote(url),
            (None, None, None) => ReleaseCycleSource::default(),
        };

        let paths = if args.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.paths
        };

        Ok(Self {
            paths,
            parser,
            options,
            lifecycle: LifecycleTable::new(source),
            today: args.today.unwrap_or_else(|| TriggerInputs::today().today),
            strict: args.strict,
            verbose: args.verbose,
        })
    }

    /// Files to process, reporting paths that do not exist.
    fn files(&self) -> (Vec<PathBuf>, usize) {
        let mut files = Vec::new();
        let mut missing = 0;
        for path in &self.paths {
            if !path.exists() {
                eprintln!(
                    "{} {}: no such file or directory",
                    "✗".red(),
                    path.display()
                );
                missing += 1;
                continue;
            }
            if self.verbose {
                println!("{}", format!("{}: scanning...", path.display()).dimmed());
            }
            files.extend(source_files(path, &self.options));
        }
        (files, missing)
    }

    fn report_malformed(&self, file: &Path) -> usize {
        if !self.strict {
            return 0;
        }
        let Some(lines) = read_lines(file) else {
            return 0;
        };
        let errors = malformed_directives(&lines, &self.parser);
        for error in &errors {
            println!(
                "{} {}: {}",
                "⚠".yellow(),
                file.display(),
                error.to_string().yellow()
            );
        }
        errors.len()
    }
}

fn location(file: &Path, directive: &Directive) -> String {
    format!("{}:{}", file.display(), directive.origin_line)
}

fn cmd_check(
    args: ScanArgs,
    bump: Option<String>,
    warn_before_eol: Option<TimeDelta>,
    warn_before_bol: Option<TimeDelta>,
) -> Result<()> {
    let setup = Setup::new(args)?;

    let mut inputs = TriggerInputs::new(setup.today);
    inputs.next_version = bump.clone();
    inputs.eol_lead = warn_before_eol;
    inputs.bol_lead = warn_before_bol;

    let ctx = Context {
        parser: &setup.parser,
        inputs: &inputs,
        lifecycle: &setup.lifecycle,
    };

    let (files, missing) = setup.files();
    let mut errors = missing;
    let mut warnings = 0;
    let mut checked = 0;

    for file in &files {
        if setup.verbose {
            println!("{}", format!("{}: checking", file.display()).dimmed());
        }
        warnings += setup.report_malformed(file);

        for finding in check_file(file, ctx) {
            checked += 1;
            let directive = &finding.directive;
            let at = location(&finding.path, directive);
            let version = &directive.version;

            match finding.status {
                Ok(CheckStatus::NotDue) => {}
                Ok(CheckStatus::Due { date }) => {
                    let message = match (directive.kind, date) {
                        (Kind::Eol, Some(date)) => {
                            format!("{version} has reached its end of life since {date}")
                        }
                        (Kind::Bol, Some(date)) => format!("{version} is released since {date}"),
                        _ => format!(
                            "code is scheduled for update/removal in {version}, \
                             which is older than or equal to {}",
                            bump.as_deref().unwrap_or(version)
                        ),
                    };
                    eprintln!("{} {}: {}", "✗".red(), at, message.red());
                    errors += 1;
                }
                Ok(CheckStatus::Approaching { remaining_days, .. }) => {
                    let delta = natural_delta(remaining_days);
                    let message = match directive.kind {
                        Kind::Bol => format!("{version} will be released within approx. {delta}"),
                        _ => format!("{version} will reach its end of life within approx. {delta}"),
                    };
                    println!("{} {}: {}", "⚠".yellow(), at, message.yellow());
                    warnings += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: {}", "✗".red(), at, e);
                    errors += 1;
                }
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} comments checked", checked);
    println!("  {} warnings", format!("{}", warnings).yellow());
    println!("  {} errors", format!("{}", errors).red());

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_fix(
    args: ScanArgs,
    bump: Option<String>,
    fix_before_eol: Option<TimeDelta>,
    fix_before_bol: Option<TimeDelta>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let setup = Setup::new(args)?;

    let mut inputs = TriggerInputs::new(setup.today);
    inputs.next_version = bump;
    inputs.eol_lead = fix_before_eol;
    inputs.bol_lead = fix_before_bol;

    let ctx = Context {
        parser: &setup.parser,
        inputs: &inputs,
        lifecycle: &setup.lifecycle,
    };

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be fixed]".cyan());
    }

    let (files, missing) = setup.files();
    let mut failed = missing;
    let mut fixed_comments = 0;
    let mut fixed_files = 0;

    for file in &files {
        setup.report_malformed(file);

        let fix = match fix_file(file, ctx, dry_run) {
            Ok(fix) => fix,
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                failed += 1;
                continue;
            }
        };

        for (directive, e) in &fix.errors {
            eprintln!("{} {}: {}", "✗".red(), location(&fix.path, directive), e);
            failed += 1;
        }

        let plural = if fix.applied == 1 { "" } else { "s" };
        match fix.outcome {
            FileOutcome::Unchanged => {
                if setup.verbose {
                    println!("{}", format!("{}: nothing to fix", file.display()).dimmed());
                }
                continue;
            }
            FileOutcome::Rewritten => println!(
                "{} fixed {} comment{} in {}",
                "✓".green(),
                fix.applied,
                plural,
                fix.path.display()
            ),
            FileOutcome::Removed => println!(
                "{} removed {} ({} comment{})",
                "✓".green(),
                fix.path.display(),
                fix.applied,
                plural
            ),
        }

        fixed_comments += fix.applied;
        fixed_files += 1;

        if show_diff {
            display_diff(&fix.path, &fix.original, &fix.fixed);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} comments fixed in {} files",
        format!("{}", fixed_comments).green(),
        fixed_files
    );
    println!("  {} failed", format!("{}", failed).red());

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Show unified diff between original and fixed content
fn display_diff(file: &Path, original: &str, fixed: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, fixed);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
