use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use quiz_core::model::{ActivityKey, GradeLevel};
use services::{ActivityLoopService, Clock, ProgressService};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod catalog;
mod shell;

use catalog::{Activity, Catalog};

/// Progress database used when neither `--db` nor `QUIZ_DB_URL` is given.
const DEFAULT_DB_FILE: &str = "quiz.sqlite3";
const MEMORY_DB_URL: &str = "sqlite::memory:";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingActivity { command: &'static str },
    UnknownArg(String),
    InvalidGrade { raw: String },
    InvalidSeed { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingActivity { command } => {
                write!(f, "{command} requires an activity name")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidGrade { raw } => write!(f, "invalid --grade value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
enum LookupError {
    UnknownActivity { name: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownActivity { name } => write!(
                f,
                "no single activity matches {name:?}; try `list` or pass --grade"
            ),
        }
    }
}

impl std::error::Error for LookupError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [menu]            [--grade <3|5>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- list              [--grade <3|5>]");
    eprintln!("  cargo run -p app -- play <activity>   [--grade <3|5>] [--db <sqlite_url>] [--seed <n>]");
    eprintln!("  cargo run -p app -- progress          [--grade <3|5>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- reset <activity>  [--grade <3|5>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:{DEFAULT_DB_FILE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_GRADE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Menu,
    List,
    Play,
    Progress,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "menu" => Some(Self::Menu),
            "list" => Some(Self::List),
            "play" => Some(Self::Play),
            "progress" => Some(Self::Progress),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::List => "list",
            Self::Play => "play",
            Self::Progress => "progress",
            Self::Reset => "reset",
        }
    }

    fn takes_activity(self) -> bool {
        matches!(self, Self::Play | Self::Reset)
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    grade: Option<GradeLevel>,
    activity: Option<String>,
    seed: Option<u64>,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            &std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| DEFAULT_DB_FILE.to_string()),
        );
        let mut grade = std::env::var("QUIZ_GRADE")
            .ok()
            .and_then(|value| value.parse::<GradeLevel>().ok());
        let mut activity_words: Vec<String> = Vec::new();
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--grade" => {
                    let value = require_value(args, "--grade")?;
                    let parsed = value
                        .parse::<GradeLevel>()
                        .map_err(|_| ArgsError::InvalidGrade { raw: value.clone() })?;
                    grade = Some(parsed);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd.takes_activity() && !arg.starts_with("--") => activity_words.push(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // Unquoted multi-word names arrive as separate args.
        let activity = if activity_words.is_empty() {
            None
        } else {
            Some(activity_words.join(" "))
        };
        if cmd.takes_activity() && activity.is_none() {
            return Err(ArgsError::MissingActivity {
                command: cmd.name(),
            });
        }

        Ok(Self {
            db_url,
            grade,
            activity,
            seed,
        })
    }
}

/// Absolute `sqlite://` URL for a bare path or any `sqlite:` spelling.
fn normalize_sqlite_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw == MEMORY_DB_URL || raw.starts_with("sqlite://") {
        return raw.to_string();
    }

    let path = Path::new(raw.strip_prefix("sqlite:").unwrap_or(raw));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    format!("sqlite://{}", absolute.display())
}

/// Database file behind a normalized URL; `None` for the in-memory database.
fn sqlite_file_path(db_url: &str) -> Result<Option<PathBuf>, ArgsError> {
    if db_url == MEMORY_DB_URL {
        return Ok(None);
    }
    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };

    let rest = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    // Connection options such as `?mode=rwc` are not part of the path.
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    if path.is_empty() {
        return Err(invalid());
    }
    Ok(Some(PathBuf::from(path)))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn find_activity<'a>(
    catalog: &'a Catalog,
    grade: Option<GradeLevel>,
    name: &str,
) -> Result<&'a Activity, LookupError> {
    catalog
        .find(grade, name)
        .ok_or_else(|| LookupError::UnknownActivity {
            name: name.to_string(),
        })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: interactive menu when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Menu,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Menu,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = Catalog::bundled()?;
    tracing::debug!(activities = catalog.activities().len(), "catalog loaded");

    if cmd == Command::List {
        let mut out = std::io::stdout().lock();
        shell::render_catalog(&catalog, parsed.grade, &mut out)?;
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let progress = ProgressService::new(storage.progress.clone());
    let mut activities = ActivityLoopService::new(Clock::default_clock(), progress.clone());
    if let Some(seed) = parsed.seed {
        activities = activities.with_seed(seed);
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();

    match cmd {
        Command::List => Ok(()),
        Command::Menu => {
            shell::menu(&activities, &catalog, parsed.grade, &mut input, &mut out).await?;
            Ok(())
        }
        Command::Play => {
            let name = parsed.activity.as_deref().unwrap_or_default();
            let activity = find_activity(&catalog, parsed.grade, name)?;
            let exit = shell::play(&activities, activity, &mut input, &mut out).await?;
            tracing::debug!(activity = %activity.key(), ?exit, "play finished");
            Ok(())
        }
        Command::Progress => {
            let grades: Vec<GradeLevel> = match parsed.grade {
                Some(grade) => vec![grade],
                None => GradeLevel::ALL.to_vec(),
            };
            for grade in grades {
                let overview = progress.grade_overview(grade).await?;
                shell::render_overview(grade, &overview, &mut out)?;
            }
            Ok(())
        }
        Command::Reset => {
            let name = parsed.activity.as_deref().unwrap_or_default();
            let activity = find_activity(&catalog, parsed.grade, name)?;
            if !confirm(activity.key(), &mut input, &mut out)? {
                writeln!(out, "Nothing changed.")?;
                return Ok(());
            }
            let removed = progress.reset_activity(activity.key()).await?;
            writeln!(out, "Cleared {removed} completion(s) for {}.", activity.name())?;
            Ok(())
        }
    }
}

fn confirm(
    key: &ActivityKey,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    write!(out, "Reset all progress for {key}? [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

/// Create the progress database file (and its directory) so the first
/// launch starts from an empty store instead of a connection error.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = sqlite_file_path(db_url)? else {
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        tracing::info!(path = %path.display(), "created progress database");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
