//! CLI entry point for `filemailer`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use filemailer::archive::builder::ArchiveBuilder;
use filemailer::archive::{reader, selector};
use filemailer::config::{self, Config};
use filemailer::i18n;
use filemailer::mail::dispatch::Dispatcher;
use filemailer::model::archive::BuiltArchive;
use filemailer::model::dispatch::{DispatchOutcome, DispatchRequest};

#[derive(Parser)]
#[command(name = "filemailer", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (overrides $FILEMAILER_CONFIG)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Language (en, es). Defaults to system locale.
    #[arg(long, global = true, value_name = "LANG")]
    lang: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the archive and mail it to a recipient
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the archive without sending it
    Build {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the entries of an archive (defaults to the configured archive)
    Inspect {
        path: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the rendered message body
    Render {
        /// Recipient address
        #[arg(long)]
        to: String,
    },
    /// Encode text as base64
    Encode {
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode base64 text
    Decode {
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file location (or --config path)
        #[arg(long)]
        write: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Value following `flag` in the raw args, as `--flag value` or `--flag=value`.
fn raw_arg(args: &[String], long: &str, short: Option<&str>) -> Option<String> {
    let prefix = format!("{long}=");
    for i in 0..args.len() {
        if args[i] == long || short.is_some_and(|s| args[i] == s) {
            return args.get(i + 1).cloned();
        }
        if let Some(value) = args[i].strip_prefix(&prefix) {
            return Some(value.to_string());
        }
    }
    None
}

/// Detect language before clap processes --help.
///
/// Order: `--lang`, `general.lang` of the config file, system locale.
fn detect_lang_early() -> i18n::Lang {
    let args: Vec<String> = std::env::args().collect();
    if let Some(lang) = raw_arg(&args, "--lang", None).and_then(|c| i18n::Lang::from_code(&c)) {
        return lang;
    }

    let config_path = raw_arg(&args, "--config", Some("-c"))
        .map(PathBuf::from)
        .or_else(config::config_file_path);
    if let Some(lang) = config_path
        .filter(|p| p.exists())
        .and_then(|p| config::load_config_from(&p).ok())
        .and_then(|c| c.general.lang)
        .and_then(|c| i18n::Lang::from_code(&c))
    {
        return lang;
    }

    i18n::detect_system_lang()
}

/// Build a localized clap Command using i18n strings.
fn build_localized_command() -> clap::Command {
    let mut cmd = Cli::command();
    cmd = cmd
        .about(i18n::app_about())
        .long_about(i18n::app_long_about())
        .after_help(i18n::app_after_help());

    let subcommands: Vec<clap::Command> = cmd
        .get_subcommands()
        .map(|sub| {
            let mut s = sub.clone();
            match s.get_name() {
                "send" => { s = s.about(i18n::help_cmd_send()); }
                "build" => { s = s.about(i18n::help_cmd_build()); }
                "inspect" => { s = s.about(i18n::help_cmd_inspect()); }
                "render" => { s = s.about(i18n::help_cmd_render()); }
                "encode" => { s = s.about(i18n::help_cmd_encode()); }
                "decode" => { s = s.about(i18n::help_cmd_decode()); }
                "config" => { s = s.about(i18n::help_cmd_config()); }
                "completions" => { s = s.about(i18n::help_cmd_completions()); }
                "manpage" => { s = s.about(i18n::help_cmd_manpage()); }
                _ => {}
            }
            s
        })
        .collect();

    for sub in subcommands {
        cmd = cmd.mut_subcommand(sub.get_name(), |_| sub.clone());
    }

    cmd
}

fn main() -> anyhow::Result<ExitCode> {
    // Detect language BEFORE clap parsing so --help is localized
    i18n::set_lang(detect_lang_early());

    let cmd = build_localized_command();
    let matches = cmd.get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    // Commands that need no configuration
    match &cli.command {
        Commands::Encode { text, json } => {
            cmd_encode(text, *json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Decode { text, json } => {
            cmd_decode(text, *json)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Completions { shell } => {
            cmd_completions(*shell)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Manpage => {
            cmd_manpage()?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let config = config::load_config(cli.config.as_deref())?;

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Send { to, json } => return cmd_send(&config, &to, json),
        Commands::Build { json } => cmd_build(&config, json)?,
        Commands::Inspect { path, json } => cmd_inspect(&config, path.as_deref(), json)?,
        Commands::Render { to } => cmd_render(&config, &to)?,
        Commands::Config { write } => cmd_config(&config, cli.config.as_deref(), write)?,
        Commands::Encode { .. }
        | Commands::Decode { .. }
        | Commands::Completions { .. }
        | Commands::Manpage => {}
    }
    Ok(ExitCode::SUCCESS)
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "filemailer.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "filemailer", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn cmd_encode(text: &str, json: bool) -> anyhow::Result<()> {
    let pair = filemailer::codec::encode(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&pair)?);
    } else {
        println!("{}", pair.encoded);
    }
    Ok(())
}

fn cmd_decode(text: &str, json: bool) -> anyhow::Result<()> {
    let pair = filemailer::codec::decode(text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&pair)?);
    } else {
        println!("{}", pair.decoded);
    }
    Ok(())
}

/// Run one dispatch and report the outcome.
///
/// A failed dispatch is printed with the outcome and only sets the exit code.
fn cmd_send(config: &Config, to: &str, json: bool) -> anyhow::Result<ExitCode> {
    let dispatcher = Dispatcher::from_config(config)?;
    let start = Instant::now();
    let outcome = dispatcher.dispatch(&DispatchRequest::new(to));
    let elapsed = start.elapsed();

    if json {
        print_outcome_json(to, &outcome)?;
    } else {
        print_outcome_table(to, &outcome, elapsed);
    }

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Build the configured archive and print statistics.
fn cmd_build(config: &Config, json: bool) -> anyhow::Result<()> {
    let files = selector::select_files(&config.selection())?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}",
                i18n::msg_archiving()
            ))
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let built = ArchiveBuilder::new(config.archive.buffer_size).build(
        &config.archive_spec(),
        &files,
        Some(&|done, _total| pb.set_position(done as u64)),
    )?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&built)?);
    } else {
        print_archive_table(&built, elapsed);
    }
    Ok(())
}

/// List the entries of an archive.
fn cmd_inspect(config: &Config, path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.archive_spec().path());
    if !path.exists() {
        anyhow::bail!("{}: {}", i18n::err_file_not_found(), path.display());
    }

    let entries = reader::list_entries(&path)?;

    if json {
        let output = serde_json::json!({
            "archive": path.to_string_lossy(),
            "entry_count": entries.len(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};
    println!();
    println!("  {:<20} {}", i18n::msg_archive(), path.display());
    println!("  {:<20} {}", i18n::msg_entries(), entries.len());
    println!();
    if entries.is_empty() {
        return Ok(());
    }
    println!("  {:<50} {:>10} {:>10}", "Name", "Size", "Packed");
    println!("  {}", "-".repeat(72));
    for e in &entries {
        let name: String = e.name.chars().take(49).collect();
        println!(
            "  {:<50} {:>10} {:>10}",
            name,
            format_size(e.size, BINARY),
            format_size(e.compressed_size, BINARY)
        );
    }
    println!();
    Ok(())
}

/// Print the body a dispatch would send, without building or sending.
fn cmd_render(config: &Config, to: &str) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::from_config(config)?;
    let body = dispatcher.preview(&DispatchRequest::new(to))?;
    println!("{body}");
    Ok(())
}

/// Print (and optionally save) the effective configuration.
fn cmd_config(config: &Config, path: Option<&Path>, write: bool) -> anyhow::Result<()> {
    if write {
        let written = config::save_config(config, path)?;
        println!("  {} {}", i18n::msg_config_written(), written.display());
        return Ok(());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Print the result of a dispatch in a human-readable table.
fn print_outcome_table(to: &str, outcome: &DispatchOutcome, elapsed: std::time::Duration) {
    println!();
    println!("  {:<20} {}", i18n::msg_recipient(), to);
    match outcome {
        DispatchOutcome::Delivered { archive } => {
            println!("  {:<20} {}", i18n::msg_archive(), archive.path.display());
            println!("  {:<20} {}", i18n::msg_entries(), archive.entries.len());
            if archive.entries.is_empty() {
                println!("  {}", i18n::msg_no_files());
            }
            println!("  {:<20} {:.2?}", i18n::msg_elapsed(), elapsed);
            println!("  {}", i18n::msg_sent());
        }
        DispatchOutcome::Failed { stage, error } => {
            println!("  {}", i18n::err_dispatch_failed());
            println!("  {:<20} {} ({})", i18n::msg_failed_stage(), stage, error.kind());
            println!("  {error}");
        }
    }
    println!();
}

/// Print the result of a dispatch as JSON.
fn print_outcome_json(to: &str, outcome: &DispatchOutcome) -> anyhow::Result<()> {
    let output = match outcome {
        DispatchOutcome::Delivered { archive } => serde_json::json!({
            "success": true,
            "recipient": to,
            "archive": archive,
        }),
        DispatchOutcome::Failed { stage, error } => serde_json::json!({
            "success": false,
            "recipient": to,
            "stage": stage,
            "kind": error.kind(),
            "error": error.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print archive statistics in a human-readable table.
fn print_archive_table(built: &BuiltArchive, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<20} {}", i18n::msg_archive(), built.path.display());
    println!("  {:<20} {}", i18n::msg_entries(), built.entries.len());
    println!(
        "  {:<20} {}",
        i18n::msg_input_size(),
        format_size(built.input_bytes, BINARY)
    );
    println!(
        "  {:<20} {}",
        i18n::msg_archive_size(),
        format_size(built.size, BINARY)
    );
    println!("  {:<20} {:.2?}", i18n::msg_elapsed(), elapsed);
    if built.entries.is_empty() {
        println!("  {}", i18n::msg_no_files());
    }
    println!();
}
