//! lca-tool - query and trigger content actions from the command line

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal, Read, Write};
use std::process::ExitCode;

use content_action::logging::{LoggingConfig, LoggingSystem};
use content_action::{Action, ContentActions, Settings};

#[derive(Parser, Debug)]
#[command(name = "lca-tool")]
#[command(about = "Query and trigger the applications that handle content", long_about = None)]
#[command(version)]
struct Cli {
    /// Arguments are files or file: uris
    #[arg(long, help_heading = "Modes")]
    file: bool,

    /// Arguments are semantic object uris
    #[arg(long, help_heading = "Modes")]
    tracker: bool,

    /// The argument is a uri, resolved by its scheme
    #[arg(long, help_heading = "Modes")]
    scheme: bool,

    /// Arguments form a single string
    #[arg(long, help_heading = "Modes")]
    string: bool,

    /// Print the applicable actions (the default action)
    #[arg(long, help_heading = "Actions")]
    print: bool,

    /// Trigger the named action
    #[arg(long, value_name = "ACTION", help_heading = "Actions")]
    trigger: Option<String>,

    /// Print the default action
    #[arg(long, help_heading = "Actions")]
    printdefault: bool,

    /// Trigger the default action
    #[arg(long, help_heading = "Actions")]
    triggerdefault: bool,

    /// Print the content types of the arguments
    #[arg(long, help_heading = "Actions")]
    printmimes: bool,

    /// Print the actions for a content type
    #[arg(long, value_name = "MIME")]
    actionsformime: Option<String>,

    /// Print the default application for a content type
    #[arg(long, value_name = "MIME")]
    mimedefault: Option<String>,

    /// Set the default application for a content type
    #[arg(long, num_args = 2, value_names = ["MIME", "APP"])]
    setmimedefault: Option<Vec<String>>,

    /// Remove the user default for a content type
    #[arg(long, value_name = "MIME")]
    resetmimedefault: Option<String>,

    /// Highlight standard input
    #[arg(long)]
    highlight: bool,

    /// Trigger a desktop entry with the arguments as parameters
    #[arg(long, value_name = "DESKTOP")]
    triggerdesktop: Option<String>,

    /// Print localized action names
    #[arg(long)]
    l10n: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Files, uris or words, depending on the mode
    #[arg(value_name = "ARGS")]
    args: Vec<String>,
}

/// Exit statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success = 0,
    InsufficientArgs = 1,
    BadArgs = 2,
    NotApplicable = 3,
    NoDefault = 4,
    EntryNotFound = 5,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    File,
    Tracker,
    Scheme,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Print,
    Trigger(String),
    PrintDefault,
    TriggerDefault,
    PrintMimes,
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().write_help(&mut io::stderr());
        return Outcome::InsufficientArgs.into();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                Outcome::BadArgs.into()
            } else {
                Outcome::Success.into()
            };
        }
    };

    match LoggingSystem::init(LoggingConfig::cli(cli.verbose)) {
        Ok(logging) => tracing::debug!(level = %logging.level(), "Logging initialized"),
        Err(e) => eprintln!("lca-tool: {}", e),
    }

    match run(&cli) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("lca-tool: {:#}", e);
            Outcome::BadArgs.into()
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let modeless = [
        cli.actionsformime.is_some(),
        cli.mimedefault.is_some(),
        cli.setmimedefault.is_some(),
        cli.resetmimedefault.is_some(),
        cli.highlight,
        cli.triggerdesktop.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    let modes = selected_modes(cli);
    let requests = selected_requests(cli);

    if modeless > 1 || (modeless == 1 && (!modes.is_empty() || !requests.is_empty())) {
        eprintln!("lca-tool: conflicting options");
        return Ok(Outcome::BadArgs);
    }

    let settings = Settings::from_env().context("Cannot load settings")?;
    let context = ContentActions::new(settings);

    if modeless == 1 {
        return run_modeless(cli, &context);
    }

    let mode = match modes.as_slice() {
        [mode] => *mode,
        [] => {
            eprintln!("lca-tool: a mode (--file, --tracker, --scheme or --string) is required");
            return Ok(Outcome::InsufficientArgs);
        }
        _ => {
            eprintln!("lca-tool: only one mode may be given");
            return Ok(Outcome::BadArgs);
        }
    };
    let request = match requests.as_slice() {
        [] => Request::Print,
        [request] => request.clone(),
        _ => {
            eprintln!("lca-tool: only one action may be given");
            return Ok(Outcome::BadArgs);
        }
    };

    if cli.args.is_empty() {
        eprintln!("lca-tool: no arguments");
        return Ok(Outcome::InsufficientArgs);
    }
    if mode == Mode::Scheme && cli.args.len() > 1 {
        eprintln!("lca-tool: --scheme takes a single uri");
        return Ok(Outcome::BadArgs);
    }

    run_mode(cli, &context, mode, request)
}

fn selected_modes(cli: &Cli) -> Vec<Mode> {
    [
        (cli.file, Mode::File),
        (cli.tracker, Mode::Tracker),
        (cli.scheme, Mode::Scheme),
        (cli.string, Mode::Text),
    ]
    .into_iter()
    .filter_map(|(set, mode)| set.then_some(mode))
    .collect()
}

fn selected_requests(cli: &Cli) -> Vec<Request> {
    let mut requests = Vec::new();
    if cli.print {
        requests.push(Request::Print);
    }
    if let Some(name) = &cli.trigger {
        requests.push(Request::Trigger(name.clone()));
    }
    if cli.printdefault {
        requests.push(Request::PrintDefault);
    }
    if cli.triggerdefault {
        requests.push(Request::TriggerDefault);
    }
    if cli.printmimes {
        requests.push(Request::PrintMimes);
    }
    requests
}

fn run_mode(cli: &Cli, context: &ContentActions, mode: Mode, request: Request) -> Result<Outcome> {
    let args = &cli.args;
    let text = args.join(" ");
    let mut out = io::stdout().lock();

    match request {
        Request::PrintMimes => {
            let mimes: Vec<String> = match mode {
                Mode::File => args
                    .iter()
                    .map(|file| context.mime_for_file(file).unwrap_or_default())
                    .collect(),
                Mode::Tracker => args
                    .iter()
                    .flat_map(|uri| context.mimes_for_tracker(uri))
                    .collect(),
                Mode::Scheme => vec![context.mime_for_scheme(&args[0])],
                Mode::Text => context.mimes_for_string(&text),
            };
            for mime in mimes {
                writeln!(out, "{}", mime)?;
            }
            Ok(Outcome::Success)
        }
        Request::Print => {
            let actions = match mode {
                Mode::File => context.actions_for_files(args),
                Mode::Tracker => context.actions_for_tracker_uris(args),
                Mode::Scheme => context.actions_for_scheme(&args[0]),
                Mode::Text => context.actions_for_string(&text),
            };
            for action in &actions {
                print_action(&mut out, cli, context, action)?;
            }
            Ok(Outcome::Success)
        }
        Request::Trigger(name) => {
            let actions = match mode {
                Mode::File => context.actions_for_files(args),
                Mode::Tracker => context.actions_for_tracker_uris(args),
                Mode::Scheme => context.actions_for_scheme(&args[0]),
                Mode::Text => context.actions_for_string(&text),
            };
            let wanted = name.strip_suffix(".desktop").unwrap_or(&name);
            match actions.iter().find(|action| action.name() == wanted) {
                Some(action) if action.trigger() => Ok(Outcome::Success),
                Some(_) => Ok(Outcome::NotApplicable),
                None => {
                    eprintln!("lca-tool: {} is not applicable", name);
                    Ok(Outcome::NotApplicable)
                }
            }
        }
        Request::PrintDefault | Request::TriggerDefault => {
            let action = match mode {
                Mode::File => context.default_action_for_files(args),
                Mode::Tracker => context.default_action_for_tracker_uris(args),
                Mode::Scheme => context.default_action_for_scheme(&args[0]),
                Mode::Text => context.default_action_for_string(&text),
            };
            if !action.is_valid() {
                if request == Request::PrintDefault {
                    writeln!(out, "Invalid action")?;
                }
                return Ok(Outcome::NoDefault);
            }
            if request == Request::PrintDefault {
                print_action(&mut out, cli, context, &action)?;
                return Ok(Outcome::Success);
            }
            if action.trigger() {
                Ok(Outcome::Success)
            } else {
                Ok(Outcome::NotApplicable)
            }
        }
    }
}

fn run_modeless(cli: &Cli, context: &ContentActions) -> Result<Outcome> {
    let mut out = io::stdout().lock();

    if let Some(mime) = &cli.actionsformime {
        for action in context.actions_for_mime(mime) {
            print_action(&mut out, cli, context, &action)?;
        }
        return Ok(Outcome::Success);
    }

    if let Some(mime) = &cli.mimedefault {
        return match context.default_app_for_mime(mime) {
            Some(app) => {
                writeln!(out, "{}", app)?;
                Ok(Outcome::Success)
            }
            None => Ok(Outcome::NoDefault),
        };
    }

    if let Some(values) = &cli.setmimedefault {
        let [mime, app] = values.as_slice() else {
            return Ok(Outcome::InsufficientArgs);
        };
        context
            .set_mime_default(mime, app)
            .with_context(|| format!("Cannot set the default for {}", mime))?;
        return Ok(Outcome::Success);
    }

    if let Some(mime) = &cli.resetmimedefault {
        context
            .reset_mime_default(mime)
            .with_context(|| format!("Cannot reset the default for {}", mime))?;
        return Ok(Outcome::Success);
    }

    if cli.highlight {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Cannot read standard input")?;
        let colored = io::stdout().is_terminal();

        for m in context.highlight(&text) {
            let matched = text.get(m.start..m.end).unwrap_or_default();
            let names: Vec<&str> = m.actions.iter().map(Action::name).collect();
            let quoted = format!("'{}'", matched);
            if colored {
                writeln!(out, "{} {} {} {}", m.start, m.end, quoted.yellow().bold(), names.join(" "))?;
            } else {
                writeln!(out, "{} {} {} {}", m.start, m.end, quoted, names.join(" "))?;
            }
        }
        return Ok(Outcome::Success);
    }

    if let Some(desktop) = &cli.triggerdesktop {
        let Some(action) = context.launcher_action(desktop, &cli.args) else {
            eprintln!("lca-tool: no desktop entry {}", desktop);
            return Ok(Outcome::EntryNotFound);
        };
        return if action.trigger() {
            Ok(Outcome::Success)
        } else {
            Ok(Outcome::NotApplicable)
        };
    }

    Ok(Outcome::InsufficientArgs)
}

fn print_action(
    out: &mut impl Write,
    cli: &Cli,
    context: &ContentActions,
    action: &Action,
) -> io::Result<()> {
    if cli.l10n {
        let locale = context.settings().locale.as_deref().unwrap_or_default();
        writeln!(out, "{}\t{}", action.name(), action.localized_name(locale))
    } else {
        writeln!(out, "{}", action.name())
    }
}
