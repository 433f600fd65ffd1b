use crate::domain::COMMAND_SHOW;
use crate::infra::WalkPolicy;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Run(RunOptions),
}

/// One invocation covers both roles: if a primary already exists the
/// `command` is forwarded, otherwise this process becomes the daemon.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunOptions {
    pub command: Option<String>,
    pub port: Option<u16>,
    pub walk: WalkPolicy,
}

impl RunOptions {
    /// The command forwarded when a primary exists; "show" when none was
    /// given on the command line.
    pub fn forwarded_command(&self) -> &str {
        self.command.as_deref().unwrap_or(COMMAND_SHOW)
    }
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().skip(1).any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().skip(1).any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut command: Option<String> = None;
    let mut port: Option<u16> = None;
    let mut walk = WalkPolicy::default();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--port" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--port".to_string()))?;
                let parsed =
                    value
                        .parse::<u16>()
                        .map_err(|_| CliParseError::InvalidFlagValue {
                            flag: "--port".to_string(),
                            value: value.clone(),
                        })?;
                port = Some(parsed);
            }
            "--no-recurse" => {
                walk = WalkPolicy::DirectChildren;
            }
            other if other.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(other.to_string()));
            }
            positional => {
                if command.is_some() {
                    return Err(CliParseError::UnexpectedArgument(positional.to_string()));
                }
                command = Some(positional.to_string());
            }
        }
    }

    Ok(CliInvocation::Run(RunOptions {
        command,
        port,
        walk,
    }))
}

pub fn print_help() {
    println!("tapd - quick-launch daemon");
    println!();
    println!("Usage: tapd [OPTIONS] [COMMAND]");
    println!();
    println!("With no instance running, starts the daemon. With a running");
    println!("instance, forwards COMMAND to it (default: show) and exits.");
    println!("Reserved commands: show, hide, kill.");
    println!();
    println!("Options:");
    println!("  --port <PORT>   control port (default 18838)");
    println!("  --no-recurse    index only the direct entries of each PATH dir");
    println!("  -h, --help      print help");
    println!("  -V, --version   print version");
}

pub fn print_version() {
    println!("tapd {}", env!("CARGO_PKG_VERSION"));
}
