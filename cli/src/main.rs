mod commands;
mod glob;
mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webhdfs_core::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use webhdfs_core::{
    AppendOptions, ClientConfig, CreateOptions, ReadOptions, RedirectPolicy, WebHdfsClient,
    WebHdfsError,
};

#[derive(Parser, Debug)]
#[command(name = "webhdfs", version)]
#[command(about = "WebHDFS gateway client", long_about = None)]
struct Args {
    /// Gateway coordinator host
    #[arg(long, env = "WEBHDFS_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Gateway coordinator port
    #[arg(long, env = "WEBHDFS_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// User sent as user.name
    #[arg(long, env = "WEBHDFS_USER")]
    user: Option<String>,

    /// HTTP timeout seconds (0 disables)
    #[arg(long, env = "WEBHDFS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// How worker redirects are followed: substitute-host or verbatim
    #[arg(long, env = "WEBHDFS_REDIRECT", default_value_t = RedirectPolicy::SubstituteHost)]
    redirect: RedirectPolicy,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory; wildcards in the last component filter entries
    Ls {
        path: String,
        /// Long format
        #[arg(short = 'l')]
        long: bool,
    },

    /// Show file status
    Stat { path: String },

    /// Show file checksum
    Checksum { path: String },

    /// Show the user's home directory
    Home,

    /// Change permission (octal mode)
    Chmod {
        #[arg(value_parser = parse_mode)]
        mode: u32,
        path: String,
    },

    /// Change owner and/or group
    Chown {
        path: String,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Download a file
    Get {
        src: String,
        dest: PathBuf,
        #[arg(short, long)]
        offset: Option<u64>,
        #[arg(short, long)]
        length: Option<u64>,
        #[arg(short, long = "buffersize")]
        buffer_size: Option<u64>,
        /// Append to the local file instead of replacing it
        #[arg(short, long)]
        append: bool,
    },

    /// Upload a file
    Put {
        src: PathBuf,
        dest: String,
        #[arg(short, long)]
        overwrite: bool,
        #[arg(short = 'k', long = "blocksize")]
        block_size: Option<u64>,
        #[arg(short, long)]
        replication: Option<u64>,
        #[arg(short, long = "buffersize")]
        buffer_size: Option<u64>,
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<u32>,
    },

    /// Append a local file to a remote one
    Append {
        src: PathBuf,
        dest: String,
        #[arg(short, long = "buffersize")]
        buffer_size: Option<u64>,
    },

    /// Create a directory and its parents
    Mkdir {
        path: String,
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<u32>,
    },

    /// Rename a file or directory
    Mv { src: String, dest: String },

    /// Remove a file or directory
    Rm {
        path: String,
        #[arg(short, long)]
        recursive: bool,
    },
}

fn parse_mode(value: &str) -> Result<u32, String> {
    u32::from_str_radix(value, 8)
        .ok()
        .filter(|mode| *mode <= 0o1777)
        .ok_or_else(|| format!("invalid octal mode {value:?}"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn client_config(args: &Args) -> ClientConfig {
    ClientConfig {
        host: args.host.clone(),
        port: args.port,
        user: args.user.clone().filter(|u| !u.is_empty()),
        timeout_secs: Some(args.timeout_secs).filter(|secs| *secs > 0),
        redirect_policy: args.redirect,
    }
}

fn run(args: Args) -> Result<()> {
    let config = client_config(&args);
    tracing::debug!(?config, "client configuration");
    let client = WebHdfsClient::from_config(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.cmd {
        Command::Ls { path, long } => commands::ls(&client, &path, long, &mut out)?,
        Command::Stat { path } => commands::stat(&client, &path, &mut out)?,
        Command::Checksum { path } => commands::checksum(&client, &path, &mut out)?,
        Command::Home => commands::home(&client, &mut out)?,
        Command::Chmod { mode, path } => commands::chmod(&client, mode, &path)?,
        Command::Chown { path, user, group } => {
            commands::chown(&client, &path, user.as_deref(), group.as_deref())?
        }
        Command::Get {
            src,
            dest,
            offset,
            length,
            buffer_size,
            append,
        } => {
            let options = ReadOptions {
                offset,
                length,
                buffer_size,
            };
            commands::get(&client, &src, &dest, &options, append)?
        }
        Command::Put {
            src,
            dest,
            overwrite,
            block_size,
            replication,
            buffer_size,
            mode,
        } => {
            let options = CreateOptions {
                overwrite,
                block_size,
                replication,
                permission: mode,
                buffer_size,
            };
            commands::put(&client, &src, &dest, &options)?
        }
        Command::Append {
            src,
            dest,
            buffer_size,
        } => commands::append(&client, &src, &dest, &AppendOptions { buffer_size })?,
        Command::Mkdir { path, mode } => commands::mkdir(&client, &path, mode)?,
        Command::Mv { src, dest } => commands::mv(&client, &src, &dest)?,
        Command::Rm { path, recursive } => commands::rm(&client, &path, recursive)?,
    }
    out.flush()?;
    Ok(())
}

/// User-facing text for a failed command.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<WebHdfsError>() {
        Some(WebHdfsError::Connection { source, hop, .. }) => {
            let mut message = format!("cannot connect - {source}");
            if *hop == 2 {
                message.push_str(" (the operation may be partially applied; stat before retrying)");
            }
            message
        }
        Some(e) if e.maybe_partially_applied() => {
            format!("{e} (the operation may be partially applied; stat before retrying)")
        }
        _ => format!("{err:#}"),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", describe(&err));
            ExitCode::FAILURE
        }
    }
}
