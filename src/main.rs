use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use http01_relay::client::{ClientError, RelayClient, SetStatus};
use http01_relay::{CapacityPolicy, ChallengeRecord, RelayConfig, DEFAULT_ADMIN_PATH};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(version, about = "ACME http-01 challenge relay")]
struct Cli {
    /// Path of the token admin API; uploads go to `<path>upload`
    #[arg(long, env = "TOKEN_POST_PATH", default_value = DEFAULT_ADMIN_PATH, global = true)]
    token_post_path: String,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory receiving uploaded files [default: <dir of executable>/upload]
    #[arg(long, env = "UPLOAD_PATH")]
    upload_path: Option<PathBuf>,

    /// Host to listen on
    #[arg(long, env = "HOST", default_value = "localhost")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 4080)]
    port: u16,

    /// Maximum number of pending challenge tokens
    #[arg(long, env = "MAX_TOKENS", default_value_t = http01_relay::stores::DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Refuse new tokens once the limit is hit instead of only warning
    #[arg(long, env = "STRICT_CAPACITY")]
    strict_capacity: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a challenge from certbot's manual auth hook environment
    AuthHook {
        #[command(flatten)]
        relay: RelayArgs,
        #[arg(long, env = "CERTBOT_DOMAIN")]
        domain: String,
        #[arg(long, env = "CERTBOT_TOKEN")]
        token: String,
        #[arg(long, env = "CERTBOT_VALIDATION")]
        validation: String,
    },
    /// Remove a challenge from certbot's manual cleanup hook environment
    CleanupHook {
        #[command(flatten)]
        relay: RelayArgs,
        #[arg(long, env = "CERTBOT_DOMAIN")]
        domain: String,
    },
    /// Upload files into a domain's directory on the relay
    Upload {
        #[command(flatten)]
        relay: RelayArgs,
        #[arg(long)]
        domain: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RelayArgs {
    /// Base URL of the relay
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:4080")]
    relay_url: String,
}

impl RelayArgs {
    fn client(&self, admin_path: &str) -> Result<RelayClient, ClientError> {
        Ok(RelayClient::new(&self.relay_url)?.admin_path(admin_path))
    }
}

fn default_upload_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join("upload"))
}

async fn serve(admin_path: String, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let upload_path = match args.upload_path {
        Some(path) => path,
        None => default_upload_path()?,
    };
    let policy = if args.strict_capacity {
        CapacityPolicy::Strict
    } else {
        CapacityPolicy::Advisory
    };

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    log::info!("Open http://{}:{} in the browser", args.host, args.port);
    RelayConfig::new(upload_path)
        .admin_path(admin_path)
        .max_tokens(args.max_tokens)
        .capacity_policy(policy)
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            log::info!("shutting down");
        })
        .await?;
    Ok(())
}

/// Fails the auth hook on 507 so certbot stops before asking the CA to
/// validate a record the relay may not hold.
fn ensure_stored(domain: &str, status: SetStatus) -> Result<(), Box<dyn std::error::Error>> {
    match status {
        SetStatus::Stored => Ok(()),
        SetStatus::OverCapacity => Err(format!(
            "relay is over capacity, token for {} may not have been stored",
            domain
        )
        .into()),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let admin_path = cli.token_post_path;
    match cli.command {
        None => serve(admin_path, cli.serve).await,
        Some(Command::AuthHook {
            relay,
            domain,
            token,
            validation,
        }) => {
            let record = ChallengeRecord::new(domain, token, validation);
            let status = relay.client(&admin_path)?.set(&record).await?;
            ensure_stored(&record.domain, status)?;
            log::info!("Set token for {}", record.domain);
            Ok(())
        }
        Some(Command::CleanupHook { relay, domain }) => {
            relay.client(&admin_path)?.delete(&domain).await?;
            log::info!("Deleted token for {}", domain);
            Ok(())
        }
        Some(Command::Upload {
            relay,
            domain,
            files,
        }) => {
            relay
                .client(&admin_path)?
                .upload_paths(&domain, &files)
                .await?;
            log::info!("Uploaded {} file(s) for {}", files.len(), domain);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("failed to initialize logger: {}", e);
    }

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
