use clap::{Parser, Subcommand};
use lexdesk_core::config::DEFAULT_CONFIG_FILE;
use lexdesk_core::{LogFormat, ObservabilityConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "lexdesk", version, about = "Lexdesk legal practice console")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web console and serve it until Ctrl-C.
    Serve {
        /// Override `dashboard.port`
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Apply database migrations.
    Migrate,

    /// Validate the configuration and print the resolved settings.
    Check {
        /// Print the resolved settings as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// User management
    User {
        #[command(subcommand)]
        cmd: UserCommand,
    },

    /// Write a starter configuration file.
    Init {
        /// Overwrite the file if it already exists
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user that can sign in to the console.
    Add {
        #[arg(long)]
        email: String,

        #[arg(long, env = "LEXDESK_USER_PASSWORD")]
        password: String,

        /// admin, lawyer or assistant
        #[arg(long, default_value = "assistant")]
        role: String,

        #[arg(long = "first-name")]
        first_name: Option<String>,

        #[arg(long = "last-name")]
        last_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Init { force } => commands::init::run(&cli.config, force),
        Command::Serve { port } => {
            let mut config = commands::load_config(&cli.config)?;
            init_tracing(&config.observability);
            if let Some(port) = port {
                config.dashboard.port = port;
            }
            commands::serve::run(config).await
        }
        Command::Migrate => {
            let config = commands::load_config(&cli.config)?;
            init_tracing(&config.observability);
            commands::migrate::run(&config).await
        }
        Command::Check { json } => commands::check::run(&cli.config, json),
        Command::User { cmd } => match cmd {
            UserCommand::Add {
                email,
                password,
                role,
                first_name,
                last_name,
            } => {
                let config = commands::load_config(&cli.config)?;
                init_tracing(&config.observability);
                let user = commands::user::NewAccount {
                    email,
                    password,
                    role,
                    first_name,
                    last_name,
                };
                commands::user::add(&config, user).await
            }
        },
    }
}

/// `RUST_LOG` wins over `observability.log_level`.
fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match observability.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["lexdesk", "serve", "--port", "8080"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(cli.cmd, Command::Serve { port: Some(8080) }));
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["lexdesk", "migrate", "--config", "prod.yaml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("prod.yaml"));
    }

    #[test]
    fn test_user_add_defaults_to_assistant() {
        let cli = Cli::try_parse_from([
            "lexdesk",
            "user",
            "add",
            "--email",
            "ana@example.com",
            "--password",
            "senha123",
            "--first-name",
            "Ana",
        ])
        .unwrap();

        let Command::User {
            cmd: UserCommand::Add { role, first_name, last_name, .. },
        } = cli.cmd
        else {
            panic!("expected user add");
        };
        assert_eq!(role, "assistant");
        assert_eq!(first_name.as_deref(), Some("Ana"));
        assert!(last_name.is_none());
    }

    #[test]
    fn test_user_add_requires_email() {
        assert!(Cli::try_parse_from(["lexdesk", "user", "add", "--password", "x"]).is_err());
    }
}
