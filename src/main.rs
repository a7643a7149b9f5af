use clap::{Parser, Subcommand};

use tutor_gateway::auth::AuthService;
use tutor_gateway::config::Settings;
use tutor_gateway::logging::{init_logging, LoggingConfig};
use tutor_gateway::server;

#[derive(Parser)]
#[command(name = "tutor-gateway", about = "OpenAI-compatible AI English tutor gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address, overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Issue an HS256 bearer token for testing
    Token {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::from_env();

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            init_logging(LoggingConfig {
                level: settings.log_level.clone(),
                colorize: true,
            });
            server::startup(settings).await
        }
        Command::Token {
            user_id,
            username,
            email,
            ttl_hours,
        } => {
            let auth = AuthService::new(&settings);
            let token = auth.create_token(&user_id, &username, &email, ttl_hours)?;
            println!("{token}");
            Ok(())
        }
    }
}
