use clap::{Parser, Subcommand};
use java_test_mcp::commands::{print_classpath, print_config, run_setup, serve_mcp};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "java_test_mcp")]
#[command(about = "MCP server for compiling Java, running JUnit tests and reporting JaCoCo coverage")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.java-test-mcp/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio (default)
    Serve,
    /// Download the JUnit and JaCoCo jars into the build path
    Setup {
        /// Download again even if the build path exists
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration
    Config,
    /// Print the classpath resolved from DEFAULT_CLASSPATH_PATH and POM_XML_PATH
    Classpath,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve_mcp(config_path).await?;
        }
        Commands::Setup { force } => {
            run_setup(config_path, force).await?;
        }
        Commands::Config => {
            print_config(config_path)?;
        }
        Commands::Classpath => {
            print_classpath(config_path).await?;
        }
    }

    Ok(())
}
