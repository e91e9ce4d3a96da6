use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, get_config_dir, show_config};
use crate::mcp::{ToolContext, build_server};
use crate::toolchain::{ensure_build_path, maven};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load configuration")
}

/// Provision the build path, resolve the classpath and serve MCP on stdio
#[inline]
pub async fn serve_mcp(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    info!(
        "Starting java_test_mcp for workspace {}",
        config.workspace.workspace_path.display()
    );

    let artifacts = ensure_build_path(&config, false)
        .await
        .context("Failed to prepare the build path")?;
    info!("Using build path {}", artifacts.root().display());

    let additional_classpath = maven::additional_classpath(&config)
        .await
        .context("Failed to resolve the additional classpath")?;

    let context = ToolContext::new(Arc::new(config), additional_classpath);
    let server = Arc::new(
        build_server(&context)
            .await
            .context("Failed to create MCP server")?,
    );

    server.serve_stdio().await
}

/// Download the JUnit and JaCoCo jars into the build path
#[inline]
pub async fn run_setup(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let artifacts = ensure_build_path(&config, force)
        .await
        .context("Failed to provision the build path")?;

    let missing = artifacts.missing();
    if missing.is_empty() {
        eprintln!(
            "{} Build path ready at {}",
            style("✅").green(),
            style(artifacts.root().display()).cyan()
        );
    } else {
        eprintln!(
            "{} Build path {} is missing:",
            style("⚠️").yellow(),
            artifacts.root().display()
        );
        for path in missing {
            eprintln!("   • {}", path.display());
        }
        eprintln!("Run with --force to download them again.");
    }

    Ok(())
}

/// Print the effective configuration
#[inline]
pub fn print_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let shown_path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => Config::default_config_path().ok().filter(|path| path.exists()),
    };

    show_config(&config, shown_path.as_deref());
    if shown_path.is_none() {
        if let Ok(dir) = get_config_dir() {
            eprintln!();
            eprintln!(
                "No config file found; defaults apply. Create {} to override them.",
                style(dir.join("config.toml").display()).dim()
            );
        }
    }
    Ok(())
}

/// Print the classpath appended to every compile and test run
#[inline]
pub async fn print_classpath(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let classpath = maven::additional_classpath(&config)
        .await
        .context("Failed to resolve classpath")?;

    if classpath.is_empty() {
        eprintln!("No classpath configured (set DEFAULT_CLASSPATH_PATH or POM_XML_PATH).");
    } else {
        println!("{}", classpath);
    }
    Ok(())
}
