use thiserror::Error;

pub type Result<T> = std::result::Result<T, JavaTestError>;

#[derive(Error, Debug)]
pub enum JavaTestError {
    #[error("Toolchain error: {0}")]
    Toolchain(String),

    #[error("Workspace error: {0}")]
    Workspace(String),

    #[error("Command failed with exit code {code}:\n{stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("No Java files found to compile")]
    NoSourceFiles,

    #[error("Coverage report error: {0}")]
    Coverage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod java;
pub mod mcp;
pub mod process;
pub mod toolchain;
pub mod workspace;
