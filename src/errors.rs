/*!
 * Error types for the arnold application.
 *
 * This module contains custom error types for the different collaborators
 * arnold talks to (configuration files, external commands, the translation
 * platform and the source hosting API), using the thiserror crate for
 * ergonomic error definitions.
 */

use thiserror::Error;

/// Crowdin error code returned by `add-file` when the file already exists
pub const FILE_NEEDS_UPDATE_CODE: i64 = 5;

/// Crowdin error code returned by `add-directory` when the directory already exists
pub const DIRECTORY_EXISTS_CODE: i64 = 50;

/// Errors that can occur while loading configuration or secrets
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {path}: {message}")]
    Read {
        /// Path of the file
        path: String,
        /// Underlying I/O error message
        message: String,
    },

    /// The YAML document could not be parsed
    #[error("Invalid YAML in {source_name}: {message}")]
    InvalidYaml {
        /// Where the document came from (file path or repository)
        source_name: String,
        /// Parser message
        message: String,
    },

    /// A required secret is missing
    #[error("Secret '{key}' not found! Key description: {description}")]
    MissingSecret {
        /// Secret key
        key: String,
        /// What the secret is used for
        description: String,
    },

    /// The configuration is syntactically valid but semantically wrong
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur when running external commands
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command was given with no program
    #[error("Empty command")]
    Empty,

    /// The process could not be started at all
    #[error("Failed to execute '{command}': {message}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying I/O error message
        message: String,
    },

    /// The process ran but exited with a non-zero status
    #[error("Command '{command}' exited with code {code:?}: {stderr}")]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },
}

/// Errors that can occur when talking to the translation platform
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself, carrying the platform error code
    #[error("API responded with error {code}: {message} (HTTP {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Platform specific error code
        code: i64,
        /// Error message from the API
        message: String,
    },

    /// Non-success HTTP status without a recognisable error body
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Error while storing or unpacking a downloaded archive
    #[error("Archive error: {0}")]
    Archive(String),
}

impl PlatformError {
    /// Platform error code, if the API reported one
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether this is the "file already exists, use update-file" answer
    pub fn is_file_needs_update(&self) -> bool {
        self.code() == Some(FILE_NEEDS_UPDATE_CODE)
    }

    /// Whether this is the "directory already exists" answer
    pub fn is_directory_exists(&self) -> bool {
        self.code() == Some(DIRECTORY_EXISTS_CODE)
    }
}

/// Errors that can occur when talking to the source hosting API
#[derive(Error, Debug)]
pub enum HostError {
    /// Error from the GitHub client
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Requested repository does not exist
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Response content could not be decoded
    #[error("Failed to decode content: {0}")]
    Decode(String),

    /// Any other failure (used by fakes)
    #[error("Source host error: {0}")]
    Other(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration loading
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from an external command
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Error from the translation platform
    #[error("Translation platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Error from the source host
    #[error("Source host error: {0}")]
    Host(#[from] HostError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
