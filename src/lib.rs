/*!
 * # Arnold - repository maintenance bot
 *
 * A Rust library for keeping a family of repositories healthy.
 *
 * ## Features
 *
 * - Broken link checking with a single, self-maintaining GitHub issue
 * - Crowdin translation synchronisation:
 *   - Regenerate source message catalogs and propose them as a pull request
 *   - Upload source files, creating the directory tree on the platform
 *   - Trigger a translation build
 *   - Pull approved translations back as one pull request per language
 * - Triviality filter that drops catalog changes touching only metadata
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Repository configuration, secrets and run settings
 * - `app_controller`: Main application controller
 * - `link_checker`: URL scanning, checking and issue reconciliation
 * - `translation`: The translation workflow:
 *   - `translation::messages`: Source message catalog regeneration
 *   - `translation::push`: Source upload
 *   - `translation::build`: Platform build
 *   - `translation::pull`: Per-language pull requests
 * - `providers`: Clients for external services:
 *   - `providers::crowdin`: Crowdin API client
 *   - `providers::github`: GitHub API client
 *   - `providers::mock`: In-memory fakes for tests
 * - `git`, `shell`: External command execution
 * - `file_utils`: File system operations
 * - `language_utils`: Platform to repository locale mapping
 * - `templates`: Issue and pull request text
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod git;
pub mod language_utils;
pub mod link_checker;
pub mod providers;
pub mod shell;
pub mod templates;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{RepositoryConfig, Secrets, Settings};
pub use app_controller::Controller;
pub use errors::{AppError, CommandError, ConfigError, HostError, PlatformError};
pub use link_checker::{LinkChecker, LinkReport};
pub use translation::TranslationContext;
