//! Error handling for rosdep
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`RosdepError`]) for callers that need to react to
//!    a specific failure, recovered from [`anyhow::Error`] with `downcast_ref`.
//! 2. **User-friendly messages** ([`ErrorContext`]) with suggestions for CLI users.
//!
//! # Error Categories
//!
//! - **Lookup**: [`RosdepError::ResourceNotFound`]
//! - **Data**: [`RosdepError::InvalidData`], [`RosdepError::CircularDependency`],
//!   [`RosdepError::InvalidCondition`], [`RosdepError::IndexParseError`]
//! - **Installation**: [`RosdepError::InstallFailed`]
//! - **Retrieval**: [`RosdepError::FetchFailed`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use rosdep::core::{RosdepError, user_friendly_error};
//!
//! fn lookup() -> anyhow::Result<()> {
//!     Err(RosdepError::ResourceNotFound { name: "roscpp".to_string() }.into())
//! }
//!
//! if let Err(e) = lookup() {
//!     user_friendly_error(e).display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for rosdep operations.
///
/// No operation in this crate retries on failure; every variant is surfaced to
/// the caller, which decides whether to retry.
#[derive(Error, Debug)]
pub enum RosdepError {
    /// A view or resource is absent from the index.
    ///
    /// Pure grouping containers are not reported through this variant: they
    /// legitimately have empty dependency closures.
    #[error("Resource '{name}' not found")]
    ResourceNotFound {
        /// Name of the view or resource that could not be found
        name: String,
    },

    /// Malformed installer arguments or index data
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// Description of what was malformed
        reason: String,
    },

    /// No backend executable could be located, or a backend invocation exited non-zero
    #[error("Installation with '{installer}' failed: {reason}")]
    InstallFailed {
        /// Installer key (e.g. "pip")
        installer: String,
        /// Reason for the failure
        reason: String,
    },

    /// The depends-on relation contains a cycle
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// The cycle, rendered as `a -> b -> a`
        chain: String,
    },

    /// A dependency condition could not be parsed
    #[error("Invalid condition '{expression}': {reason}")]
    InvalidCondition {
        /// The condition text as declared in the manifest
        expression: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A resource index file could not be parsed
    #[error("Invalid resource index in {file}")]
    IndexParseError {
        /// Path to the index file
        file: String,
        /// Parser diagnostic
        reason: String,
    },

    /// Remote content retrieval failed
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed {
        /// The requested URL
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catch-all for errors that have no dedicated variant
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for RosdepError {
    fn clone(&self) -> Self {
        match self {
            Self::ResourceNotFound {
                name,
            } => Self::ResourceNotFound {
                name: name.clone(),
            },
            Self::InvalidData {
                reason,
            } => Self::InvalidData {
                reason: reason.clone(),
            },
            Self::InstallFailed {
                installer,
                reason,
            } => Self::InstallFailed {
                installer: installer.clone(),
                reason: reason.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::InvalidCondition {
                expression,
                reason,
            } => Self::InvalidCondition {
                expression: expression.clone(),
                reason: reason.clone(),
            },
            Self::IndexParseError {
                file,
                reason,
            } => Self::IndexParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::FetchFailed {
                url,
                reason,
            } => Self::FetchFailed {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error is not Clone; keep kind and message
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: RosdepError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: RosdepError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(rosdep_error) = error.downcast_ref::<RosdepError>() {
        return create_error_context(rosdep_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(RosdepError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the settings or index file");
    }

    // Generic error: keep the full chain for diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(RosdepError::Other {
        message,
    })
}

fn create_error_context(error: RosdepError) -> ErrorContext {
    let (suggestion, details) = match &error {
        RosdepError::ResourceNotFound {
            name,
        } => (
            Some(format!("Check that '{name}' is listed by `rosdep resources` or `rosdep views`")),
            Some("Only indexed packages, stacks and the default view can be resolved"),
        ),
        RosdepError::InstallFailed {
            installer,
            ..
        } if installer == crate::constants::PIP_INSTALLER => (
            Some(
                "Install pip for the configured Python version (ROS_PYTHON_VERSION)".to_string(),
            ),
            Some("Failed installs are not retried; re-run the command once the cause is fixed"),
        ),
        RosdepError::CircularDependency {
            ..
        } => (
            Some("Remove one of the depends entries forming the cycle".to_string()),
            Some("The depends-on relation between resources must be acyclic"),
        ),
        RosdepError::InvalidCondition {
            ..
        } => (
            Some(
                "Conditions compare $VARIABLES and literals with ==, !=, <, <=, >, >= joined by and/or"
                    .to_string(),
            ),
            None,
        ),
        RosdepError::FetchFailed {
            ..
        } => (
            Some("Check the URL and, for private repositories, set API_TOKEN_GITHUB".to_string()),
            None,
        ),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
