use console::style;
use geogate_core::GeogateError;
use std::fmt;

/// Error presentation with context and remediation steps
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a dataset without a CRS
pub fn missing_crs(subject: &str) -> CliError {
    CliError::new("Missing CRS")
        .with_context(format!(
            "No coordinate reference system is declared for {}.\n\nDistances cannot be interpreted without one, and geogate never guesses.",
            subject
        ))
        .with_suggestion("Add a .prj file to the Shapefile, or a \"crs\" member to the GeoJSON")
        .with_suggestion("Or pass the CRS explicitly: --assume-crs EPSG:32649")
        .with_suggestion("Or set assume_crs in geogate.toml / GEOGATE_ASSUME_CRS")
        .with_help("Run: geogate leakage --help")
}

/// Create error for splits in different CRSs
pub fn crs_mismatch(reference_crs: &str, query_crs: &str) -> CliError {
    CliError::new("CRS mismatch detected")
        .with_context(format!(
            "Training data uses {} but test data uses {}.\n\nNo distances were computed.",
            reference_crs, query_crs
        ))
        .with_suggestion("Reproject both splits to the same projected CRS")
        .with_suggestion("Check every dataset at once: geogate integrity <directory>")
        .with_help("Run: geogate integrity --help")
}

/// Create error for a label column that no feature carries
pub fn label_column_missing(column: &str, split: &str) -> CliError {
    CliError::new(format!("Label column '{}' not found", column))
        .with_context(format!("No feature in the {} split has a '{}' attribute.", split, column))
        .with_suggestion("Check the column name passed to --col")
        .with_suggestion("Column names are case-sensitive")
        .with_help("Run: geogate distribution --help")
}

/// Create error for an empty training split
pub fn empty_reference_set() -> CliError {
    CliError::new("Training split is empty")
        .with_context("The spatial index is built from the training split, which has no samples.")
        .with_suggestion("Check that --train points at the intended file")
        .with_help("Run: geogate leakage --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geogate.toml and GEOGATE_* environment variables")
        .with_help("Run: geogate config")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let Some(domain) = error.downcast_ref::<GeogateError>() else {
        let message = format!("{:#}", error);
        if message.contains("No such file or directory") {
            return CliError::new("File not found")
                .with_context(format!("Error: {}", message))
                .with_suggestion("Check the file path and try again");
        }
        return CliError::new(message);
    };

    match domain {
        GeogateError::MissingCrs { subject } => missing_crs(subject),
        GeogateError::CrsMismatch {
            reference_crs,
            query_crs,
        } => crs_mismatch(reference_crs, query_crs),
        GeogateError::LabelColumnMissing { column, split } => label_column_missing(column, split),
        GeogateError::EmptyReferenceSet => empty_reference_set(),
        GeogateError::InvalidThreshold { value } => CliError::new("Invalid buffer distance")
            .with_context(format!(
                "The buffer must be a finite, non-negative distance, got {}.",
                value
            ))
            .with_suggestion("Pass a non-negative value: --buffer 250"),
        GeogateError::ConfigInvalid { key, reason } => invalid_config(key, reason),
        GeogateError::UnsupportedFormat { path } => CliError::new("Unsupported format")
            .with_context(format!("No reader handles {}.", path))
            .with_suggestion("Use GeoJSON (.geojson, .json) or Shapefile (.shp) inputs"),
        _ => CliError::new(format!("{:#}", error)),
    }
}
