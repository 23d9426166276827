use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(niri_helpers::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(niri_helpers::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(niri_helpers::config::missing_field))]
    MissingField { field: String },

    #[error("Missing configuration section: {section}")]
    #[diagnostic(
        code(niri_helpers::config::missing_section),
        help("add a `{section} {{ ... }}` block to the configuration file")
    )]
    MissingSection { section: String },

    #[error("Undefined environment variable in {field}: {var}")]
    #[diagnostic(code(niri_helpers::config::undefined_variable))]
    UndefinedVariable { field: String, var: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
