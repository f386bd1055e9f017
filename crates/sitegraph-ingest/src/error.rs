//! Error types for sitemap ingestion
//!
//! The taxonomy has two tiers. Everything in [`IngestError`] is fatal and
//! aborts the run through `Result`; no partial output is reported as
//! successful. Individual remote-file download failures are the one
//! recoverable case and never surface here: the loader logs a warning and
//! keeps the original field value (see `remote_files`).

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Whether an offending value sat directly in a field or inside an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Field,
    Array,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Field => write!(f, "field"),
            FieldKind::Array => write!(f, "array"),
        }
    }
}

/// Fatal errors raised during an ingestion run
#[derive(Debug, Error)]
pub enum IngestError {
    /// An option failed validation during resolution
    #[error("The option [{option}] is {problem}. The current value is: {value}")]
    Option {
        option: &'static str,
        problem: String,
        value: String,
    },

    /// A sitemap node failed shape validation
    #[error(
        "Encountered invalid node in sitemap. Property [{property}] is invalid or missing.\n\
         \n\
         \x20 Current value of [{property}]: {value}\n\
         \x20 The sitemap node: {node}"
    )]
    SitemapNode {
        property: &'static str,
        value: String,
        node: String,
    },

    /// The sitemap could not be fetched or decoded
    #[error("Problem loading sitemap from \"{route}\" route: {source}")]
    SitemapFetch {
        route: String,
        #[source]
        source: reqwest::Error,
    },

    /// A node's content could not be fetched or decoded
    #[error("Problem fetching node data from: {path}: {source}")]
    NodeFetch {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The global-data payload could not be fetched or decoded
    #[error("Problem fetching global site data from \"{route}\" route: {source}")]
    GlobalDataFetch {
        route: String,
        #[source]
        source: reqwest::Error,
    },

    /// A content payload was not a JSON object
    #[error("Expected an object payload from: {path}, got {type_name}")]
    NodePayload {
        path: String,
        type_name: &'static str,
    },

    /// A foreign-key field held something other than an id or array of ids
    #[error(
        "Encountered invalid type in foreign key {kind}:\n\
         \n\
         \x20 key: {key}\n\
         \x20 invalid value: {value}\n\
         \x20 invalid type: {type_name}"
    )]
    ForeignKey {
        kind: FieldKind,
        key: String,
        value: String,
        type_name: &'static str,
    },

    /// A remote-file field held something other than a URL or array of URLs
    #[error(
        "Encountered invalid type in remote file {kind}:\n\
         \n\
         \x20 key: {key}\n\
         \x20 invalid value: {value}\n\
         \x20 invalid type: {type_name}"
    )]
    RemoteFile {
        kind: FieldKind,
        key: String,
        value: String,
        type_name: &'static str,
    },

    /// A URL could not be parsed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be built or a request failed outside a
    /// route-specific context
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
