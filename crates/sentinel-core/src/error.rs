use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("no contract has been analyzed in this session yet; analyze a document before asking questions")]
    NotReady,

    #[error("rule catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("statutory corpus error: {0}")]
    Corpus(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems with the document text itself. Fatal to the request, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("the document contains no readable text")]
    Empty,

    #[error("the document is too short to analyze ({chars} characters, at least {min} required)")]
    TooShort { chars: usize, min: usize },
}

/// Raised while loading a catalog, never during analysis.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("rule '{type_id}' has an invalid pattern: {source}")]
    Pattern {
        type_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{type_id}' has risk score {score}, expected 0-10")]
    ScoreOutOfRange { type_id: String, score: u8 },

    #[error("rule '{0}' is declared more than once")]
    DuplicateRule(String),

    #[error("rule '{0}' has no keywords or patterns")]
    NoTriggers(String),

    #[error("catalog declares no rules")]
    Empty,
}

pub type Result<T, E = SentinelError> = std::result::Result<T, E>;
