/// Error type for scrape configuration and fetching.
#[derive(Debug)]
pub enum ScrapeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (no sites, duplicate names, etc.).
    ConfigValidation(String),
    /// A CSS selector failed to compile.
    Selector { site: String, selector: String, message: String },
    /// The price regex failed to compile.
    Regex { site: String, message: String },
    /// Network error (DNS, TLS, timeout, body read).
    Network(String),
    /// Non-success HTTP status.
    Http(u16, String),
    /// Headless browser launch or page rendering failed.
    Browser(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "sites config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "sites config validation error: {msg}"),
            Self::Selector { site, selector, message } => {
                write!(f, "site '{site}': invalid selector '{selector}': {message}")
            }
            Self::Regex { site, message } => {
                write!(f, "site '{site}': invalid price_regex: {message}")
            }
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http(code, url) => write!(f, "HTTP {code} for {url}"),
            Self::Browser(msg) => write!(f, "browser error: {msg}"),
        }
    }
}

impl std::error::Error for ScrapeError {}
