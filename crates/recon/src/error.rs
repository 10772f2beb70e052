use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// A numeric cell could not be parsed.
    ValueParse { table: String, row: usize, column: String, value: String },
    /// The same SKU appears twice in the catalog.
    DuplicateSku(String),
    /// Malformed CSV (bad quoting, ragged rows, etc.).
    Csv(String),
    /// IO error while writing a table.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::ValueParse { table, row, column, value } => {
                write!(f, "table '{table}', row {row}: cannot parse {column} '{value}'")
            }
            Self::DuplicateSku(sku) => write!(f, "catalog: duplicate sku '{sku}'"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
