//! CSV loaders for the industry reference tables
//!
//! Loads the industry description and industry rate tables from data/

use crate::error::DataError;
use crate::table::SourceTable;
use std::path::Path;

/// Default path to the input data directory
pub const DEFAULT_DATA_PATH: &str = "data";

pub const INDUSTRY_DESCRIPTION_FILE: &str = "industry_description.csv";
pub const INDUSTRY_RATES_FILE: &str = "industry_rates.csv";

/// Load the industry description table (Industry, Age_Bracket, ...)
pub fn load_industry_descriptions(path: &Path) -> Result<SourceTable, DataError> {
    SourceTable::from_path("industry description", path)
}

/// Load the industry rate table (Industry, rate columns, ...)
pub fn load_industry_rates(path: &Path) -> Result<SourceTable, DataError> {
    SourceTable::from_path("industry rates", path)
}

/// Both reference tables loaded from one directory
#[derive(Debug, Clone)]
pub struct LoadedReferenceTables {
    pub industry_descriptions: SourceTable,
    pub industry_rates: SourceTable,
}

impl LoadedReferenceTables {
    /// Load both tables from a specific directory
    pub fn load_from(dir: &Path) -> Result<Self, DataError> {
        Ok(Self {
            industry_descriptions: load_industry_descriptions(&dir.join(INDUSTRY_DESCRIPTION_FILE))?,
            industry_rates: load_industry_rates(&dir.join(INDUSTRY_RATES_FILE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let result = LoadedReferenceTables::load_from(Path::new("no/such/dir"));
        assert!(matches!(result, Err(DataError::Io(_))));
    }
}
