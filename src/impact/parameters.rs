//! Economic parameter table: industry to sector mapping and sector multipliers

use crate::error::DataError;
use crate::table::normalize_key;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

pub const ECONOMIC_PARAMETERS_FILE: &str = "economic_parameters.csv";

const TABLE: &str = "economic parameters";

/// Multipliers converting domestic investable capital into impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorMultipliers {
    /// Type I output multiplier
    pub output_multiplier: f64,
    pub gva_to_output_ratio: f64,
    /// Jobs per AED 1M of output
    pub employment_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CsvRow {
    #[serde(rename = "Industry")]
    industry: String,
    #[serde(rename = "SectorMap", alias = "Sector")]
    sector: String,
    #[serde(rename = "Output_Multiplier_Type_I", default)]
    output_multiplier: Option<f64>,
    #[serde(rename = "GVA_to_Output_Ratio", default)]
    gva_to_output_ratio: Option<f64>,
    #[serde(
        rename = "Employment_Multiplier",
        alias = "Employment_Multiplier (jobs per AED 1M output)",
        default
    )]
    employment_multiplier: Option<f64>,
}

impl CsvRow {
    fn multipliers(&self) -> Option<SectorMultipliers> {
        Some(SectorMultipliers {
            output_multiplier: self.output_multiplier?,
            gva_to_output_ratio: self.gva_to_output_ratio?,
            employment_multiplier: self.employment_multiplier?,
        })
    }
}

/// Industry to sector mapping plus per-sector multipliers.
///
/// The first row of a sector with all three multipliers defines that
/// sector's multipliers; rows with blank multipliers only map their industry.
#[derive(Debug, Clone, Default)]
pub struct EconomicParameters {
    /// normalized industry -> sector name
    sectors: HashMap<String, String>,
    /// normalized sector -> multipliers
    multipliers: HashMap<String, SectorMultipliers>,
}

impl EconomicParameters {
    /// Map an industry to a sector with its multipliers
    pub fn insert(&mut self, industry: &str, sector: &str, multipliers: Option<SectorMultipliers>) {
        self.sectors
            .insert(normalize_key(industry), sector.trim().to_string());
        if let Some(m) = multipliers {
            self.multipliers.entry(normalize_key(sector)).or_insert(m);
        }
    }

    pub fn sector(&self, industry: &str) -> Option<&str> {
        self.sectors.get(&normalize_key(industry)).map(String::as_str)
    }

    /// Sector and multipliers for an industry
    pub fn lookup(&self, industry: &str) -> Result<(&str, SectorMultipliers), DataError> {
        let sector = self.sector(industry).ok_or_else(|| DataError::UnmappedIndustry {
            industry: industry.trim().to_string(),
        })?;
        let multipliers = self
            .multipliers
            .get(&normalize_key(sector))
            .copied()
            .ok_or_else(|| DataError::MissingSectorMultipliers {
                sector: sector.to_string(),
            })?;
        Ok((sector, multipliers))
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Load economic parameters from a CSV file
pub fn load_economic_parameters<P: AsRef<Path>>(path: P) -> Result<EconomicParameters, DataError> {
    let file = std::fs::File::open(path)?;
    load_economic_parameters_from_reader(file)
}

/// Load economic parameters from any reader
pub fn load_economic_parameters_from_reader<R: Read>(reader: R) -> Result<EconomicParameters, DataError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for names in [&["Industry"][..], &["SectorMap", "Sector"][..]] {
        if !names.iter().any(|n| headers.iter().any(|h| h == *n)) {
            return Err(DataError::MissingColumn {
                table: TABLE.to_string(),
                column: names[0].to_string(),
            });
        }
    }

    let mut params = EconomicParameters::default();
    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        if row.industry.is_empty() {
            continue;
        }
        params.insert(&row.industry, &row.sector, row.multipliers());
    }

    log::info!(
        "loaded economic parameters for {} industries, {} sectors",
        params.sectors.len(),
        params.multipliers.len()
    );
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Industry,SectorMap,Output_Multiplier_Type_I,GVA_to_Output_Ratio,Employment_Multiplier (jobs per AED 1M output)\n\
                       Construction,Construction & Real Estate,1.8,0.45,6.2\n\
                       Real Estate,Construction & Real Estate,,,\n\
                       Retail,Trade,1.5,0.55,9.0\n\
                       Mining,Extraction,,,\n";

    #[test]
    fn test_load_and_lookup() {
        let params = load_economic_parameters_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(params.len(), 4);

        let (sector, m) = params.lookup(" construction ").unwrap();
        assert_eq!(sector, "Construction & Real Estate");
        assert_eq!(m.output_multiplier, 1.8);
        assert_eq!(m.employment_multiplier, 6.2);

        // Blank multipliers inherit from the sector
        let (_, m) = params.lookup("Real Estate").unwrap();
        assert_eq!(m.gva_to_output_ratio, 0.45);
    }

    #[test]
    fn test_lookup_errors() {
        let params = load_economic_parameters_from_reader(CSV.as_bytes()).unwrap();
        assert!(matches!(
            params.lookup("Shipping"),
            Err(DataError::UnmappedIndustry { .. })
        ));
        assert!(matches!(
            params.lookup("Mining"),
            Err(DataError::MissingSectorMultipliers { .. })
        ));
    }

    #[test]
    fn test_missing_sector_column() {
        let csv = "Industry,Output_Multiplier_Type_I\nRetail,1.5\n";
        match load_economic_parameters_from_reader(csv.as_bytes()) {
            Err(DataError::MissingColumn { column, .. }) => assert_eq!(column, "SectorMap"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
