//! CSV writers for the result tables

use crate::error::Result;
use crate::impact::{summarize_by_sector, YearFilter};
use crate::scenario::ScenarioOutput;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const COHORT_DETAIL_FILE: &str = "cohort_detail.csv";
pub const INDUSTRY_YEAR_FILE: &str = "industry_year.csv";
pub const INDUSTRY_YEAR_TENURE_FILE: &str = "industry_year_tenure.csv";
pub const IMPACT_FILE: &str = "economic_impact.csv";
pub const SECTOR_SUMMARY_FILE: &str = "sector_summary.csv";

/// Serialize rows as CSV with a header line
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a CSV file, replacing it if present
pub fn write_csv<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_rows(std::io::BufWriter::new(file), rows)?;
    log::debug!("wrote {} rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}

/// Write every result table of a run into `dir`; returns the paths written
pub fn write_scenario_output(dir: &Path, output: &ScenarioOutput) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let sectors = summarize_by_sector(&output.impact, YearFilter::Horizon);
    let paths: Vec<PathBuf> = [
        COHORT_DETAIL_FILE,
        INDUSTRY_YEAR_FILE,
        INDUSTRY_YEAR_TENURE_FILE,
        IMPACT_FILE,
        SECTOR_SUMMARY_FILE,
    ]
    .iter()
    .map(|f| dir.join(f))
    .collect();

    write_csv(&paths[0], &output.cohort_rows)?;
    write_csv(&paths[1], &output.industry_year)?;
    write_csv(&paths[2], &output.industry_year_tenure)?;
    write_csv(&paths[3], &output.impact)?;
    write_csv(&paths[4], &sectors)?;

    log::info!("wrote {} result tables to {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::SectorImpactRow;

    #[test]
    fn test_header_and_rows() {
        let rows = vec![SectorImpactRow {
            sector: "Trade".into(),
            net_new_saving: 100.0,
            domestic_investable: 72.0,
            output_impact: 108.0,
            gva_impact: 32.4,
            jobs_impact: 0.5,
        }];
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &rows).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("sector,net_new_saving,domestic_investable,output_impact,gva_impact,jobs_impact")
        );
        assert_eq!(lines.next(), Some("Trade,100.0,72.0,108.0,32.4,0.5"));
    }

    #[test]
    fn test_cohort_id_and_tenure_render_as_text() {
        use crate::cohort::CohortId;
        use crate::workforce::Tenure;

        #[derive(Serialize)]
        struct Row {
            cohort: CohortId,
            tenure: Tenure,
        }

        let mut buffer = Vec::new();
        write_rows(
            &mut buffer,
            &[Row {
                cohort: CohortId::new(2025, 3),
                tenure: Tenure::from_years(3.5).unwrap(),
            }],
        )
        .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "cohort,tenure\n2025_3,3.5\n");
    }
}
