//! Load the base-year employee and salary table

use super::{BaseWorkforceRow, Tenure};
use crate::error::DataError;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;

pub const EMPLOYEE_SALARY_FILE: &str = "employee_salary.csv";

const TABLE: &str = "employee salary";

/// Raw CSV row matching the employee salary columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Industry")]
    industry: String,
    #[serde(rename = "Age_Bracket", alias = "Age_Brackets")]
    age_bracket: String,
    #[serde(rename = "Tenure")]
    tenure: f64,
    #[serde(rename = "Employees")]
    employees: f64,
    #[serde(rename = "Average Basic Salary", alias = "Average_Base_Salary")]
    average_base_salary: f64,
}

impl CsvRow {
    fn to_row(self) -> Result<BaseWorkforceRow, DataError> {
        Ok(BaseWorkforceRow {
            industry: self.industry,
            age_bracket: self.age_bracket,
            tenure: Tenure::from_years(self.tenure)?,
            employees: self.employees,
            average_base_salary: self.average_base_salary,
        })
    }
}

/// Each required column with its accepted spellings
const REQUIRED: [&[&str]; 5] = [
    &["Industry"],
    &["Age_Bracket", "Age_Brackets"],
    &["Tenure"],
    &["Employees"],
    &["Average Basic Salary", "Average_Base_Salary"],
];

/// Load the base workforce from a CSV file
pub fn load_base_workforce<P: AsRef<Path>>(path: P) -> Result<Vec<BaseWorkforceRow>, DataError> {
    let file = std::fs::File::open(path)?;
    load_base_workforce_from_reader(file)
}

/// Load the base workforce from any reader
pub fn load_base_workforce_from_reader<R: Read>(reader: R) -> Result<Vec<BaseWorkforceRow>, DataError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for names in REQUIRED {
        if !names.iter().any(|n| headers.iter().any(|h| h == *n)) {
            return Err(DataError::MissingColumn {
                table: TABLE.to_string(),
                column: names[0].to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        rows.push(row.to_row()?);
    }

    log::info!("loaded {} base workforce rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_reader() {
        let csv = "Industry , Age_Brackets, Tenure, Employees, Average Basic Salary\n\
                   Construction,30-40,0,1000,8000\n\
                   Construction,30-40,0.5,20,8100\n\
                   Construction,30-40,3,400,9500\n";
        let rows = load_base_workforce_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].age_bracket, "30-40");
        assert_eq!(rows[1].tenure, Tenure::from_years(0.5).unwrap());
        assert_eq!(rows[2].average_base_salary, 9500.0);
    }

    #[test]
    fn test_missing_salary_column() {
        let csv = "Industry,Age_Bracket,Tenure,Employees\nRetail,30-40,0,10\n";
        let err = load_base_workforce_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "Average Basic Salary"));
    }

    #[test]
    fn test_non_numeric_employees() {
        let csv = "Industry,Age_Bracket,Tenure,Employees,Average Basic Salary\nRetail,30-40,0,many,100\n";
        assert!(matches!(
            load_base_workforce_from_reader(csv.as_bytes()),
            Err(DataError::Csv(_))
        ));
    }

    #[test]
    fn test_fractional_tenure_rejected() {
        let csv = "Industry,Age_Bracket,Tenure,Employees,Average Basic Salary\nRetail,30-40,1.3,10,100\n";
        assert!(matches!(
            load_base_workforce_from_reader(csv.as_bytes()),
            Err(DataError::InvalidTenure { .. })
        ));
    }
}
