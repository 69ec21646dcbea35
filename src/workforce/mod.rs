//! Base workforce data, loading and forecasting

mod data;
mod forecast;
pub mod loader;

pub use data::{BaseWorkforceRow, Tenure};
pub use forecast::{forecast, EmployeeForecast, EmployeeForecastRow, SalaryForecast, SalaryForecastRow};
pub use loader::{load_base_workforce, load_base_workforce_from_reader};
