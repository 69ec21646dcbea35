//! Cohort identities and engine input assembly

mod attach;
mod template;

pub use attach::{attach, CohortYearInput};
pub use template::{generate_template, max_initial_tenure, CohortId, CohortTemplate, CohortTemplateRow};
