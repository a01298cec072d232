//! Return and risk analysis

mod returns;
mod risk;

pub use returns::{build_return_series, MIN_PRICES};
pub use risk::{compute_risk_statistics, inverse_normal_cdf, DEFAULT_CONFIDENCE};
