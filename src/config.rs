use std::fs;
use std::path::Path;

use log::debug;

use crate::error::AmortizationError;
use crate::terms::LoanTerms;

/// Reads loan terms from a JSON file.
///
/// Decimal fields accept either JSON strings or numbers; `method` defaults to
/// French and `contribution` may be omitted.
pub fn load_terms(path: impl AsRef<Path>) -> Result<LoanTerms, AmortizationError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!("loaded terms from {}", path.display());
    parse_terms(&contents)
}

pub fn parse_terms(json: &str) -> Result<LoanTerms, AmortizationError> {
    Ok(serde_json::from_str(json.trim())?)
}
