use super::error::BudgetError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total budget every user has to share out across their task lists
pub const BUDGET_CEILING: f64 = 100.0;

/// A budget share in `[0, 100]`
///
/// Negative, non-finite and over-ceiling values are rejected at construction,
/// so anything holding a `BudgetPercentage` can skip range checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BudgetPercentage(f64);

impl BudgetPercentage {
    pub const ZERO: BudgetPercentage = BudgetPercentage(0.0);

    pub fn new(value: f64) -> Result<Self, BudgetError> {
        if value.is_finite() && (0.0..=BUDGET_CEILING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(BudgetError::InvalidPercentage(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for BudgetPercentage {
    type Error = BudgetError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BudgetPercentage> for f64 {
    fn from(p: BudgetPercentage) -> Self {
        p.0
    }
}

impl fmt::Display for BudgetPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_range_bounds() {
        assert_eq!(BudgetPercentage::new(0.0).unwrap().value(), 0.0);
        assert_eq!(BudgetPercentage::new(100.0).unwrap().value(), 100.0);
        assert_eq!(BudgetPercentage::new(33.3).unwrap().to_string(), "33.3%");
    }

    #[test]
    fn test_rejects_out_of_range() {
        for bad in [-0.01, 100.0001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(BudgetPercentage::new(bad), Err(BudgetError::InvalidPercentage(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_validates() {
        let p: BudgetPercentage = serde_json::from_str("42.5").unwrap();
        assert_eq!(p.value(), 42.5);
        assert!(serde_json::from_str::<BudgetPercentage>("120").is_err());
        assert_eq!(serde_json::to_string(&p).unwrap(), "42.5");
    }
}
