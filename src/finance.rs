//! General functions related to finance.
use crate::units::{Dimensionless, MoneyPerCapacity};

/// Calculates the capital recovery factor (CRF) for a given lifetime and interest rate.
///
/// The CRF is used to annualise capital costs over the lifetime of an asset:
///
/// ```text
/// CRF = r (1 + r)^n / ((1 + r)^n - 1)
/// ```
///
/// A zero lifetime yields zero and a zero rate yields `1 / n`.
pub fn capital_recovery_factor(lifetime: u32, interest_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if interest_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let exponent = i32::try_from(lifetime).unwrap_or(i32::MAX);
    let factor = (Dimensionless(1.0) + interest_rate).powi(exponent);
    (interest_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the annualised capital cost per unit of capacity
pub fn annual_capital_cost(
    capital_cost: MoneyPerCapacity,
    lifetime: u32,
    interest_rate: Dimensionless,
) -> MoneyPerCapacity {
    capital_cost * capital_recovery_factor(lifetime, interest_rate)
}
