//! Calculated-field formulas.

use crate::error::DataError;
use crate::model::Formula;

/// A human-readable one-liner for traceability, e.g. `"1.5 × Max Design Pressure"`.
pub fn describe(formula: &Formula) -> String {
    match formula {
        Formula::DesignPressureTimes { factor } => format!("{factor} × Max Design Pressure"),
    }
}

/// Evaluate a `CALCULATED` field's formula against the piping-class row's
/// design pressure. `design_pressure_max` is `None` when the class has no
/// tabulated value (design-pressure-less class C rows).
pub fn evaluate(
    field_name: &str,
    formula: &Formula,
    design_pressure_max: Option<f64>,
) -> Result<String, DataError> {
    match formula {
        Formula::DesignPressureTimes { factor } => {
            let base = design_pressure_max.ok_or_else(|| DataError::MissingOperand {
                field: field_name.to_string(),
                detail: "designPressureMax is absent for this piping class".to_string(),
            })?;
            Ok(format!("{:.1} barg", base * factor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_hydrotest_shell_at_one_point_five() {
        let result = evaluate("hydrotestShell", &Formula::DesignPressureTimes { factor: 1.5 }, Some(19.6)).unwrap();
        assert_eq!(result, "29.4 barg");
    }

    #[test]
    fn computes_hydrotest_closure_at_one_point_one_with_rounding() {
        let result = evaluate("hydrotestClosure", &Formula::DesignPressureTimes { factor: 1.1 }, Some(19.6)).unwrap();
        assert_eq!(result, "21.6 barg");
    }

    #[test]
    fn missing_design_pressure_is_a_data_error() {
        let err = evaluate("hydrotestShell", &Formula::DesignPressureTimes { factor: 1.5 }, None).unwrap_err();
        assert!(matches!(err, DataError::MissingOperand { .. }));
    }
}
