use std::collections::HashMap;
use std::convert::Infallible;

use serde::Serialize;
use serde_json::json;

use crate::{AlertKind, NewAlert, Severity, round6};

/// Emissions above this multiple of the budget raise a critical alert.
pub const CRITICAL_BUDGET_RATIO: f64 = 1.5;

/// Per-workload emissions ceilings in kg CO2e.
pub trait BudgetLookup {
    type Error;

    fn budget_kg(&self, source: &str, run_id: Option<&str>) -> Result<Option<f64>, Self::Error>;
}

/// In-memory budgets keyed by source and optional run.
///
/// An entry without a run applies to every run of that source.
#[derive(Debug, Clone, Default)]
pub struct BudgetTable {
    entries: HashMap<(String, Option<String>), f64>,
}

impl BudgetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(mut self, source: &str, run_id: Option<&str>, budget_kg: f64) -> Self {
        self.entries
            .insert((source.to_string(), run_id.map(str::to_string)), budget_kg);
        self
    }
}

impl BudgetLookup for BudgetTable {
    type Error = Infallible;

    fn budget_kg(&self, source: &str, run_id: Option<&str>) -> Result<Option<f64>, Infallible> {
        if let Some(run_id) = run_id {
            let key = (source.to_string(), Some(run_id.to_string()));
            if let Some(budget) = self.entries.get(&key) {
                return Ok(Some(*budget));
            }
        }
        Ok(self.entries.get(&(source.to_string(), None)).copied())
    }
}

/// Applicable budget: a stored override, else the process-wide default.
pub fn resolve_budget<L: BudgetLookup>(
    lookup: &L,
    source: &str,
    run_id: Option<&str>,
    default_budget_kg: Option<f64>,
) -> Result<Option<f64>, L::Error> {
    Ok(lookup.budget_kg(source, run_id)?.or(default_budget_kg))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetBreach {
    pub budget_kg: f64,
    pub actual_kg: f64,
    pub overage_kg: f64,
    pub severity: Severity,
    pub intensity_g_per_kwh: f64,
}

impl BudgetBreach {
    pub fn message(&self) -> String {
        format!(
            "CO2e budget exceeded: {} kg against a budget of {} kg (grid intensity {} g/kWh)",
            self.actual_kg, self.budget_kg, self.intensity_g_per_kwh
        )
    }

    pub fn into_alert(self, workload_id: i64) -> NewAlert {
        NewAlert {
            workload_id,
            kind: AlertKind::BudgetBreach,
            severity: self.severity,
            message: self.message(),
            meta: json!({
                "budgetKg": self.budget_kg,
                "actualKg": self.actual_kg,
                "overageKg": self.overage_kg,
                "gridIntensityGPerKwh": self.intensity_g_per_kwh,
            }),
        }
    }
}

/// Compares actual emissions to the resolved budget.
///
/// Returns `None` when there is no budget or the budget holds.
pub fn evaluate_budget(
    actual_kg: f64,
    budget_kg: Option<f64>,
    intensity_g_per_kwh: f64,
) -> Option<BudgetBreach> {
    let budget_kg = budget_kg?;
    if actual_kg <= budget_kg {
        return None;
    }
    let severity = if actual_kg > budget_kg * CRITICAL_BUDGET_RATIO {
        Severity::Critical
    } else {
        Severity::Warning
    };
    Some(BudgetBreach {
        budget_kg,
        actual_kg,
        overage_kg: round6(actual_kg - budget_kg),
        severity,
        intensity_g_per_kwh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breach_within_half_again_is_warning() {
        let breach = evaluate_budget(0.0297, Some(0.02), 450.0).expect("breach");
        assert_eq!(breach.severity, Severity::Warning);
        assert_eq!(breach.overage_kg, 0.0097);
        let alert = breach.into_alert(7);
        assert_eq!(alert.workload_id, 7);
        assert_eq!(alert.kind, AlertKind::BudgetBreach);
        assert!(alert.message.contains("0.0297"));
        assert!(alert.message.contains("0.02"));
        assert!(alert.message.contains("450"));
        assert_eq!(alert.meta["overageKg"], 0.0097);
    }

    #[test]
    fn breach_beyond_ratio_is_critical() {
        let breach = evaluate_budget(3.1, Some(2.0), 300.0).expect("breach");
        assert_eq!(breach.severity, Severity::Critical);
        assert_eq!(breach.overage_kg, 1.1);
    }

    #[test]
    fn no_alert_at_or_under_budget() {
        assert!(evaluate_budget(2.0, Some(2.0), 450.0).is_none());
        assert!(evaluate_budget(1.0, Some(2.0), 450.0).is_none());
    }

    #[test]
    fn no_alert_without_budget() {
        assert!(evaluate_budget(100.0, None, 450.0).is_none());
    }

    #[test]
    fn exactly_ratio_is_still_warning() {
        let breach = evaluate_budget(3.0, Some(2.0), 450.0).expect("breach");
        assert_eq!(breach.severity, Severity::Warning);
    }

    #[test]
    fn run_override_beats_source_budget_and_default() {
        let table = BudgetTable::new()
            .with_budget("spark", None, 5.0)
            .with_budget("spark", Some("nightly"), 1.0);
        let run = resolve_budget(&table, "spark", Some("nightly"), Some(9.0)).expect("budget");
        let other_run = resolve_budget(&table, "spark", Some("adhoc"), Some(9.0)).expect("budget");
        let other_source = resolve_budget(&table, "adf", None, Some(9.0)).expect("budget");
        let nothing = resolve_budget(&table, "adf", None, None).expect("budget");
        assert_eq!(run, Some(1.0));
        assert_eq!(other_run, Some(5.0));
        assert_eq!(other_source, Some(9.0));
        assert_eq!(nothing, None);
    }
}
