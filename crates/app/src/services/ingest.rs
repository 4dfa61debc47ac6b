use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use verdant_core::{
    BudgetBreach, CarbonModel, NewEmissionRecord, Severity, UsageRecord, evaluate_budget,
    resolve_budget,
};
use verdant_db::{Db, DbError};

use crate::config::{AlertDelivery, RollupMode};
use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};
use ingest::{InboundEvent, IngestStats, ScanOutput, ScannedEvent};

/// Budget breach raised for an ingested workload. `id` is absent when a
/// best-effort alert could not be stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAlert {
    pub id: Option<i64>,
    pub severity: Severity,
    pub budget_kg: f64,
    pub actual_kg: f64,
    pub overage_kg: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    pub id: i64,
    pub est_kwh: f64,
    pub est_co2e_kg: f64,
    pub intensity_used: f64,
    pub alert: Option<IngestAlert>,
}

#[derive(Clone)]
pub struct IngestService {
    config: SharedConfig,
}

impl IngestService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.config)
    }

    /// Normalizes, estimates and stores one event, then evaluates its budget.
    pub fn compute_and_persist(&self, event: InboundEvent) -> Result<IngestOutcome> {
        let usage = ingest::normalize(event)?;
        let mut db = self.db()?;
        let day = utc_day(&usage);
        let outcome = self.persist(&mut db, usage, None)?;
        self.refresh_rollups(&db, vec![day]);
        Ok(outcome)
    }

    /// Imports NDJSON exports from a file or directory tree. Lines already
    /// imported are skipped by content key.
    pub fn import_path(&self, path: &Path) -> Result<IngestStats> {
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "import path {} not found",
                path.display()
            )));
        }
        let ScanOutput { events, mut stats } = ingest::scan_exports(path);
        let mut db = self.db()?;
        let mut days = BTreeSet::new();
        let result = self.persist_scanned(&mut db, events, &mut stats, &mut days);
        // Rows committed before a failure still need their days refreshed.
        self.refresh_rollups(&db, days.into_iter().collect());
        if let Err(err) = result {
            tracing::warn!(
                path = %path.display(),
                inserted = stats.events_inserted,
                error = %err,
                "import aborted"
            );
            return Err(err);
        }
        tracing::info!(
            path = %path.display(),
            files = stats.files_scanned,
            inserted = stats.events_inserted,
            duplicates = stats.duplicates_skipped,
            issues = stats.issues.len(),
            "import finished"
        );
        Ok(stats)
    }

    fn persist_scanned(
        &self,
        db: &mut Db,
        events: Vec<ScannedEvent>,
        stats: &mut IngestStats,
        days: &mut BTreeSet<String>,
    ) -> Result<()> {
        for event in events {
            if db.has_event_key(&event.event_key)? {
                stats.duplicates_skipped += 1;
                continue;
            }
            let day = utc_day(&event.record);
            let outcome = self.persist(db, event.record, Some(event.event_key))?;
            days.insert(day);
            stats.events_inserted += 1;
            if outcome.alert.is_some() {
                stats.alerts_raised += 1;
            }
        }
        Ok(())
    }

    fn persist(
        &self,
        db: &mut Db,
        usage: UsageRecord,
        event_key: Option<String>,
    ) -> Result<IngestOutcome> {
        let carbon = &self.config.carbon;
        let model = CarbonModel::new(carbon.default_intensity_g_per_kwh).with_pue(carbon.pue);
        let estimate = model.compute_emissions(&usage, &*db)?;
        let record = NewEmissionRecord {
            usage,
            estimate,
            event_key,
        };
        let (id, breach, alert_id) = match carbon.alert_delivery {
            AlertDelivery::Atomic => {
                let breach = self.budget_breach(db, &record)?;
                let ids = db.insert_emission_with_alert(&record, breach.as_ref())?;
                (ids.record_id, breach, ids.alert_id)
            }
            AlertDelivery::BestEffort => {
                let id = db.insert_emission_record(&record)?;
                let breach = match self.budget_breach(db, &record) {
                    Ok(breach) => breach,
                    Err(err) => {
                        tracing::warn!(record_id = id, error = %err, "budget lookup failed");
                        None
                    }
                };
                let alert_id = match &breach {
                    Some(breach) => match db.insert_alert(&breach.into_alert(id)) {
                        Ok(alert_id) => Some(alert_id),
                        Err(err) => {
                            tracing::warn!(record_id = id, error = %err, "budget alert not stored");
                            None
                        }
                    },
                    None => None,
                };
                (id, breach, alert_id)
            }
        };
        let source = &record.usage.source;
        let run_id = record.usage.run_id.as_deref();

        tracing::info!(
            record_id = id,
            source = %source,
            run_id = run_id.unwrap_or("-"),
            kwh = estimate.kwh,
            co2e_kg = estimate.co2e_kg,
            "emission recorded"
        );
        if let Some(breach) = &breach {
            tracing::warn!(
                record_id = id,
                source = %source,
                severity = breach.severity.as_str(),
                overage_kg = breach.overage_kg,
                "co2e budget exceeded"
            );
        }

        Ok(IngestOutcome {
            id,
            est_kwh: estimate.kwh,
            est_co2e_kg: estimate.co2e_kg,
            intensity_used: estimate.intensity_g_per_kwh,
            alert: breach.map(|breach| IngestAlert {
                id: alert_id,
                severity: breach.severity,
                budget_kg: breach.budget_kg,
                actual_kg: breach.actual_kg,
                overage_kg: breach.overage_kg,
                message: breach.message(),
            }),
        })
    }

    fn budget_breach(
        &self,
        db: &Db,
        record: &NewEmissionRecord,
    ) -> std::result::Result<Option<BudgetBreach>, DbError> {
        let budget_kg = resolve_budget(
            db,
            &record.usage.source,
            record.usage.run_id.as_deref(),
            self.config.carbon.default_budget_kg,
        )?;
        Ok(evaluate_budget(
            record.estimate.co2e_kg,
            budget_kg,
            record.estimate.intensity_g_per_kwh,
        ))
    }

    fn refresh_rollups(&self, db: &Db, days: Vec<String>) {
        if days.is_empty() {
            return;
        }
        match self.config.carbon.rollup_mode {
            RollupMode::Inline => refresh_days(db, &days),
            RollupMode::Background => {
                let db_path = self.config.db_path.clone();
                std::thread::spawn(move || match Db::open(&db_path) {
                    Ok(db) => refresh_days(&db, &days),
                    Err(err) => tracing::warn!(error = %err, "daily rollup skipped"),
                });
            }
        }
    }
}

fn refresh_days(db: &Db, days: &[String]) {
    for day in days {
        if let Err(err) = db.refresh_daily_rollup(day) {
            tracing::warn!(day = %day, error = %err, "daily rollup refresh failed");
        }
    }
}

fn utc_day(usage: &UsageRecord) -> String {
    usage.started_at.format("%Y-%m-%d").to_string()
}
