use std::path::Path;

use ingest::{InboundEvent, IngestStats};
use serde_json::Value;
use verdant_app::{RangeParams, Result};
use verdant_core::{
    Alert, Budget, BudgetInput, DailyRollup, EmissionRecord, GreenScore, HotspotEntry,
    IntensityEntry, ScoreTargets, TimeRange, WindowSummary,
};

use crate::{
    AlertsRequest, AppContext, BudgetDeleteRequest, BudgetPutRequest, DeletedResponse,
    GreenScoreRequest, HotspotsRequest, ImportRequest, IngestResponse, IntensityReplaceRequest,
    OkResponse, RangeRequest, RecordsRequest, SettingsResponse,
};

pub const DEFAULT_HOTSPOT_LIMIT: u32 = 10;
pub const DEFAULT_ALERT_LIMIT: u32 = 50;
pub const DEFAULT_RECORD_LIMIT: u32 = 100;

fn resolve_range(
    range: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<TimeRange> {
    verdant_app::resolve_range(&RangeParams { range, start, end })
}

pub fn health(ctx: &AppContext) -> Result<OkResponse> {
    let db = ctx.app_state.open_db()?;
    Ok(OkResponse { ok: db.ping()? })
}

pub fn ingest_usage(ctx: &AppContext, body: Value) -> Result<IngestResponse> {
    let event = InboundEvent::usage(body)?;
    let outcome = ctx.app_state.services.ingest.compute_and_persist(event)?;
    Ok(outcome.into())
}

pub fn ingest_events(ctx: &AppContext, body: Value) -> Result<IngestResponse> {
    let event = InboundEvent::telemetry(body)?;
    let outcome = ctx.app_state.services.ingest.compute_and_persist(event)?;
    Ok(outcome.into())
}

pub fn import_path(ctx: &AppContext, req: ImportRequest) -> Result<IngestStats> {
    ctx.app_state
        .services
        .ingest
        .import_path(Path::new(&req.path))
}

pub fn summary(ctx: &AppContext, req: RangeRequest) -> Result<WindowSummary> {
    let range = resolve_range(req.range, req.start, req.end)?;
    ctx.app_state.services.analytics.summarize(&range)
}

pub fn green_score(ctx: &AppContext, req: GreenScoreRequest) -> Result<GreenScore> {
    let range = resolve_range(req.range, req.start, req.end)?;
    let defaults = ScoreTargets::default();
    let targets = ScoreTargets {
        kg_per_tb: req.target_kg_per_tb.unwrap_or(defaults.kg_per_tb),
        freshness_hours: req
            .target_freshness_hours
            .unwrap_or(defaults.freshness_hours),
    };
    ctx.app_state
        .services
        .analytics
        .green_score(&range, targets)
}

pub fn hotspots(ctx: &AppContext, req: HotspotsRequest) -> Result<Vec<HotspotEntry>> {
    let range = resolve_range(req.range, req.start, req.end)?;
    let limit = req.limit.unwrap_or(DEFAULT_HOTSPOT_LIMIT);
    ctx.app_state.services.analytics.hotspots(&range, limit)
}

pub fn alerts(ctx: &AppContext, req: AlertsRequest) -> Result<Vec<Alert>> {
    let limit = req.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    ctx.app_state.services.analytics.alerts(limit)
}

pub fn records(ctx: &AppContext, req: RecordsRequest) -> Result<Vec<EmissionRecord>> {
    let range = resolve_range(req.range, req.start, req.end)?;
    let limit = req.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
    let offset = req.offset.unwrap_or(0);
    ctx.app_state
        .services
        .analytics
        .records(&range, limit, offset)
}

pub fn daily_rollup(ctx: &AppContext, req: RangeRequest) -> Result<Vec<DailyRollup>> {
    let range = resolve_range(req.range, req.start, req.end)?;
    ctx.app_state.services.analytics.daily_rollup(&range)
}

pub fn intensity_list(ctx: &AppContext) -> Result<Vec<IntensityEntry>> {
    ctx.app_state.services.reference.intensity_list()
}

pub fn intensity_replace(
    ctx: &AppContext,
    req: IntensityReplaceRequest,
) -> Result<Vec<IntensityEntry>> {
    ctx.app_state
        .services
        .reference
        .intensity_replace(&req.entries)
}

pub fn budgets_list(ctx: &AppContext) -> Result<Vec<Budget>> {
    ctx.app_state.services.reference.budgets_list()
}

pub fn budgets_put(ctx: &AppContext, req: BudgetPutRequest) -> Result<Budget> {
    ctx.app_state.services.reference.budgets_put(BudgetInput {
        source: req.source,
        run_id: req.run_id,
        budget_kg: req.budget_kg,
    })
}

pub fn budgets_delete(ctx: &AppContext, req: BudgetDeleteRequest) -> Result<DeletedResponse> {
    ctx.app_state.services.reference.budgets_delete(req.id)?;
    Ok(DeletedResponse { deleted: req.id })
}

pub fn settings_get(ctx: &AppContext) -> Result<SettingsResponse> {
    let settings = ctx.app_state.services.settings.get()?;
    Ok(SettingsResponse {
        settings,
        app_data_dir: ctx.app_data_dir.to_string_lossy().to_string(),
        intensity_defaults_path: ctx
            .app_state
            .config
            .intensity_defaults_path
            .to_string_lossy()
            .to_string(),
    })
}

