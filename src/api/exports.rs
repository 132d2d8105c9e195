//! Spreadsheet export routes.
//!
//! Routes:
//! - GET /export - Inline inspection report
//! - GET /export-{slug}-form - Film inspection form, one route per variant
//! - GET /api/download-prestore-excel/:form_id - Pre-store checklist
//! - GET /export-quality-alert - Quality alerts
//! - GET /api/export-mjr-record/:id - Maintenance job requisition
//! - GET/POST /api/export-machine-history-card - Machine history card
//! - GET /export-control-datapoints - Control datapoint register
//! - GET /export-production-defects[-advanced] - Defect analysis

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{
    db::{DatapointFilter, LotFilter, RequisitionFilter},
    error::{Error, Result},
    services::exports::{
        control_datapoints, film_inspection, inline_inspection, maintenance, prestore,
        production_defects::{self, DefectFilter},
        quality_alert, Variant, VARIANTS,
    },
    services::XlsxDownload,
    AppState,
};

/// Build export routes.
pub fn routes() -> Router<AppState> {
    let mut router = Router::new()
        .route("/export", get(export_inline_inspection))
        .route(
            "/api/download-prestore-excel/:form_id",
            get(export_prestore),
        )
        .route("/export-quality-alert", get(export_quality_alert))
        .route("/api/export-mjr-record/:id", get(export_mjr))
        .route(
            "/api/export-machine-history-card",
            get(export_history_card).post(export_filtered_history_card),
        )
        .route("/export-control-datapoints", get(export_control_datapoints))
        .route("/export-production-defects", get(export_production_defects))
        .route(
            "/export-production-defects-advanced",
            get(export_production_defects_advanced),
        );

    for variant in VARIANTS {
        router = router.route(
            &variant.route(),
            get(
                move |State(state): State<AppState>, Query(query): Query<FormQuery>| async move {
                    export_film_form(state, query, variant).await
                },
            ),
        );
    }

    router
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Empty query values count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Query Types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct FormQuery {
    pub form_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InlineQuery {
    pub traceability_code: Option<String>,
    pub lot_letter: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertQuery {
    pub alert_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCardQuery {
    pub equipment_name: Option<String>,
    pub equipment: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl HistoryCardQuery {
    pub fn into_filter(self) -> RequisitionFilter {
        RequisitionFilter {
            equipment_name: present(self.equipment_name),
            equipment_no: present(self.equipment),
            from_date: present(self.from_date),
            to_date: present(self.to_date),
        }
    }
}

/// Control datapoint filters. Blank values are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct DatapointQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
    pub control_type: Option<String>,
    pub machine: Option<String>,
    pub gcas: Option<String>,
    pub product: Option<String>,
}

impl DatapointQuery {
    pub fn into_filter(self) -> DatapointFilter {
        DatapointFilter {
            start_date: present(self.start_date),
            end_date: present(self.end_date),
            department: present(self.department),
            control_type: present(self.control_type),
            machine: present(self.machine),
            gcas: present(self.gcas),
            product: present(self.product),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DefectQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub production_type: Option<String>,
    pub machine: Option<String>,
    /// Comma separated. Advanced export only.
    pub machines: Option<String>,
    pub product: Option<String>,
    pub shift: Option<String>,
    pub defect: Option<String>,
}

impl DefectQuery {
    fn common(&self) -> DefectFilter {
        DefectFilter {
            from_date: present(self.from_date.clone()),
            to_date: present(self.to_date.clone()),
            production_type: present(self.production_type.clone()),
            product: present(self.product.clone()).filter(|p| p != "all"),
            shift: present(self.shift.clone()),
            ..Default::default()
        }
    }

    /// Single machine filter, no defect filter.
    pub fn into_filter(self) -> DefectFilter {
        DefectFilter {
            machines: present(self.machine.clone()).into_iter().collect(),
            ..self.common()
        }
    }

    /// Machine list and defect filter.
    pub fn into_advanced_filter(self) -> DefectFilter {
        let machines = self
            .machines
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        DefectFilter {
            machines,
            defect: present(self.defect.clone()),
            ..self.common()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn export_film_form(
    state: AppState,
    query: FormQuery,
    variant: &'static Variant,
) -> Result<XlsxDownload> {
    let form_id = present(query.form_id)
        .ok_or_else(|| Error::MissingParameter("form_id".into()))?;
    film_inspection::export_form(&state.db, &state.templates, variant, &form_id).await
}

/// GET /export
async fn export_inline_inspection(
    State(state): State<AppState>,
    Query(query): Query<InlineQuery>,
) -> Result<XlsxDownload> {
    let filter = LotFilter {
        traceability_code: present(query.traceability_code),
        lot_letter: present(query.lot_letter),
        ..Default::default()
    };
    inline_inspection::export_lots(&state.db, &state.templates, &filter, today()).await
}

/// GET /api/download-prestore-excel/:form_id
async fn export_prestore(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<XlsxDownload> {
    prestore::export_prestore(&state.db, &state.templates, &form_id).await
}

/// GET /export-quality-alert
async fn export_quality_alert(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Result<XlsxDownload> {
    let alert_id = match present(query.alert_id) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| Error::InvalidInput(format!("Invalid alert_id: {}", raw)))?,
        ),
        None => None,
    };
    quality_alert::export_alerts(&state.db, &state.templates, alert_id, today()).await
}

/// GET /api/export-mjr-record/:id
async fn export_mjr(State(state): State<AppState>, Path(id): Path<String>) -> Result<XlsxDownload> {
    maintenance::export_mjr(&state.db, &state.templates, &id, today()).await
}

/// GET /api/export-machine-history-card
async fn export_history_card(
    State(state): State<AppState>,
    Query(query): Query<HistoryCardQuery>,
) -> Result<XlsxDownload> {
    let filter = query.into_filter();
    maintenance::export_history_card_from_db(&state.db, &state.templates, &filter, today()).await
}

/// POST /api/export-machine-history-card
async fn export_filtered_history_card(
    State(state): State<AppState>,
    Json(request): Json<maintenance::HistoryCardRequest>,
) -> Result<XlsxDownload> {
    maintenance::export_history_card_from_rows(&state.templates, request, today()).await
}

/// GET /export-control-datapoints
async fn export_control_datapoints(
    State(state): State<AppState>,
    Query(query): Query<DatapointQuery>,
) -> Result<XlsxDownload> {
    let filter = query.into_filter();
    control_datapoints::export_datapoints(&state.db, &state.templates, &filter, today()).await
}

/// GET /export-production-defects
async fn export_production_defects(
    State(state): State<AppState>,
    Query(query): Query<DefectQuery>,
) -> Result<XlsxDownload> {
    let filter = query.into_filter();
    production_defects::export_defects(&state.db, &state.templates, &filter, today()).await
}

/// GET /export-production-defects-advanced
async fn export_production_defects_advanced(
    State(state): State<AppState>,
    Query(query): Query<DefectQuery>,
) -> Result<XlsxDownload> {
    let filter = query.into_advanced_filter();
    production_defects::export_defects(&state.db, &state.templates, &filter, today()).await
}
