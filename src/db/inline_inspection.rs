//! Inline inspection lot queries.
//!
//! One row per lot. Lots are grouped by traceability code and lot letter;
//! the rolls of a lot live in the `inspection_data` JSON column.

use crate::services::mapping::Record;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::{parse_json_column, DbPool};

// ============================================================================
// Types
// ============================================================================

/// Inline inspection lot record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InlineInspectionLot {
    pub id: String,
    pub traceability_code: String,
    pub lot_letter: String,
    pub customer: Option<String>,
    pub production_no: Option<String>,
    pub prod_code: Option<String>,
    pub spec: Option<String>,
    pub production_date: Option<String>,
    pub emboss_type: Option<String>,
    pub printed: bool,
    pub non_printed: bool,
    pub ct: bool,
    pub year: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
    pub mc_no: Option<String>,
    pub shift: Option<String>,
    pub production_type: Option<String>,
    pub inspected_by: Option<String>,
    pub inspection_data: String,
    pub defect_names: String,
    pub accepted_rolls: i64,
    pub rejected_rolls: i64,
    pub rework_rolls: i64,
    pub kiv_rolls: i64,
    pub accepted_weight: f64,
    pub rejected_weight: f64,
    pub rework_weight: f64,
    pub kiv_weight: f64,
    pub created_at: String,
}

impl InlineInspectionLot {
    /// Rolls recorded for this lot, in entry order.
    pub fn rolls(&self) -> Vec<Record> {
        match parse_json_column(&self.inspection_data) {
            Value::Object(mut data) => match data.remove("rolls") {
                Some(Value::Array(rolls)) => rolls
                    .into_iter()
                    .filter_map(|roll| match roll {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Defect names keyed by roll position.
    pub fn defect_name_map(&self) -> Record {
        match parse_json_column(&self.defect_names) {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    /// Header fields as a mapper record.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        record.insert(
            "inspection_data".into(),
            parse_json_column(&self.inspection_data),
        );
        record.insert("defect_names".into(), Value::Object(self.defect_name_map()));
        Ok(record)
    }

    /// Total rolls across the four outcome counters.
    pub fn total_rolls(&self) -> i64 {
        self.accepted_rolls + self.rejected_rolls + self.rework_rolls + self.kiv_rolls
    }
}

/// Input for creating or replacing a lot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveInlineInspectionLot {
    pub traceability_code: String,
    pub lot_letter: String,
    pub customer: Option<String>,
    pub production_no: Option<String>,
    pub prod_code: Option<String>,
    pub spec: Option<String>,
    pub production_date: Option<String>,
    pub emboss_type: Option<String>,
    #[serde(default)]
    pub printed: bool,
    #[serde(default)]
    pub non_printed: bool,
    #[serde(default)]
    pub ct: bool,
    pub year: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
    pub mc_no: Option<String>,
    pub shift: Option<String>,
    pub production_type: Option<String>,
    pub inspected_by: Option<String>,
    #[serde(default)]
    pub inspection_data: Value,
    #[serde(default)]
    pub defect_names: Value,
    #[serde(default)]
    pub accepted_rolls: i64,
    #[serde(default)]
    pub rejected_rolls: i64,
    #[serde(default)]
    pub rework_rolls: i64,
    #[serde(default)]
    pub kiv_rolls: i64,
    #[serde(default)]
    pub accepted_weight: f64,
    #[serde(default)]
    pub rejected_weight: f64,
    #[serde(default)]
    pub rework_weight: f64,
    #[serde(default)]
    pub kiv_weight: f64,
}

impl SaveInlineInspectionLot {
    fn validate(&self) -> Result<()> {
        if self.traceability_code.trim().is_empty() {
            return Err(Error::Validation("traceability_code is required".into()));
        }
        if self.lot_letter.trim().is_empty() {
            return Err(Error::Validation("lot_letter is required".into()));
        }
        Ok(())
    }
}

/// Filters for lot selection. Empty filters match every lot.
#[derive(Debug, Clone, Default)]
pub struct LotFilter {
    pub traceability_code: Option<String>,
    pub lot_letter: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub machines: Vec<String>,
}

fn json_text(value: &Value) -> String {
    if value.is_null() {
        "{}".to_string()
    } else {
        value.to_string()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new lot.
pub async fn create_lot(pool: &DbPool, input: SaveInlineInspectionLot) -> Result<InlineInspectionLot> {
    input.validate()?;
    let id = uuid::Uuid::new_v4().to_string();
    write_lot(pool, &id, input, true).await
}

/// Replace an existing lot.
pub async fn update_lot(
    pool: &DbPool,
    id: &str,
    input: SaveInlineInspectionLot,
) -> Result<InlineInspectionLot> {
    input.validate()?;
    get_lot(pool, id).await?;
    write_lot(pool, id, input, false).await
}

async fn write_lot(
    pool: &DbPool,
    id: &str,
    input: SaveInlineInspectionLot,
    insert: bool,
) -> Result<InlineInspectionLot> {
    let sql = if insert {
        r#"
        INSERT INTO inline_inspection_lots (
            traceability_code, lot_letter, customer, production_no, prod_code, spec,
            production_date, emboss_type, printed, non_printed, ct, year, month, date,
            mc_no, shift, production_type, inspected_by, inspection_data, defect_names,
            accepted_rolls, rejected_rolls, rework_rolls, kiv_rolls,
            accepted_weight, rejected_weight, rework_weight, kiv_weight, id
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#
    } else {
        r#"
        UPDATE inline_inspection_lots SET
            traceability_code = ?, lot_letter = ?, customer = ?, production_no = ?,
            prod_code = ?, spec = ?, production_date = ?, emboss_type = ?, printed = ?,
            non_printed = ?, ct = ?, year = ?, month = ?, date = ?, mc_no = ?, shift = ?,
            production_type = ?, inspected_by = ?, inspection_data = ?, defect_names = ?,
            accepted_rolls = ?, rejected_rolls = ?, rework_rolls = ?, kiv_rolls = ?,
            accepted_weight = ?, rejected_weight = ?, rework_weight = ?, kiv_weight = ?
        WHERE id = ?
        RETURNING *
        "#
    };

    sqlx::query_as::<_, InlineInspectionLot>(sql)
        .bind(input.traceability_code.trim())
        .bind(input.lot_letter.trim())
        .bind(&input.customer)
        .bind(&input.production_no)
        .bind(&input.prod_code)
        .bind(&input.spec)
        .bind(&input.production_date)
        .bind(&input.emboss_type)
        .bind(input.printed)
        .bind(input.non_printed)
        .bind(input.ct)
        .bind(&input.year)
        .bind(&input.month)
        .bind(&input.date)
        .bind(&input.mc_no)
        .bind(&input.shift)
        .bind(&input.production_type)
        .bind(&input.inspected_by)
        .bind(json_text(&input.inspection_data))
        .bind(json_text(&input.defect_names))
        .bind(input.accepted_rolls)
        .bind(input.rejected_rolls)
        .bind(input.rework_rolls)
        .bind(input.kiv_rolls)
        .bind(input.accepted_weight)
        .bind(input.rejected_weight)
        .bind(input.rework_weight)
        .bind(input.kiv_weight)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Error::Database)
}

/// Get a lot by ID.
pub async fn get_lot(pool: &DbPool, id: &str) -> Result<InlineInspectionLot> {
    sqlx::query_as::<_, InlineInspectionLot>("SELECT * FROM inline_inspection_lots WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lot not found: {}", id)))
}

/// List lots matching a filter, in insertion order.
pub async fn list_lots(pool: &DbPool, filter: &LotFilter) -> Result<Vec<InlineInspectionLot>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM inline_inspection_lots WHERE 1 = 1");

    if let Some(code) = &filter.traceability_code {
        query.push(" AND traceability_code = ").push_bind(code.clone());
    }
    if let Some(letter) = &filter.lot_letter {
        query.push(" AND lot_letter = ").push_bind(letter.clone());
    }
    if let Some(from) = &filter.from_date {
        query.push(" AND date(production_date) >= date(").push_bind(from.clone()).push(")");
    }
    if let Some(to) = &filter.to_date {
        query.push(" AND date(production_date) <= date(").push_bind(to.clone()).push(")");
    }
    if !filter.machines.is_empty() {
        query.push(" AND mc_no IN (");
        let mut separated = query.separated(", ");
        for machine in &filter.machines {
            separated.push_bind(machine.clone());
        }
        separated.push_unseparated(")");
    }
    query.push(" ORDER BY created_at, rowid");

    query
        .build_query_as::<InlineInspectionLot>()
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

const KEY_BATCH: usize = 50;

/// Every lot whose (traceability code, lot letter) pair is in `keys`.
pub async fn list_lots_by_keys(
    pool: &DbPool,
    keys: &[(String, String)],
) -> Result<Vec<InlineInspectionLot>> {
    let mut lots = Vec::new();

    for batch in keys.chunks(KEY_BATCH) {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM inline_inspection_lots WHERE ");
        for (index, (code, letter)) in batch.iter().enumerate() {
            if index > 0 {
                query.push(" OR ");
            }
            query
                .push("(traceability_code = ")
                .push_bind(code.clone())
                .push(" AND lot_letter = ")
                .push_bind(letter.clone())
                .push(")");
        }
        query.push(" ORDER BY created_at, rowid");

        let rows = query
            .build_query_as::<InlineInspectionLot>()
            .fetch_all(pool)
            .await
            .map_err(Error::Database)?;
        lots.extend(rows);
    }

    Ok(lots)
}

/// Find another lot of the same traceability code with a header value set.
pub async fn find_header_source(
    pool: &DbPool,
    traceability_code: &str,
    exclude_id: &str,
) -> Result<Option<InlineInspectionLot>> {
    sqlx::query_as::<_, InlineInspectionLot>(
        r#"
        SELECT * FROM inline_inspection_lots
        WHERE traceability_code = ? AND id != ?
          AND (customer IS NOT NULL OR prod_code IS NOT NULL OR production_no IS NOT NULL)
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(traceability_code)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Delete a lot.
pub async fn delete_lot(pool: &DbPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM inline_inspection_lots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Lot not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, initialize_schema};
    use serde_json::json;

    async fn setup() -> DbPool {
        let pool = init_pool(":memory:").await.unwrap();
        initialize_schema(&pool).await.unwrap();
        pool
    }

    fn lot(code: &str, letter: &str, mc: &str, date: &str) -> SaveInlineInspectionLot {
        SaveInlineInspectionLot {
            traceability_code: code.into(),
            lot_letter: letter.into(),
            mc_no: Some(mc.into()),
            production_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_filter_by_machine_and_date() {
        let pool = setup().await;
        create_lot(&pool, lot("T1", "A", "1", "2024-03-01")).await.unwrap();
        create_lot(&pool, lot("T2", "A", "2", "2024-03-05")).await.unwrap();
        create_lot(&pool, lot("T3", "B", "1", "2024-04-01")).await.unwrap();

        let filter = LotFilter {
            from_date: Some("2024-03-01".into()),
            to_date: Some("2024-03-31".into()),
            machines: vec!["1".into()],
            ..Default::default()
        };
        let lots = list_lots(&pool, &filter).await.unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].traceability_code, "T1");
    }

    #[tokio::test]
    async fn test_rolls_parsed_from_inspection_data() {
        let pool = setup().await;
        let mut input = lot("T1", "A", "1", "2024-03-01");
        input.inspection_data = json!({"rolls": [{"lot_no": "3"}, {"lot_no": "3"}]});
        let created = create_lot(&pool, input).await.unwrap();
        assert_eq!(created.rolls().len(), 2);
        assert_eq!(created.rolls()[0]["lot_no"], "3");
    }

    #[tokio::test]
    async fn test_missing_traceability_code_rejected() {
        let pool = setup().await;
        let err = create_lot(&pool, lot(" ", "A", "1", "2024-03-01")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_by_keys_matches_pairs_only() {
        let pool = setup().await;
        create_lot(&pool, lot("T1", "A", "1", "2024-03-01")).await.unwrap();
        create_lot(&pool, lot("T1", "A", "1", "2024-03-02")).await.unwrap();
        create_lot(&pool, lot("T1", "B", "1", "2024-03-02")).await.unwrap();
        create_lot(&pool, lot("T2", "A", "2", "2024-03-02")).await.unwrap();

        let keys = vec![("T1".to_string(), "A".to_string()), ("T2".to_string(), "A".to_string())];
        let lots = list_lots_by_keys(&pool, &keys).await.unwrap();
        assert_eq!(lots.len(), 3);
        assert!(lots.iter().all(|l| l.lot_letter == "A"));
        assert!(list_lots_by_keys(&pool, &[]).await.unwrap().is_empty());
    }
}
