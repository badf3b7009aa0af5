//! Postgres-backed trade store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::common::errors::{EngineError, Result};
use crate::common::traits::TradeStore;
use crate::common::types::{Side, TradeEvent};
use crate::config::types::DatabaseConfig;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_activity (
    id              TEXT        NOT NULL,
    user_address    TEXT        NOT NULL,
    activity_type   TEXT        NOT NULL,
    condition_id    TEXT        NOT NULL,
    asset           TEXT        NOT NULL,
    side            TEXT,
    usdc_size       NUMERIC     NOT NULL,
    size            NUMERIC     NOT NULL DEFAULT 0,
    price           NUMERIC     NOT NULL,
    slug            TEXT,
    event_slug      TEXT,
    title           TEXT,
    outcome         TEXT,
    timestamp       BIGINT      NOT NULL,
    filtered        BOOLEAN     NOT NULL DEFAULT FALSE,
    executed_at     TIMESTAMPTZ,
    PRIMARY KEY (user_address, id)
)
"#;

const CREATE_PENDING_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS user_activity_pending_idx
    ON user_activity (user_address, timestamp)
    WHERE activity_type = 'TRADE' AND filtered = FALSE AND executed_at IS NULL
"#;

const SELECT_UNPROCESSED: &str = r#"
SELECT id, user_address, condition_id, asset, side, usdc_size, size, price,
       slug, event_slug, title, outcome, timestamp, filtered, executed_at
  FROM user_activity
 WHERE user_address = $1
   AND activity_type = 'TRADE'
   AND filtered = FALSE
   AND executed_at IS NULL
 ORDER BY timestamp, id
"#;

const MARK_EXECUTED: &str = r#"
UPDATE user_activity
   SET executed_at = $3
 WHERE user_address = $1 AND id = $2 AND executed_at IS NULL
"#;

/// Raw `user_activity` row
#[derive(Debug, sqlx::FromRow)]
struct TradeRow {
    id: String,
    user_address: String,
    condition_id: String,
    asset: String,
    side: Option<String>,
    usdc_size: Decimal,
    size: Decimal,
    price: Decimal,
    slug: Option<String>,
    event_slug: Option<String>,
    title: Option<String>,
    outcome: Option<String>,
    timestamp: i64,
    filtered: bool,
    executed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TradeRow> for TradeEvent {
    type Error = EngineError;

    fn try_from(row: TradeRow) -> Result<Self> {
        let side = match row.side.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Side>().map_err(|_| EngineError::InvalidTrade {
                id: row.id.clone(),
                reason: format!("unknown side {:?}", raw),
            })?),
        };
        if row.asset.is_empty() || row.condition_id.is_empty() {
            return Err(EngineError::InvalidTrade {
                id: row.id,
                reason: "missing asset or condition id".to_string(),
            });
        }

        Ok(TradeEvent {
            id: row.id,
            user_address: row.user_address,
            condition_id: row.condition_id,
            asset: row.asset,
            side,
            usdc_size: row.usdc_size,
            size: row.size,
            price: row.price,
            slug: row.slug,
            event_slug: row.event_slug,
            title: row.title,
            outcome: row.outcome,
            timestamp: row.timestamp,
            filtered: row.filtered,
            executed_at: row.executed_at,
        })
    }
}

/// Convert fetched rows, returning the ids of rows that violate a trade invariant
fn split_rows(rows: Vec<TradeRow>) -> (Vec<TradeEvent>, Vec<String>) {
    let mut events = Vec::with_capacity(rows.len());
    let mut malformed = Vec::new();

    for row in rows {
        let id = row.id.clone();
        match TradeEvent::try_from(row) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(error = %e, "Skipping malformed trade record");
                malformed.push(id);
            }
        }
    }
    (events, malformed)
}

/// Trade store over the `user_activity` table written by the ingestion service
#[derive(Debug, Clone)]
pub struct PgTradeStore {
    pool: PgPool,
}

impl PgTradeStore {
    /// Connect a pool using the database settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect(&config.url)
            .await?;
        info!("Connected to trade store");
        Ok(Self { pool })
    }

    /// Create the activity table and its pending-trade index when missing
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_PENDING_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    #[instrument(skip(self))]
    async fn find_unprocessed(&self, address: &str) -> Result<Vec<TradeEvent>> {
        let rows: Vec<TradeRow> = sqlx::query_as(SELECT_UNPROCESSED)
            .bind(address.to_lowercase())
            .fetch_all(&self.pool)
            .await?;

        let (events, malformed) = split_rows(rows);

        // Malformed rows leave the unprocessed set
        for trade_id in &malformed {
            if let Err(e) = self.mark_filtered(address, trade_id).await {
                warn!(trade_id = %trade_id, error = %e, "Failed to flag malformed trade record");
            }
        }

        Ok(events)
    }

    #[instrument(skip(self))]
    async fn mark_filtered(&self, address: &str, trade_id: &str) -> Result<()> {
        sqlx::query("UPDATE user_activity SET filtered = TRUE WHERE user_address = $1 AND id = $2")
            .bind(address.to_lowercase())
            .bind(trade_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, trade_ids), fields(trades = trade_ids.len()))]
    async fn mark_executed(&self, address: &str, trade_ids: &[String], at: DateTime<Utc>) -> Result<()> {
        let address = address.to_lowercase();

        // Dropping the transaction on an early return rolls every update back
        let mut tx = self.pool.begin().await?;
        for trade_id in trade_ids {
            sqlx::query(MARK_EXECUTED)
                .bind(&address)
                .bind(trade_id)
                .bind(at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
