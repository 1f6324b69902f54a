//! DuckDB storage for analysis results and order statuses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use delivcheck_core::result::split_codes;
use delivcheck_core::{AddressId, AnalysisResult, OrderAnalysisStatus, OrderId};
use duckdb::{Connection, params};
use tracing::{debug, info};

use crate::{ResultStore, StatusStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS analysis_results (
    address_id    UBIGINT PRIMARY KEY,
    first_name    VARCHAR NOT NULL,
    last_name     VARCHAR NOT NULL,
    city          VARCHAR NOT NULL,
    postal_code   VARCHAR NOT NULL,
    street        VARCHAR NOT NULL,
    street_number VARCHAR NOT NULL,
    status_codes  VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS order_analysis_status (
    order_id UBIGINT PRIMARY KEY,
    status   VARCHAR NOT NULL
);
";

const SELECT_RESULT: &str = "SELECT address_id, first_name, last_name, city, postal_code, \
     street, street_number, status_codes FROM analysis_results WHERE address_id = ?";

/// DuckDB store for analysis results and order statuses.
///
/// `analysis_results` is keyed by address id and `order_analysis_status` by
/// order id; neither has a surrogate key. Saves use
/// `INSERT ... ON CONFLICT DO UPDATE`, so concurrent writers for one id end
/// with exactly one row.
///
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for file-backed storage that survives across process restarts.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_schema(conn)
    }

    /// Open or create a persistent DuckDB database at the given path.
    ///
    /// Tables are created on first open and reused afterwards.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened analysis store");
        Self::with_schema(conn)
    }

    fn with_schema(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    // ── Counts ──

    /// Number of rows in `analysis_results`.
    pub fn result_count(&self) -> Result<usize, StoreError> {
        self.count_table("analysis_results")
    }

    /// Number of rows in `order_analysis_status`.
    pub fn status_count(&self) -> Result<usize, StoreError> {
        self.count_table("order_analysis_status")
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let count: i64 = self.conn()?.query_row(&sql, [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::Other(format!("negative count in {table}")))
    }
}

fn fetch_result(conn: &Connection, id: AddressId) -> Result<Option<AnalysisResult>, StoreError> {
    let row = conn.query_row(SELECT_RESULT, params![id.0], |row| {
        Ok(AnalysisResult {
            address_id: AddressId(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            city: row.get(3)?,
            postal_code: row.get(4)?,
            street: row.get(5)?,
            street_number: row.get(6)?,
            status_codes: split_codes(&row.get::<_, String>(7)?),
        })
    });
    match row {
        Ok(result) => Ok(Some(result)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ResultStore for DuckStore {
    async fn load_result(&self, id: AddressId) -> Result<Option<AnalysisResult>, StoreError> {
        let conn = self.conn()?;
        fetch_result(&conn, id)
    }

    async fn save_result(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO analysis_results
                (address_id, first_name, last_name, city, postal_code, street, street_number, status_codes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (address_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                city = excluded.city,
                postal_code = excluded.postal_code,
                street = excluded.street,
                street_number = excluded.street_number,
                status_codes = excluded.status_codes",
            params![
                result.address_id.0,
                result.first_name,
                result.last_name,
                result.city,
                result.postal_code,
                result.street,
                result.street_number,
                result.joined_codes(),
            ],
        )?;
        debug!(address_id = %result.address_id, "saved analysis result");
        Ok(())
    }

    async fn load_results(
        &self,
        ids: &[AddressId],
    ) -> Result<HashMap<AddressId, AnalysisResult>, StoreError> {
        let conn = self.conn()?;
        let mut found = HashMap::with_capacity(ids.len());
        for &id in ids {
            if let Some(result) = fetch_result(&conn, id)? {
                found.insert(id, result);
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl StatusStore for DuckStore {
    async fn load_status(&self, order: OrderId) -> Result<Option<OrderAnalysisStatus>, StoreError> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT status FROM order_analysis_status WHERE order_id = ?",
            params![order.0],
            |row| row.get::<_, String>(0),
        );
        match row {
            Ok(status) => Ok(Some(status.parse()?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_status(
        &self,
        order: OrderId,
        status: OrderAnalysisStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO order_analysis_status (order_id, status) VALUES (?, ?)
             ON CONFLICT (order_id) DO UPDATE SET status = excluded.status",
            params![order.0, status.as_str()],
        )?;
        debug!(order_id = %order, status = %status, "saved order status");
        Ok(())
    }

    async fn orders_with_status(
        &self,
        status: OrderAnalysisStatus,
    ) -> Result<Vec<OrderId>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT order_id FROM order_analysis_status WHERE status = ? ORDER BY order_id",
        )?;
        let rows = stmt.query_map(params![status.as_str()], |row| row.get::<_, u64>(0))?;
        let mut orders = Vec::new();
        for id in rows {
            orders.push(OrderId(id?));
        }
        Ok(orders)
    }
}
