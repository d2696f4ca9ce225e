use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use accessgov_core::config::DEFAULT_MAX_BATCH_ITEMS;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::cursor::Cursor;
use crate::db;
use crate::errors::{batch_too_large, from_rusqlite, lock_poisoned, Result};
use crate::item::{Index, IndexKey, IndexKeys, PrimaryKey, RawItem};
use crate::migrations::apply_migrations;
use crate::query::{QueryInput, QueryPage, ScanDirection, SortKeyCondition};

use super::{paginate, ItemStore};

const COLUMNS: &str = "pk, sk, gsi1_pk, gsi1_sk, gsi2_pk, gsi2_sk, \
                       gsi3_pk, gsi3_sk, gsi4_pk, gsi4_sk, data";

const UPSERT: &str = "INSERT OR REPLACE INTO items \
     (pk, sk, gsi1_pk, gsi1_sk, gsi2_pk, gsi2_sk, gsi3_pk, gsi3_sk, gsi4_pk, gsi4_sk, data, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// Store backed by a single SQLite `items` table
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_batch_items: usize,
}

impl SqliteStore {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
        })
    }

    pub fn with_max_batch_items(mut self, max_batch_items: usize) -> Self {
        self.max_batch_items = max_batch_items;
        self
    }

    fn lock(&self, op: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| lock_poisoned(op))
    }
}

fn index_columns(index: Option<Index>) -> (&'static str, &'static str) {
    match index {
        None => ("pk", "sk"),
        Some(Index::Gsi1) => ("gsi1_pk", "gsi1_sk"),
        Some(Index::Gsi2) => ("gsi2_pk", "gsi2_sk"),
        Some(Index::Gsi3) => ("gsi3_pk", "gsi3_sk"),
        Some(Index::Gsi4) => ("gsi4_pk", "gsi4_sk"),
    }
}

fn upsert(conn: &Connection, item: &RawItem, now_ms: i64) -> Result<()> {
    fn col(k: &Option<IndexKey>) -> Option<(&str, &str)> {
        k.as_ref().map(|k| (k.pk.as_str(), k.sk.as_str()))
    }
    let (g1, g2, g3, g4) = (
        col(&item.indexes.gsi1),
        col(&item.indexes.gsi2),
        col(&item.indexes.gsi3),
        col(&item.indexes.gsi4),
    );
    conn.execute(
        UPSERT,
        params![
            item.key.pk,
            item.key.sk,
            g1.map(|k| k.0),
            g1.map(|k| k.1),
            g2.map(|k| k.0),
            g2.map(|k| k.1),
            g3.map(|k| k.0),
            g3.map(|k| k.1),
            g4.map(|k| k.0),
            g4.map(|k| k.1),
            item.data,
            now_ms,
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    let index_key = |pk: usize| -> rusqlite::Result<Option<IndexKey>> {
        let pk_value: Option<String> = row.get(pk)?;
        let sk_value: Option<String> = row.get(pk + 1)?;
        Ok(pk_value.zip(sk_value).map(|(p, s)| IndexKey::new(p, s)))
    };
    Ok(RawItem {
        key: PrimaryKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
        indexes: IndexKeys {
            gsi1: index_key(2)?,
            gsi2: index_key(4)?,
            gsi3: index_key(6)?,
            gsi4: index_key(8)?,
        },
        data: row.get(10)?,
    })
}

/// SELECT for one page plus one look-ahead row, and its parameters
fn build_select(input: &QueryInput, start: Option<&Cursor>) -> (String, Vec<String>) {
    let (pk_col, sk_col) = index_columns(input.index);
    let mut sql = format!("SELECT {COLUMNS} FROM items WHERE {pk_col} = ?");
    let mut args = vec![input.partition_key.clone()];

    match &input.sort_key {
        None => {}
        Some(SortKeyCondition::Equals(v)) => {
            sql.push_str(&format!(" AND {sk_col} = ?"));
            args.push(v.clone());
        }
        Some(SortKeyCondition::BeginsWith(p)) => {
            sql.push_str(&format!(" AND substr({sk_col}, 1, length(?)) = ?"));
            args.push(p.clone());
            args.push(p.clone());
        }
        Some(SortKeyCondition::Between(lo, hi)) => {
            sql.push_str(&format!(" AND {sk_col} BETWEEN ? AND ?"));
            args.push(lo.clone());
            args.push(hi.clone());
        }
        Some(SortKeyCondition::LessThan(v)) => {
            sql.push_str(&format!(" AND {sk_col} < ?"));
            args.push(v.clone());
        }
        Some(SortKeyCondition::GreaterOrEqual(v)) => {
            sql.push_str(&format!(" AND {sk_col} >= ?"));
            args.push(v.clone());
        }
    }

    let (cmp, order) = match input.direction {
        ScanDirection::Forward => (">", "ASC"),
        ScanDirection::Reverse => ("<", "DESC"),
    };

    if let Some(cursor) = start {
        let (c_sk, c_pk, c_main_sk) = cursor.position(input.index);
        sql.push_str(&format!(" AND ({sk_col}, pk, sk) {cmp} (?, ?, ?)"));
        args.extend([c_sk.to_string(), c_pk.to_string(), c_main_sk.to_string()]);
    }

    sql.push_str(&format!(" ORDER BY {sk_col} {order}, pk {order}, sk {order}"));
    if let Some(limit) = input.limit {
        sql.push_str(&format!(" LIMIT {}", limit.saturating_add(1)));
    }
    (sql, args)
}

impl ItemStore for SqliteStore {
    fn max_batch_items(&self) -> usize {
        self.max_batch_items
    }

    fn put(&self, item: RawItem) -> Result<()> {
        let conn = self.lock("put")?;
        upsert(&conn, &item, chrono::Utc::now().timestamp_millis())
    }

    fn put_batch(&self, items: Vec<RawItem>) -> Result<()> {
        if items.len() > self.max_batch_items {
            return Err(batch_too_large("put_batch", items.len(), self.max_batch_items));
        }
        let mut conn = self.lock("put_batch")?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let tx = conn.transaction().map_err(from_rusqlite)?;
        for item in &items {
            upsert(&tx, item, now_ms)?;
        }
        tx.commit().map_err(from_rusqlite)
    }

    fn delete_batch(&self, keys: Vec<PrimaryKey>) -> Result<()> {
        if keys.len() > self.max_batch_items {
            return Err(batch_too_large("delete_batch", keys.len(), self.max_batch_items));
        }
        let mut conn = self.lock("delete_batch")?;
        let tx = conn.transaction().map_err(from_rusqlite)?;
        for key in &keys {
            tx.execute(
                "DELETE FROM items WHERE pk = ?1 AND sk = ?2",
                params![key.pk, key.sk],
            )
            .map_err(from_rusqlite)?;
        }
        tx.commit().map_err(from_rusqlite)
    }

    fn query(&self, input: &QueryInput, start: Option<&Cursor>) -> Result<QueryPage> {
        let (sql, args) = build_select(input, start);
        let conn = self.lock("query")?;
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), read_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        let page = paginate(input, rows);
        tracing::debug!(
            index = ?input.index,
            partition = %input.partition_key,
            item_count = page.items.len(),
            has_more = page.last_evaluated.is_some(),
            "sqlite query"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_for_index_page_with_cursor() {
        let input = QueryInput::on_index(Index::Gsi4, "ACCESS_REQUEST#")
            .with_sort_key(SortKeyCondition::GreaterOrEqual("0922".to_string()))
            .with_limit(10)
            .reverse();
        let cursor = Cursor {
            key: PrimaryKey::new("ACCESS_REQUEST#", "REQUEST#r1#"),
            index_key: Some(IndexKey::new("ACCESS_REQUEST#", "0923#REQUEST#r1#")),
        };

        let (sql, args) = build_select(&input, Some(&cursor));

        assert!(sql.contains("WHERE gsi4_pk = ?"));
        assert!(sql.contains("AND gsi4_sk >= ?"));
        assert!(sql.contains("(gsi4_sk, pk, sk) < (?, ?, ?)"));
        assert!(sql.ends_with("ORDER BY gsi4_sk DESC, pk DESC, sk DESC LIMIT 11"));
        assert_eq!(
            args,
            vec![
                "ACCESS_REQUEST#",
                "0922",
                "0923#REQUEST#r1#",
                "ACCESS_REQUEST#",
                "REQUEST#r1#"
            ]
        );
    }

    #[test]
    fn test_round_trip_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        let item = RawItem {
            key: PrimaryKey::new("P", "a"),
            indexes: IndexKeys {
                gsi2: Some(IndexKey::new("S", "a")),
                ..Default::default()
            },
            data: serde_json::json!({ "n": 1 }),
        };
        store.put(item.clone()).unwrap();

        let page = store.query(&QueryInput::main("P"), None).unwrap();
        assert_eq!(page.items, vec![item.clone()]);

        let page = store
            .query(&QueryInput::on_index(Index::Gsi2, "S"), None)
            .unwrap();
        assert_eq!(page.items, vec![item]);

        assert!(store
            .query(&QueryInput::on_index(Index::Gsi1, "S"), None)
            .unwrap()
            .items
            .is_empty());
    }
}
