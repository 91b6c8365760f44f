#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

use garoa_cache::{Cache, PrefixCache};
use garoa_common::{CacheError, CacheResult};

/// Backend embutido em disco sobre um arquivo SQLite.
///
/// Uma linha por chave, com `expires_at` em milissegundos unix (NULL =
/// sem TTL). A expiração é preguiçosa: leituras tratam linha vencida como
/// ausente e a apagam; uma varredura na abertura limpa o resto.
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
    closed: AtomicBool,
}

impl SqliteCache {
    /// Abre (ou cria) o cache em `path`. Caminho vazio usa um banco em
    /// memória, útil em testes.
    pub fn open(path: &str) -> CacheResult<Arc<Self>> {
        let conn = if path.is_empty() {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(translate)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )",
            [],
        )
        .map_err(translate)?;

        // varredura oportunista das linhas já vencidas
        conn.execute(
            "DELETE FROM cache WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now_millis()],
        )
        .map_err(translate)?;

        Ok(Arc::new(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: AtomicBool::new(false),
        }))
    }

    fn check_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check_open()?;
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(now_millis() + ttl.as_millis() as i64)
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            params![key, value, expires_at],
        )
        .map_err(translate)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        self.check_open()?;
        let conn = self.conn.lock();
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT value, expires_at FROM cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(translate)?;
        match row {
            None => Err(CacheError::NotFound),
            Some((_, Some(expires_at))) if expires_at <= now_millis() => {
                conn.execute("DELETE FROM cache WHERE key = ?1", params![key])
                    .map_err(translate)?;
                Err(CacheError::NotFound)
            }
            Some((value, _)) => Ok(value),
        }
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let conn = self.conn.lock();
        conn.execute("DELETE FROM cache WHERE key = ?1", params![key])
            .map_err(translate)?;
        Ok(())
    }

    async fn get_ttl(&self, key: &str) -> CacheResult<Duration> {
        self.check_open()?;
        let conn = self.conn.lock();
        let row: Option<Option<i64>> = conn
            .query_row(
                "SELECT expires_at FROM cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(translate)?;
        match row {
            None => Err(CacheError::NotFound),
            Some(None) => Ok(Duration::ZERO),
            Some(Some(expires_at)) => {
                let now = now_millis();
                if expires_at <= now {
                    conn.execute("DELETE FROM cache WHERE key = ?1", params![key])
                        .map_err(translate)?;
                    Err(CacheError::NotFound)
                } else {
                    Ok(Duration::from_millis((expires_at - now) as u64))
                }
            }
        }
    }

    async fn set_ttl(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.check_open()?;
        let now = now_millis();
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(now + ttl.as_millis() as i64)
        };
        let conn = self.conn.lock();
        // linha vencida não é ressuscitada
        let changed = conn
            .execute(
                "UPDATE cache SET expires_at = ?2
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?3)",
                params![key, expires_at, now],
            )
            .map_err(translate)?;
        if changed == 0 {
            return Err(CacheError::NotFound);
        }
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn sub_cache(self: Arc<Self>, prefix: &str) -> Arc<dyn Cache> {
        Arc::new(PrefixCache::new(self, prefix))
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn translate(err: rusqlite::Error) -> CacheError {
    CacheError::Backend(err.to_string())
}
