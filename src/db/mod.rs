pub mod config;
pub mod memory;
pub mod schema;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, QueryBuilder, Row, SqlitePool};
use thiserror::Error;

use crate::db::config::{Backend, DbConfig, DbConfigError};
use crate::engine::{ProgressRecord, Word, WordId};

pub use memory::MemoryStore;

/// Column filters for corpus reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordFilter {
    pub with_sentence: bool,
    pub gendered_only: bool,
}

impl WordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, word: &Word) -> bool {
        (!self.with_sentence || word.has_sentence()) && (!self.gendered_only || word.is_gendered())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
    #[error("store unavailable")]
    Unavailable,
    #[error("unknown word: {0}")]
    UnknownWord(WordId),
    #[error("invalid row: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Word corpus and progress storage, interchangeable behind one read/upsert contract.
#[derive(Debug, Clone)]
pub enum Store {
    Postgres(PgPool),
    Sqlite(SqlitePool),
    Memory(Arc<MemoryStore>),
}

impl Store {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbInitError> {
        let backend = config.backend()?;
        let url = config.url.as_deref().unwrap_or_default();

        match backend {
            Backend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(config.acquire_timeout)
                    .connect(url)
                    .await?;
                schema::apply_postgres(&pool).await?;
                tracing::info!(backend = "postgres", "store connected");
                Ok(Store::Postgres(pool))
            }
            Backend::Sqlite => {
                let options = SqliteConnectOptions::from_str(url)?
                    .create_if_missing(true)
                    .foreign_keys(true);
                // Every connection to an in-memory database is its own database.
                let in_memory = url.contains(":memory:");
                let pool = SqlitePoolOptions::new()
                    .max_connections(if in_memory { 1 } else { config.max_connections })
                    .acquire_timeout(config.acquire_timeout)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?;
                schema::apply_sqlite(&pool).await?;
                tracing::info!(backend = "sqlite", in_memory, "store connected");
                Ok(Store::Sqlite(pool))
            }
            Backend::Memory => {
                tracing::warn!("DATABASE_URL not set, progress is kept in process memory only");
                Ok(Store::Memory(Arc::new(MemoryStore::new())))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Sqlite(_) => "sqlite",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            Store::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            Store::Memory(mem) => {
                mem.count_words()?;
            }
        }
        Ok(())
    }

    pub async fn list_words(&self, filter: &WordFilter) -> Result<Vec<Word>, StoreError> {
        match self {
            Store::Postgres(pool) => list_words_pg(pool, filter).await,
            Store::Sqlite(pool) => list_words_sqlite(pool, filter).await,
            Store::Memory(mem) => mem.list_words(filter),
        }
    }

    pub async fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        match self {
            Store::Postgres(pool) => list_progress_pg(pool, user_id).await,
            Store::Sqlite(pool) => list_progress_sqlite(pool, user_id).await,
            Store::Memory(mem) => mem.list_progress(user_id),
        }
    }

    /// Words the user currently has marked learned, ordered by id.
    pub async fn list_learned_words(&self, user_id: &str) -> Result<Vec<Word>, StoreError> {
        match self {
            Store::Postgres(pool) => {
                let rows = sqlx::query(&learned_words_sql("$1"))
                    .bind(user_id)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(map_word_pg).collect()
            }
            Store::Sqlite(pool) => {
                let rows = sqlx::query(&learned_words_sql("?"))
                    .bind(user_id)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(map_word_sqlite).collect()
            }
            Store::Memory(mem) => mem.list_learned_words(user_id),
        }
    }

    /// Insert-or-update keyed on (user, word); last writer wins.
    pub async fn upsert_progress(
        &self,
        user_id: &str,
        word_id: WordId,
        is_learned: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match self {
            Store::Postgres(pool) => {
                sqlx::query(
                    r#"INSERT INTO "user_progress" ("userId", "wordId", "isLearned", "lastReviewed")
                       VALUES ($1, $2, $3, $4)
                       ON CONFLICT ("userId", "wordId")
                       DO UPDATE SET "isLearned" = EXCLUDED."isLearned", "lastReviewed" = EXCLUDED."lastReviewed""#,
                )
                .bind(user_id)
                .bind(word_id)
                .bind(is_learned)
                .bind(at)
                .execute(pool)
                .await?;
                Ok(())
            }
            Store::Sqlite(pool) => {
                sqlx::query(
                    r#"INSERT INTO "user_progress" ("userId", "wordId", "isLearned", "lastReviewed")
                       VALUES (?, ?, ?, ?)
                       ON CONFLICT ("userId", "wordId")
                       DO UPDATE SET "isLearned" = excluded."isLearned", "lastReviewed" = excluded."lastReviewed""#,
                )
                .bind(user_id)
                .bind(word_id)
                .bind(is_learned)
                .bind(at.to_rfc3339())
                .execute(pool)
                .await?;
                Ok(())
            }
            Store::Memory(mem) => mem.upsert_progress(user_id, word_id, is_learned, at),
        }
    }

    /// Adds words that are not present yet; returns how many were inserted.
    pub async fn insert_words(&self, words: &[Word]) -> Result<u64, StoreError> {
        match self {
            Store::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                let mut inserted = 0;
                for word in words {
                    let result = sqlx::query(
                        r#"INSERT INTO "words"
                           ("id", "term", "termSentence", "translation", "translationSentence", "level", "genderCode", "category")
                           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                           ON CONFLICT ("id") DO NOTHING"#,
                    )
                    .bind(word.id)
                    .bind(&word.term)
                    .bind(&word.term_sentence)
                    .bind(&word.translation)
                    .bind(&word.translation_sentence)
                    .bind(&word.level)
                    .bind(word.gender_code)
                    .bind(&word.category)
                    .execute(&mut *tx)
                    .await?;
                    inserted += result.rows_affected();
                }
                tx.commit().await?;
                Ok(inserted)
            }
            Store::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let mut inserted = 0;
                for word in words {
                    let result = sqlx::query(
                        r#"INSERT INTO "words"
                           ("id", "term", "termSentence", "translation", "translationSentence", "level", "genderCode", "category")
                           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                           ON CONFLICT ("id") DO NOTHING"#,
                    )
                    .bind(word.id)
                    .bind(&word.term)
                    .bind(&word.term_sentence)
                    .bind(&word.translation)
                    .bind(&word.translation_sentence)
                    .bind(&word.level)
                    .bind(word.gender_code)
                    .bind(&word.category)
                    .execute(&mut *tx)
                    .await?;
                    inserted += result.rows_affected();
                }
                tx.commit().await?;
                Ok(inserted)
            }
            Store::Memory(mem) => mem.insert_words(words),
        }
    }

    pub async fn count_words(&self) -> Result<i64, StoreError> {
        match self {
            Store::Postgres(pool) => {
                let row = sqlx::query(r#"SELECT COUNT(*) AS "count" FROM "words""#)
                    .fetch_one(pool)
                    .await?;
                Ok(row.try_get("count")?)
            }
            Store::Sqlite(pool) => {
                let row = sqlx::query(r#"SELECT COUNT(*) AS "count" FROM "words""#)
                    .fetch_one(pool)
                    .await?;
                Ok(row.try_get("count")?)
            }
            Store::Memory(mem) => mem.count_words(),
        }
    }
}

fn learned_words_sql(user_param: &str) -> String {
    format!(
        r#"SELECT w."id", w."term", w."termSentence", w."translation", w."translationSentence",
                  w."level", w."genderCode", w."category"
           FROM "words" w
           JOIN "user_progress" p ON p."wordId" = w."id"
           WHERE p."userId" = {user_param} AND p."isLearned"
           ORDER BY w."id""#
    )
}

const WORD_COLUMNS: &str = r#"SELECT "id", "term", "termSentence", "translation", "translationSentence", "level", "genderCode", "category" FROM "words""#;

async fn list_words_pg(pool: &PgPool, filter: &WordFilter) -> Result<Vec<Word>, StoreError> {
    let mut qb = QueryBuilder::<sqlx::Postgres>::new(WORD_COLUMNS);
    qb.push(" WHERE 1 = 1");
    if filter.with_sentence {
        qb.push(r#" AND "termSentence" IS NOT NULL AND TRIM("termSentence") <> ''"#);
    }
    if filter.gendered_only {
        qb.push(r#" AND "genderCode" BETWEEN 1 AND 3"#);
    }
    qb.push(r#" ORDER BY "id""#);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_word_pg).collect()
}

async fn list_words_sqlite(pool: &SqlitePool, filter: &WordFilter) -> Result<Vec<Word>, StoreError> {
    let mut qb = QueryBuilder::<sqlx::Sqlite>::new(WORD_COLUMNS);
    qb.push(" WHERE 1 = 1");
    if filter.with_sentence {
        qb.push(r#" AND "termSentence" IS NOT NULL AND TRIM("termSentence") <> ''"#);
    }
    if filter.gendered_only {
        qb.push(r#" AND "genderCode" BETWEEN 1 AND 3"#);
    }
    qb.push(r#" ORDER BY "id""#);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(map_word_sqlite).collect()
}

fn map_word_pg(row: &sqlx::postgres::PgRow) -> Result<Word, StoreError> {
    Ok(Word {
        id: row.try_get("id")?,
        term: row.try_get("term")?,
        term_sentence: row.try_get("termSentence")?,
        translation: row.try_get("translation")?,
        translation_sentence: row.try_get("translationSentence")?,
        level: row.try_get("level")?,
        gender_code: row.try_get("genderCode")?,
        category: row.try_get("category")?,
    })
}

fn map_word_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Word, StoreError> {
    Ok(Word {
        id: row.try_get("id")?,
        term: row.try_get("term")?,
        term_sentence: row.try_get("termSentence")?,
        translation: row.try_get("translation")?,
        translation_sentence: row.try_get("translationSentence")?,
        level: row.try_get("level")?,
        gender_code: row.try_get("genderCode")?,
        category: row.try_get("category")?,
    })
}

async fn list_progress_pg(pool: &PgPool, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT "userId", "wordId", "isLearned", "lastReviewed"
           FROM "user_progress" WHERE "userId" = $1 ORDER BY "wordId""#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ProgressRecord, StoreError> {
            Ok(ProgressRecord {
                user_id: row.try_get("userId")?,
                word_id: row.try_get("wordId")?,
                is_learned: row.try_get("isLearned")?,
                last_reviewed: row.try_get("lastReviewed")?,
            })
        })
        .collect()
}

async fn list_progress_sqlite(pool: &SqlitePool, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
    let rows = sqlx::query(
        r#"SELECT "userId", "wordId", "isLearned", "lastReviewed"
           FROM "user_progress" WHERE "userId" = ? ORDER BY "wordId""#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ProgressRecord, StoreError> {
            let raw: String = row.try_get("lastReviewed")?;
            Ok(ProgressRecord {
                user_id: row.try_get("userId")?,
                word_id: row.try_get("wordId")?,
                is_learned: row.try_get("isLearned")?,
                last_reviewed: parse_datetime_sqlite(&raw)?,
            })
        })
        .collect()
}

fn parse_datetime_sqlite(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("lastReviewed {raw:?}: {e}")))
}
