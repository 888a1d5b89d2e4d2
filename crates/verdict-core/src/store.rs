//! SQLite-backed persistence for risk cards. Decision fields are written once
//! per request id; only the approval fields are mutated afterwards.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::card::{RiskCard, RiskLevel, Status};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS risk_cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_id TEXT UNIQUE NOT NULL,
    status TEXT NOT NULL,
    checks TEXT NOT NULL,
    diff TEXT NOT NULL,
    stdout_tail TEXT NOT NULL,
    diff_analysis TEXT NOT NULL,
    risk_score INTEGER NOT NULL,
    risk_level TEXT NOT NULL,
    explanation TEXT NOT NULL,
    created_at TEXT NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0,
    approved_by TEXT,
    approved_at TEXT,
    execution_time_ms INTEGER
);
CREATE INDEX IF NOT EXISTS idx_risk_cards_created_at ON risk_cards(created_at);
";

/// Persistent store of decision records.
pub struct DecisionStore {
    conn: Mutex<Connection>,
}

impl DecisionStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open decision store at {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("failed to initialize decision store schema")?;
        info!(path = %path.display(), "decision store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a card, replacing any previous record with the same request id.
    pub fn insert(&self, card: &RiskCard) -> Result<()> {
        let checks = serde_json::to_string(&card.checks)?;
        let diff_analysis = serde_json::to_string(&card.diff_analysis)?;
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO risk_cards
             (request_id, status, checks, diff, stdout_tail, diff_analysis,
              risk_score, risk_level, explanation, created_at,
              approved, approved_by, approved_at, execution_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                card.request_id,
                card.status.as_str(),
                checks,
                card.diff,
                card.stdout_tail,
                diff_analysis,
                card.risk_score,
                card.risk_level.as_str(),
                card.explanation,
                card.created_at.to_rfc3339(),
                card.approved,
                card.approved_by,
                card.approved_at.map(|t| t.to_rfc3339()),
                card.execution_time_ms,
            ],
        )
        .context("failed to insert risk card")?;
        Ok(())
    }

    /// Look up a card by request id.
    pub fn get(&self, request_id: &str) -> Result<Option<RiskCard>> {
        let conn = self.lock();
        let card = conn
            .query_row(
                "SELECT request_id, status, checks, diff, stdout_tail, diff_analysis,
                        risk_score, risk_level, explanation, created_at,
                        approved, approved_by, approved_at, execution_time_ms
                 FROM risk_cards WHERE request_id = ?1",
                params![request_id],
                row_to_card,
            )
            .optional()
            .context("failed to query risk card")?;
        Ok(card)
    }

    /// Most recent cards first, at most `limit` of them.
    pub fn history(&self, limit: usize) -> Result<Vec<RiskCard>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT request_id, status, checks, diff, stdout_tail, diff_analysis,
                    risk_score, risk_level, explanation, created_at,
                    approved, approved_by, approved_at, execution_time_ms
             FROM risk_cards ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_card)?;
        let mut cards = Vec::new();
        for row in rows {
            cards.push(row.context("failed to read risk card row")?);
        }
        Ok(cards)
    }

    /// Mark a card approved. Repeat approvals overwrite the approver and
    /// timestamp. Returns false when the request id is unknown.
    pub fn approve(&self, request_id: &str, approved_by: &str) -> Result<bool> {
        let conn = self.lock();
        let rows = conn
            .execute(
                "UPDATE risk_cards
                 SET approved = 1, approved_by = ?2, approved_at = ?3
                 WHERE request_id = ?1",
                params![request_id, approved_by, Utc::now().to_rfc3339()],
            )
            .context("failed to approve risk card")?;
        Ok(rows > 0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn row_to_card(row: &Row) -> rusqlite::Result<RiskCard> {
    let status_text: String = row.get("status")?;
    let checks_json: String = row.get("checks")?;
    let analysis_json: String = row.get("diff_analysis")?;
    let level_text: String = row.get("risk_level")?;
    let created_at_text: String = row.get("created_at")?;
    let approved_at_text: Option<String> = row.get("approved_at")?;

    Ok(RiskCard {
        request_id: row.get("request_id")?,
        status: Status::parse(&status_text).ok_or_else(|| conversion_error(&status_text))?,
        checks: serde_json::from_str(&checks_json)
            .map_err(|e| conversion_error(&e.to_string()))?,
        diff: row.get("diff")?,
        stdout_tail: row.get("stdout_tail")?,
        diff_analysis: serde_json::from_str(&analysis_json)
            .map_err(|e| conversion_error(&e.to_string()))?,
        risk_score: row.get("risk_score")?,
        risk_level: RiskLevel::parse(&level_text).ok_or_else(|| conversion_error(&level_text))?,
        explanation: row.get("explanation")?,
        created_at: parse_timestamp(&created_at_text)?,
        approved: row.get("approved")?,
        approved_by: row.get("approved_by")?,
        approved_at: approved_at_text
            .map(|t| parse_timestamp(&t))
            .transpose()?,
        execution_time_ms: row.get("execution_time_ms")?,
    })
}

fn parse_timestamp(text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(&e.to_string()))
}

fn conversion_error(detail: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("invalid stored risk card: {detail}").into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CheckName, CheckResult};
    use crate::diff::analyze_diff;
    use chrono::Duration;

    fn sample_card(request_id: &str, created_at: DateTime<Utc>) -> RiskCard {
        RiskCard {
            request_id: request_id.to_string(),
            status: Status::Allow,
            checks: vec![
                CheckResult::pass(CheckName::Policy, "OK"),
                CheckResult::pass(CheckName::Sandbox, "tests passed"),
            ],
            diff: "+pagination: 50\n-pagination: 10\n".to_string(),
            stdout_tail: "2 passed".to_string(),
            diff_analysis: analyze_diff("+pagination: 50\n-pagination: 10\n"),
            risk_score: 10,
            risk_level: RiskLevel::Low,
            explanation: "Action is safe; (1 added, 1 removed)".to_string(),
            created_at,
            approved: false,
            approved_by: None,
            approved_at: None,
            execution_time_ms: Some(42),
        }
    }

    fn open_store() -> (tempfile::TempDir, DecisionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DecisionStore::open(&dir.path().join("verdict.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let (_dir, store) = open_store();
        let card = sample_card("req_aaaaaaaaaaaa", Utc::now());
        store.insert(&card).unwrap();

        let loaded = store.get("req_aaaaaaaaaaaa").unwrap().unwrap();
        assert_eq!(loaded.request_id, card.request_id);
        assert_eq!(loaded.status, card.status);
        assert_eq!(loaded.checks, card.checks);
        assert_eq!(loaded.diff_analysis, card.diff_analysis);
        assert_eq!(loaded.risk_score, 10);
        assert_eq!(loaded.execution_time_ms, Some(42));
        assert!(!loaded.approved);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let (_dir, store) = open_store();
        assert!(store.get("req_missing").unwrap().is_none());
    }

    #[test]
    fn test_history_most_recent_first_with_limit() {
        let (_dir, store) = open_store();
        let base = Utc::now();
        for i in 0..5 {
            let card = sample_card(
                &format!("req_{:012}", i),
                base + Duration::seconds(i),
            );
            store.insert(&card).unwrap();
        }

        let history = store.history(3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].request_id, "req_000000000004");
        assert_eq!(history[2].request_id, "req_000000000002");
    }

    #[test]
    fn test_approve_sets_fields_and_repeat_wins() {
        let (_dir, store) = open_store();
        store
            .insert(&sample_card("req_bbbbbbbbbbbb", Utc::now()))
            .unwrap();

        assert!(store.approve("req_bbbbbbbbbbbb", "alice").unwrap());
        let card = store.get("req_bbbbbbbbbbbb").unwrap().unwrap();
        assert!(card.approved);
        assert_eq!(card.approved_by.as_deref(), Some("alice"));
        assert!(card.approved_at.is_some());

        assert!(store.approve("req_bbbbbbbbbbbb", "bob").unwrap());
        let card = store.get("req_bbbbbbbbbbbb").unwrap().unwrap();
        assert_eq!(card.approved_by.as_deref(), Some("bob"));
    }

    #[test]
    fn test_approve_unknown_is_false() {
        let (_dir, store) = open_store();
        assert!(!store.approve("req_missing", "alice").unwrap());
    }

    #[test]
    fn test_insert_same_request_id_replaces() {
        let (_dir, store) = open_store();
        let mut card = sample_card("req_cccccccccccc", Utc::now());
        store.insert(&card).unwrap();
        card.risk_score = 90;
        card.risk_level = RiskLevel::Critical;
        store.insert(&card).unwrap();

        let loaded = store.get("req_cccccccccccc").unwrap().unwrap();
        assert_eq!(loaded.risk_score, 90);
        assert_eq!(store.history(10).unwrap().len(), 1);
    }
}
