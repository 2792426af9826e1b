//! Repository for visitor identities.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::visitante::{Visitante, VisitanteStats};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct VisitanteRepository {
    db: DbConnection,
}

fn map_visitante(row: &SqliteRow) -> Visitante {
    Visitante {
        id: row.get("id"),
        token_id: row.get("token_id"),
        visitante_hash: row.get("visitante_hash"),
        nome: row.get("nome"),
        respondeu_modal: row.get::<i64, _>("respondeu_modal") != 0,
        primeiro_acesso: row.get("primeiro_acesso"),
        ultimo_acesso: row.get("ultimo_acesso"),
        total_acessos: row.get("total_acessos"),
        user_agent: row.get("user_agent"),
    }
}

impl VisitanteRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        token_id: i64,
        visitante_hash: &str,
        user_agent: Option<&str>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO visitantes (token_id, visitante_hash, primeiro_acesso, ultimo_acesso, user_agent)
            VALUES (?, ?, datetime('now'), datetime('now'), ?)
            "#,
        )
        .bind(token_id)
        .bind(visitante_hash)
        .bind(user_agent)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Visitante>> {
        let row = sqlx::query("SELECT * FROM visitantes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(map_visitante))
    }

    /// The hash alone is not an identity; the same browser under two
    /// tokens gets two rows.
    pub async fn find_by_token_and_hash(
        &self,
        token_id: i64,
        hash: &str,
    ) -> Result<Option<Visitante>> {
        let row =
            sqlx::query("SELECT * FROM visitantes WHERE token_id = ? AND visitante_hash = ?")
                .bind(token_id)
                .bind(hash)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.as_ref().map(map_visitante))
    }

    /// Bump the access counter and last-seen timestamp.
    pub async fn touch(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE visitantes
            SET ultimo_acesso = datetime('now'),
                total_acessos = total_acessos + 1
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the identification answer. The prompt flag never goes back
    /// to false.
    pub async fn record_identification(&self, id: i64, nome: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE visitantes
            SET nome = ?,
                respondeu_modal = 1
            WHERE id = ?
            "#,
        )
        .bind(nome)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_token(&self, token_id: i64) -> Result<Vec<Visitante>> {
        let rows = sqlx::query(
            "SELECT * FROM visitantes WHERE token_id = ? ORDER BY primeiro_acesso DESC",
        )
        .bind(token_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(map_visitante).collect())
    }

    pub async fn stats_by_token(&self, token_id: i64) -> Result<VisitanteStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total_visitantes,
                   COALESCE(SUM(CASE WHEN nome IS NOT NULL THEN 1 ELSE 0 END), 0) as identificados,
                   COALESCE(SUM(total_acessos), 0) as total_acessos,
                   MAX(ultimo_acesso) as ultimo_acesso_geral
            FROM visitantes
            WHERE token_id = ?
            "#,
        )
        .bind(token_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(VisitanteStats {
            total_visitantes: row.get("total_visitantes"),
            identificados: row.get("identificados"),
            total_acessos: row.get("total_acessos"),
            ultimo_acesso_geral: row.get("ultimo_acesso_geral"),
        })
    }
}
