//! Repository for guest access tokens.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::token_acesso::{TokenAcesso, TokenStats};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct TokenRepository {
    db: DbConnection,
}

const SELECT_COLS: &str = "SELECT t.id, t.token, t.nome_convidado, t.ativo, t.expira_em, \
     t.ultimo_acesso, t.criado_por, u.nome as criado_por_nome, t.criado_em \
     FROM tokens_acesso t \
     LEFT JOIN usuarios u ON t.criado_por = u.id";

fn map_token(row: &SqliteRow) -> TokenAcesso {
    TokenAcesso {
        id: row.get("id"),
        token: row.get("token"),
        nome_convidado: row.get("nome_convidado"),
        ativo: row.get::<i64, _>("ativo") != 0,
        expira_em: row.get("expira_em"),
        ultimo_acesso: row.get("ultimo_acesso"),
        criado_por: row.get("criado_por"),
        criado_por_nome: row.get("criado_por_nome"),
        criado_em: row.get("criado_em"),
    }
}

impl TokenRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        token: &str,
        nome_convidado: &str,
        expira_em: Option<&str>,
        criado_por: i64,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO tokens_acesso (token, nome_convidado, ativo, expira_em, criado_por)
            VALUES (?, ?, 1, ?, ?)
            "#,
        )
        .bind(token)
        .bind(nome_convidado)
        .bind(expira_em)
        .bind(criado_por)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<TokenAcesso>> {
        let sql = format!("{SELECT_COLS} WHERE t.token = ?");
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(map_token))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<TokenAcesso>> {
        let sql = format!("{SELECT_COLS} WHERE t.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(map_token))
    }

    /// Every successful validation is also a touch.
    pub async fn touch(&self, token: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE tokens_acesso SET ultimo_acesso = datetime('now') WHERE token = ?")
                .bind(token)
                .execute(self.db.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self, apenas_ativos: bool) -> Result<Vec<TokenAcesso>> {
        let mut sql = SELECT_COLS.to_string();
        if apenas_ativos {
            sql.push_str(" WHERE t.ativo = 1");
        }
        sql.push_str(" ORDER BY t.criado_em DESC, t.id DESC");

        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(map_token).collect())
    }

    pub async fn set_ativo(&self, id: i64, ativo: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE tokens_acesso SET ativo = ? WHERE id = ?")
            .bind(ativo as i64)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tokens_acesso WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove tokens past their expiration, returning how many were purged.
    pub async fn purge_expired(&self, agora: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM tokens_acesso WHERE expira_em IS NOT NULL AND expira_em < ?",
        )
        .bind(agora)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn stats(&self, agora: &str) -> Result<TokenStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total,
                   COALESCE(SUM(CASE WHEN ativo = 1 THEN 1 ELSE 0 END), 0) as ativos,
                   COALESCE(SUM(CASE WHEN ativo = 0 THEN 1 ELSE 0 END), 0) as inativos,
                   COALESCE(SUM(CASE WHEN expira_em IS NOT NULL AND expira_em < ? THEN 1 ELSE 0 END), 0) as expirados,
                   COALESCE(SUM(CASE WHEN ultimo_acesso IS NOT NULL THEN 1 ELSE 0 END), 0) as ja_acessados
            FROM tokens_acesso
            "#,
        )
        .bind(agora)
        .fetch_one(self.db.pool())
        .await?;

        Ok(TokenStats {
            total: row.get("total"),
            ativos: row.get("ativos"),
            inativos: row.get("inativos"),
            expirados: row.get("expirados"),
            ja_acessados: row.get("ja_acessados"),
        })
    }
}
