//! Repository for pending contributions.
//!
//! Approval is the one operation spanning two tables (entrada insert +
//! status flip) and runs inside a single transaction whose commit point is
//! a conditional update on the pending row.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::contribuicao::{
    ContribuicaoFiltro, ContribuicaoPendente, ContribuicaoUpdate, NovaContribuicao,
};
use crate::domain::models::entrada::NovaEntrada;
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct ContribuicaoRepository {
    db: DbConnection,
}

const SELECT_COLS: &str = "SELECT cp.id, cp.nome_doador, cp.nome_sessao, cp.exibir_anonimo, \
     cp.valor, cp.observacoes, cp.status, cp.aprovado_por, ua.nome as aprovador_nome, \
     cp.aprovado_em, cp.entrada_id, cp.criado_em \
     FROM contribuicoes_pendentes cp \
     LEFT JOIN usuarios ua ON cp.aprovado_por = ua.id";

fn map_contribuicao(row: &SqliteRow) -> Result<ContribuicaoPendente> {
    Ok(ContribuicaoPendente {
        id: row.get("id"),
        nome_doador: row.get("nome_doador"),
        nome_sessao: row.get("nome_sessao"),
        exibir_anonimo: row.get::<i64, _>("exibir_anonimo") != 0,
        valor: row.get("valor"),
        observacoes: row.get("observacoes"),
        status: row.get::<String, _>("status").parse()?,
        aprovado_por: row.get("aprovado_por"),
        aprovador_nome: row.get("aprovador_nome"),
        aprovado_em: row.get("aprovado_em"),
        entrada_id: row.get("entrada_id"),
        criado_em: row.get("criado_em"),
    })
}

impl ContribuicaoRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, nova: &NovaContribuicao) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO contribuicoes_pendentes
                (nome_doador, nome_sessao, exibir_anonimo, valor, observacoes)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&nova.nome_doador)
        .bind(&nova.nome_sessao)
        .bind(nova.exibir_anonimo as i64)
        .bind(nova.valor)
        .bind(&nova.observacoes)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ContribuicaoPendente>> {
        let sql = format!("{SELECT_COLS} WHERE cp.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(map_contribuicao).transpose()
    }

    /// List contributions, newest first, enriched with the approver name.
    pub async fn list(&self, filtro: &ContribuicaoFiltro) -> Result<Vec<ContribuicaoPendente>> {
        let mut clauses: Vec<&str> = Vec::new();

        if filtro.status.is_some() {
            clauses.push("cp.status = ?");
        }
        if filtro.data_inicio.is_some() {
            clauses.push("DATE(cp.criado_em) >= ?");
        }
        if filtro.data_fim.is_some() {
            clauses.push("DATE(cp.criado_em) <= ?");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!("{SELECT_COLS} {where_clause} ORDER BY cp.criado_em DESC, cp.id DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filtro.status {
            query = query.bind(status.as_str());
        }
        if let Some(inicio) = &filtro.data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = &filtro.data_fim {
            query = query.bind(fim);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(map_contribuicao).collect()
    }

    pub async fn count_pending(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as total FROM contribuicoes_pendentes WHERE status = 'pendente'",
        )
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get("total"))
    }

    /// Create the ledger entrada and flip the pending row to `aprovada`,
    /// atomically.
    ///
    /// The conditional `status = 'pendente'` update is the commit point:
    /// when it matches no row (a concurrent approval won the race) the
    /// whole transaction rolls back, the entrada insert included, and
    /// `None` is returned. On success returns the new entrada id.
    pub async fn approve(
        &self,
        id: i64,
        admin_id: i64,
        entrada: &NovaEntrada,
    ) -> Result<Option<i64>> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO entradas (data, tipo, descricao, pessoa, valor, observacoes, criado_por)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entrada.data)
        .bind(entrada.tipo.as_str())
        .bind(&entrada.descricao)
        .bind(&entrada.pessoa)
        .bind(entrada.valor)
        .bind(&entrada.observacoes)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;

        let entrada_id = result.last_insert_rowid();

        let updated = sqlx::query(
            r#"
            UPDATE contribuicoes_pendentes
            SET status = 'aprovada',
                aprovado_por = ?,
                aprovado_em = datetime('now'),
                entrada_id = ?
            WHERE id = ? AND status = 'pendente'
            "#,
        )
        .bind(admin_id)
        .bind(entrada_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(entrada_id))
    }

    /// Flip the pending row to `rejeitada` with the rewritten observacoes.
    /// Single-row write; the conditional update keeps it race-safe against
    /// a concurrent approve.
    pub async fn reject(
        &self,
        id: i64,
        admin_id: i64,
        observacoes: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contribuicoes_pendentes
            SET status = 'rejeitada',
                aprovado_por = ?,
                aprovado_em = datetime('now'),
                observacoes = ?
            WHERE id = ? AND status = 'pendente'
            "#,
        )
        .bind(admin_id)
        .bind(observacoes)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Partial update, restricted to rows still pending.
    pub async fn update(&self, id: i64, dados: &ContribuicaoUpdate) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();

        if dados.nome_doador.is_some() {
            sets.push("nome_doador = ?");
        }
        if dados.exibir_anonimo.is_some() {
            sets.push("exibir_anonimo = ?");
        }
        if dados.valor.is_some() {
            sets.push("valor = ?");
        }
        if dados.observacoes.is_some() {
            sets.push("observacoes = ?");
        }

        if sets.is_empty() {
            return Ok(false);
        }

        let sql = format!(
            "UPDATE contribuicoes_pendentes SET {} WHERE id = ? AND status = 'pendente'",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(nome_doador) = &dados.nome_doador {
            query = query.bind(nome_doador);
        }
        if let Some(exibir_anonimo) = dados.exibir_anonimo {
            query = query.bind(exibir_anonimo as i64);
        }
        if let Some(valor) = dados.valor {
            query = query.bind(valor);
        }
        if let Some(observacoes) = &dados.observacoes {
            query = query.bind(observacoes);
        }

        let result = query.bind(id).execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a contribution, allowed only while still pending.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM contribuicoes_pendentes WHERE id = ? AND status = 'pendente'")
                .bind(id)
                .execute(self.db.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
