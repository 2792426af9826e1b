//! Repository for income records (entradas).

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::entrada::{Entrada, EntradaFiltro, EntradaUpdate, NovaEntrada};
use crate::domain::models::{Ordenacao, TotalMensal, TotalPorTipo};
use crate::storage::connection::DbConnection;

#[derive(Clone)]
pub struct EntradaRepository {
    db: DbConnection,
}

const SELECT_COLS: &str = "SELECT e.id, e.data, e.tipo, e.descricao, e.pessoa, e.valor, \
     e.observacoes, e.criado_por, u.nome as criador_nome, e.criado_em, e.deleted_at \
     FROM entradas e \
     LEFT JOIN usuarios u ON e.criado_por = u.id";

fn map_entrada(row: &SqliteRow) -> Result<Entrada> {
    Ok(Entrada {
        id: row.get("id"),
        data: row.get("data"),
        tipo: row.get::<String, _>("tipo").parse()?,
        descricao: row.get("descricao"),
        pessoa: row.get("pessoa"),
        valor: row.get("valor"),
        observacoes: row.get("observacoes"),
        criado_por: row.get("criado_por"),
        criador_nome: row.get("criador_nome"),
        criado_em: row.get("criado_em"),
        deleted_at: row.get("deleted_at"),
    })
}

impl EntradaRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a new entrada, returning its id.
    pub async fn create(&self, nova: &NovaEntrada, criado_por: i64) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO entradas (data, tipo, descricao, pessoa, valor, observacoes, criado_por)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&nova.data)
        .bind(nova.tipo.as_str())
        .bind(&nova.descricao)
        .bind(&nova.pessoa)
        .bind(nova.valor)
        .bind(&nova.observacoes)
        .bind(criado_por)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Entrada>> {
        let sql = format!("{SELECT_COLS} WHERE e.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(map_entrada).transpose()
    }

    /// List entradas matching the filter, newest first by default.
    pub async fn list(&self, filtro: &EntradaFiltro) -> Result<Vec<Entrada>> {
        let mut clauses: Vec<&str> = Vec::new();

        if !filtro.incluir_deletados {
            clauses.push("e.deleted_at IS NULL");
        }
        if filtro.tipo.is_some() {
            clauses.push("e.tipo = ?");
        }
        if filtro.data_inicio.is_some() {
            clauses.push("e.data >= ?");
        }
        if filtro.data_fim.is_some() {
            clauses.push("e.data <= ?");
        }
        if filtro.mes.is_some() && filtro.ano.is_some() {
            clauses.push(
                "CAST(strftime('%Y', e.data) AS INTEGER) = ? \
                 AND CAST(strftime('%m', e.data) AS INTEGER) = ?",
            );
        }
        if filtro.busca.is_some() {
            clauses.push("(e.descricao LIKE ? OR e.observacoes LIKE ?)");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let order_by = match filtro.ordenar {
            Some(Ordenacao::DataAsc) => "e.data ASC, e.id ASC",
            Some(Ordenacao::ValorDesc) => "e.valor DESC",
            Some(Ordenacao::ValorAsc) => "e.valor ASC",
            None => "e.data DESC, e.id DESC",
        };

        let limit = if filtro.limite.is_some() {
            " LIMIT ? OFFSET ?"
        } else {
            ""
        };

        let sql = format!("{SELECT_COLS} {where_clause} ORDER BY {order_by}{limit}");

        let mut query = sqlx::query(&sql);
        if let Some(tipo) = filtro.tipo {
            query = query.bind(tipo.as_str());
        }
        if let Some(inicio) = &filtro.data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = &filtro.data_fim {
            query = query.bind(fim);
        }
        if let (Some(mes), Some(ano)) = (filtro.mes, filtro.ano) {
            query = query.bind(ano).bind(mes);
        }
        if let Some(busca) = &filtro.busca {
            let pattern = format!("%{busca}%");
            query = query.bind(pattern.clone()).bind(pattern);
        }
        if let Some(limite) = filtro.limite {
            query = query.bind(limite).bind(filtro.offset.unwrap_or(0));
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(map_entrada).collect()
    }

    /// Apply a partial update. Returns false when no field was supplied or
    /// no row matched.
    pub async fn update(&self, id: i64, dados: &EntradaUpdate) -> Result<bool> {
        let mut sets: Vec<&str> = Vec::new();

        if dados.data.is_some() {
            sets.push("data = ?");
        }
        if dados.tipo.is_some() {
            sets.push("tipo = ?");
        }
        if dados.descricao.is_some() {
            sets.push("descricao = ?");
        }
        if dados.pessoa.is_some() {
            sets.push("pessoa = ?");
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

        let sql = format!("UPDATE entradas SET {} WHERE id = ?", sets.join(", "));

        let mut query = sqlx::query(&sql);
        if let Some(data) = &dados.data {
            query = query.bind(data);
        }
        if let Some(tipo) = dados.tipo {
            query = query.bind(tipo.as_str());
        }
        if let Some(descricao) = &dados.descricao {
            query = query.bind(descricao);
        }
        if let Some(pessoa) = &dados.pessoa {
            query = query.bind(pessoa);
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

    /// Hard delete.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entradas WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark as deleted without removing the row.
    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE entradas SET deleted_at = datetime('now') WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restore(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE entradas SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn total_por_periodo(
        &self,
        data_inicio: &str,
        data_fim: &str,
        tipo: Option<&str>,
    ) -> Result<f64> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(valor), 0.0) as total FROM entradas \
             WHERE data BETWEEN ? AND ? AND deleted_at IS NULL",
        );
        if tipo.is_some() {
            sql.push_str(" AND tipo = ?");
        }

        let mut query = sqlx::query(&sql).bind(data_inicio).bind(data_fim);
        if let Some(tipo) = tipo {
            query = query.bind(tipo);
        }

        let row = query.fetch_one(self.db.pool()).await?;
        Ok(row.get("total"))
    }

    pub async fn total_geral(&self) -> Result<f64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(valor), 0.0) as total FROM entradas WHERE deleted_at IS NULL",
        )
        .fetch_one(self.db.pool())
        .await?;
        Ok(row.get("total"))
    }

    pub async fn totais_por_tipo(
        &self,
        data_inicio: &str,
        data_fim: &str,
    ) -> Result<Vec<TotalPorTipo>> {
        let rows = sqlx::query(
            r#"
            SELECT tipo, COALESCE(SUM(valor), 0.0) as total, COUNT(*) as quantidade
            FROM entradas
            WHERE data BETWEEN ? AND ? AND deleted_at IS NULL
            GROUP BY tipo
            "#,
        )
        .bind(data_inicio)
        .bind(data_fim)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TotalPorTipo {
                tipo: row.get("tipo"),
                total: row.get("total"),
                quantidade: row.get("quantidade"),
            })
            .collect())
    }

    pub async fn contar(&self, filtro: &EntradaFiltro) -> Result<i64> {
        let mut clauses: Vec<&str> = Vec::new();

        if !filtro.incluir_deletados {
            clauses.push("deleted_at IS NULL");
        }
        if filtro.tipo.is_some() {
            clauses.push("tipo = ?");
        }
        if filtro.mes.is_some() && filtro.ano.is_some() {
            clauses.push(
                "CAST(strftime('%Y', data) AS INTEGER) = ? \
                 AND CAST(strftime('%m', data) AS INTEGER) = ?",
            );
        }
        if filtro.data_inicio.is_some() {
            clauses.push("data >= ?");
        }
        if filtro.data_fim.is_some() {
            clauses.push("data <= ?");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!("SELECT COUNT(*) as total FROM entradas {where_clause}");

        let mut query = sqlx::query(&sql);
        if let Some(tipo) = filtro.tipo {
            query = query.bind(tipo.as_str());
        }
        if let (Some(mes), Some(ano)) = (filtro.mes, filtro.ano) {
            query = query.bind(ano).bind(mes);
        }
        if let Some(inicio) = &filtro.data_inicio {
            query = query.bind(inicio);
        }
        if let Some(fim) = &filtro.data_fim {
            query = query.bind(fim);
        }

        let row = query.fetch_one(self.db.pool()).await?;
        Ok(row.get("total"))
    }

    /// Totals grouped by month for one year. Months without activity are
    /// absent here; the service zero-fills the full 12.
    pub async fn por_mes(&self, ano: i32) -> Result<Vec<TotalMensal>> {
        let rows = sqlx::query(
            r#"
            SELECT CAST(strftime('%m', data) AS INTEGER) as mes,
                   COALESCE(SUM(valor), 0.0) as total,
                   COUNT(*) as quantidade
            FROM entradas
            WHERE CAST(strftime('%Y', data) AS INTEGER) = ?
              AND deleted_at IS NULL
            GROUP BY mes
            ORDER BY mes
            "#,
        )
        .bind(ano)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| TotalMensal {
                mes: row.get::<i64, _>("mes") as u32,
                total: row.get("total"),
                quantidade: row.get("quantidade"),
            })
            .collect())
    }
}
