//! SQLite connection management and schema bootstrap.

use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

/// DbConnection wraps the shared connection pool. Constructed once at
/// startup and injected into every repository; there is no global handle.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection, creating the database file and
    /// schema when missing.
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Admin accounts are managed by the auth collaborator; only the id
        // and display name are needed here for creator/approver joins.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usuarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL,
                criado_em TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entradas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                tipo TEXT NOT NULL,
                descricao TEXT NOT NULL,
                pessoa TEXT,
                valor REAL NOT NULL,
                observacoes TEXT,
                criado_por INTEGER NOT NULL,
                criado_em TEXT NOT NULL DEFAULT (datetime('now')),
                deleted_at TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_entradas_data ON entradas(data);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categorias (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL,
                descricao TEXT,
                cor TEXT NOT NULL DEFAULT '#6B7280',
                icone TEXT NOT NULL DEFAULT 'fa-folder',
                ativa INTEGER NOT NULL DEFAULT 1,
                criado_em TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saidas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                tipo TEXT NOT NULL,
                categoria_id INTEGER NOT NULL REFERENCES categorias (id),
                item TEXT NOT NULL,
                valor REAL NOT NULL,
                fornecedor TEXT,
                observacoes TEXT,
                nao_contabilizar INTEGER NOT NULL DEFAULT 0,
                criado_por INTEGER NOT NULL,
                criado_em TEXT NOT NULL DEFAULT (datetime('now')),
                deleted_at TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_saidas_data ON saidas(data);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_saidas_categoria ON saidas(categoria_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contribuicoes_pendentes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome_doador TEXT,
                nome_sessao TEXT,
                exibir_anonimo INTEGER NOT NULL DEFAULT 0,
                valor REAL NOT NULL,
                observacoes TEXT,
                status TEXT NOT NULL DEFAULT 'pendente',
                aprovado_por INTEGER,
                aprovado_em TEXT,
                entrada_id INTEGER REFERENCES entradas (id),
                criado_em TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_contribuicoes_status
            ON contribuicoes_pendentes(status);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tokens_acesso (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                nome_convidado TEXT NOT NULL,
                ativo INTEGER NOT NULL DEFAULT 1,
                expira_em TEXT,
                ultimo_acesso TEXT,
                criado_por INTEGER NOT NULL,
                criado_em TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visitantes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token_id INTEGER NOT NULL REFERENCES tokens_acesso (id),
                visitante_hash TEXT NOT NULL,
                nome TEXT,
                respondeu_modal INTEGER NOT NULL DEFAULT 0,
                primeiro_acesso TEXT NOT NULL,
                ultimo_acesso TEXT NOT NULL,
                total_acessos INTEGER NOT NULL DEFAULT 1,
                user_agent TEXT,
                UNIQUE (token_id, visitante_hash)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Insert an admin display name, returning its id. Used by tests and
    /// first-run seeding; account management itself lives outside this
    /// service.
    pub async fn insert_usuario(&self, nome: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO usuarios (nome) VALUES (?)")
            .bind(nome)
            .execute(&*self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// First-run seeding: create the named admin account if the usuarios
    /// table is still empty, returning the id of the first account.
    pub async fn seed_admin(&self, nome: &str) -> Result<i64> {
        let existente: Option<i64> =
            sqlx::query_scalar("SELECT id FROM usuarios ORDER BY id LIMIT 1")
                .fetch_optional(&*self.pool)
                .await?;

        match existente {
            Some(id) => Ok(id),
            None => self.insert_usuario(nome).await,
        }
    }
}
