//! HTTP surface: axum router, shared state, request-context resolution
//! and the domain-error-to-status mapping.

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use shared::ApiError;

use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::domain::acesso_service::{fingerprint, AcessoService};
use crate::domain::categoria_service::CategoriaService;
use crate::domain::contribuicao_service::ContribuicaoService;
use crate::domain::entrada_service::EntradaService;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::saida_service::SaidaService;
use crate::storage::DbConnection;

pub mod categoria_apis;
pub mod contribuicao_apis;
pub mod entrada_apis;
pub mod saida_apis;
pub mod token_apis;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub entradas: Arc<EntradaService>,
    pub saidas: Arc<SaidaService>,
    pub categorias: Arc<CategoriaService>,
    pub contribuicoes: Arc<ContribuicaoService>,
    pub acesso: Arc<AcessoService>,
}

impl AppState {
    pub fn new(db: DbConnection, config: AppConfig) -> Self {
        Self {
            config,
            entradas: Arc::new(EntradaService::new(db.clone())),
            saidas: Arc::new(SaidaService::new(db.clone())),
            categorias: Arc::new(CategoriaService::new(db.clone())),
            contribuicoes: Arc::new(ContribuicaoService::new(db.clone())),
            acesso: Arc::new(AcessoService::new(db)),
        }
    }
}

/// All /api routes.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/resumo", get(resumo_geral))
        .route(
            "/entradas",
            get(entrada_apis::list_entradas).post(entrada_apis::create_entrada),
        )
        .route("/entradas/resumo", get(entrada_apis::resumo_entradas))
        .route("/entradas/por-mes", get(entrada_apis::entradas_por_mes))
        .route(
            "/entradas/:id",
            get(entrada_apis::get_entrada)
                .put(entrada_apis::update_entrada)
                .delete(entrada_apis::delete_entrada),
        )
        .route("/entradas/:id/restore", post(entrada_apis::restore_entrada))
        .route(
            "/saidas",
            get(saida_apis::list_saidas).post(saida_apis::create_saida),
        )
        .route("/saidas/resumo", get(saida_apis::resumo_saidas))
        .route("/saidas/por-mes", get(saida_apis::saidas_por_mes))
        .route(
            "/saidas/:id",
            get(saida_apis::get_saida)
                .put(saida_apis::update_saida)
                .delete(saida_apis::delete_saida),
        )
        .route("/saidas/:id/restore", post(saida_apis::restore_saida))
        .route(
            "/categorias",
            get(categoria_apis::list_categorias).post(categoria_apis::create_categoria),
        )
        .route(
            "/categorias/:id",
            get(categoria_apis::get_categoria)
                .put(categoria_apis::update_categoria)
                .delete(categoria_apis::delete_categoria),
        )
        .route(
            "/categorias/:id/ativa",
            put(categoria_apis::set_categoria_ativa),
        )
        .route(
            "/categorias/:id/saidas/count",
            get(categoria_apis::contar_saidas_categoria),
        )
        .route("/pix/qrcode", post(contribuicao_apis::gerar_qrcode))
        .route(
            "/contribuicoes",
            get(contribuicao_apis::list_contribuicoes)
                .post(contribuicao_apis::submit_contribuicao),
        )
        .route(
            "/contribuicoes/pendentes/count",
            get(contribuicao_apis::count_pendentes),
        )
        .route(
            "/contribuicoes/:id",
            put(contribuicao_apis::update_contribuicao)
                .delete(contribuicao_apis::delete_contribuicao),
        )
        .route(
            "/contribuicoes/:id/aprovar",
            post(contribuicao_apis::aprovar_contribuicao),
        )
        .route(
            "/contribuicoes/:id/rejeitar",
            post(contribuicao_apis::rejeitar_contribuicao),
        )
        .route(
            "/tokens",
            get(token_apis::list_tokens).post(token_apis::create_token),
        )
        .route("/tokens/stats", get(token_apis::token_stats))
        .route("/tokens/purge", post(token_apis::purge_tokens))
        .route(
            "/tokens/:id",
            get(token_apis::get_token).delete(token_apis::delete_token),
        )
        .route("/tokens/:id/ativo", put(token_apis::set_token_ativo))
        .route(
            "/tokens/:id/visitantes",
            get(token_apis::list_visitantes),
        )
        .route(
            "/tokens/:id/visitantes/stats",
            get(token_apis::visitante_stats),
        )
        .route("/acesso/validar", post(token_apis::validar_acesso))
        .route(
            "/acesso/identificacao",
            post(token_apis::registrar_identificacao),
        )
}

/// Transparency dashboard: overall balance plus the latest movements of
/// each ledger.
#[derive(Debug, serde::Serialize)]
pub struct ResumoGeral {
    pub total_entradas: f64,
    pub total_saidas: f64,
    pub saldo: f64,
    pub ultimas_entradas: Vec<crate::domain::models::entrada::Entrada>,
    pub ultimas_saidas: Vec<crate::domain::models::saida::Saida>,
}

async fn resumo_geral(axum::extract::State(state): axum::extract::State<AppState>) -> Response {
    tracing::info!("GET /api/resumo");

    let resultado = async {
        let total_entradas = state.entradas.total_geral().await?;
        let total_saidas = state.saidas.total_geral().await?;
        Ok::<_, DomainError>(ResumoGeral {
            total_entradas,
            total_saidas,
            saldo: total_entradas - total_saidas,
            ultimas_entradas: state.entradas.ultimas(5).await?,
            ultimas_saidas: state.saidas.ultimas(5).await?,
        })
    }
    .await;

    match resultado {
        Ok(resumo) => Json(shared::ApiResponse::ok("Resumo geral", resumo)).into_response(),
        Err(e) => erro_response(e),
    }
}

/// Translate a domain error into the JSON error envelope with the status
/// its variant maps to.
pub fn erro_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::StateConflict(_) => StatusCode::CONFLICT,
        DomainError::Authorization(_) => StatusCode::FORBIDDEN,
        DomainError::Integrity(_) => {
            tracing::error!("internal error: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ApiError::new(err.to_string()))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the caller identity from request headers.
///
/// `x-usuario-id` marks an admin session (the reverse proxy in front of
/// the API is trusted to have authenticated it); otherwise a guest token
/// in `x-access-token` is validated and its visitor row resolved from the
/// header fingerprint. Anything else is anonymous.
pub async fn contexto(state: &AppState, headers: &HeaderMap) -> DomainResult<RequestContext> {
    if let Some(user_id) = header_str(headers, "x-usuario-id").and_then(|v| v.parse().ok()) {
        return Ok(RequestContext::admin(user_id));
    }

    if let Some(token) = header_str(headers, "x-access-token") {
        if let Some(acesso) = state.acesso.validate(token).await? {
            let user_agent = header_str(headers, "user-agent");
            let hash = fingerprint(
                user_agent,
                header_str(headers, "accept-language"),
                header_str(headers, "accept-encoding"),
            );
            let visitante = state
                .acesso
                .get_or_create_visitante(acesso.id, &hash, user_agent)
                .await?;
            return Ok(RequestContext::visitor(visitante.id));
        }
    }

    Ok(RequestContext::anonymous())
}

#[cfg(test)]
pub(crate) async fn estado_teste() -> (AppState, i64) {
    let db = DbConnection::init_test().await.expect("test database");
    let admin_id = db.insert_usuario("Admin").await.expect("insert admin");
    (AppState::new(db, AppConfig::from_env()), admin_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn erro_response_maps_variants_to_statuses() {
        let casos = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::StateConflict("x".into()), StatusCode::CONFLICT),
            (DomainError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (
                DomainError::Integrity("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, esperado) in casos {
            let resp = erro_response(err);
            assert_eq!(resp.status(), esperado);

            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["success"], false);
            assert_eq!(json["message"], "x");
        }
    }

    #[tokio::test]
    async fn contexto_resolves_admin_header() {
        let (state, admin_id) = estado_teste().await;

        let mut headers = HeaderMap::new();
        headers.insert("x-usuario-id", admin_id.to_string().parse().unwrap());

        let ctx = contexto(&state, &headers).await.unwrap();
        assert!(ctx.is_admin);
        assert_eq!(ctx.user_id, Some(admin_id));
    }

    #[tokio::test]
    async fn contexto_resolves_guest_token_to_visitor() {
        let (state, admin_id) = estado_teste().await;
        let admin = RequestContext::admin(admin_id);

        let token = state
            .acesso
            .issue(&admin, "Convidado", Some(7))
            .await
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-access-token", token.token.parse().unwrap());
        headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());

        let ctx = contexto(&state, &headers).await.unwrap();
        assert!(!ctx.is_admin);
        assert!(ctx.token_session);
        assert!(ctx.visitor_id.is_some());

        // Same headers map to the same visitor row
        let de_novo = contexto(&state, &headers).await.unwrap();
        assert_eq!(de_novo.visitor_id, ctx.visitor_id);
    }

    #[tokio::test]
    async fn contexto_falls_back_to_anonymous() {
        let (state, _) = estado_teste().await;

        let ctx = contexto(&state, &HeaderMap::new()).await.unwrap();
        assert_eq!(ctx, RequestContext::anonymous());

        let mut headers = HeaderMap::new();
        headers.insert("x-access-token", "invalido".parse().unwrap());
        let ctx = contexto(&state, &headers).await.unwrap();
        assert_eq!(ctx, RequestContext::anonymous());
    }
}
