//! Handlers for guest access tokens and visitor identities.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, CreateTokenRequest, IdentificacaoRequest};
use tracing::info;

use super::{contexto, erro_response, AppState};
use crate::domain::error::DomainError;

#[derive(Deserialize, Debug, Default)]
pub struct TokenListQuery {
    #[serde(default)]
    pub apenas_ativos: bool,
}

#[derive(Deserialize, Debug)]
pub struct SetAtivoRequest {
    pub ativo: bool,
}

#[derive(Deserialize, Debug)]
pub struct ValidarAcessoRequest {
    pub token: String,
}

pub async fn create_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTokenRequest>,
) -> Response {
    info!("POST /api/tokens - convidado: {}", request.nome_convidado);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state
        .acesso
        .issue(&ctx, &request.nome_convidado, request.dias_validade)
        .await
    {
        Ok(token) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok("Token criado com sucesso", token)),
        )
            .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn list_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenListQuery>,
) -> Response {
    info!("GET /api/tokens - apenas_ativos: {}", query.apenas_ativos);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.list(&ctx, query.apenas_ativos).await {
        Ok(tokens) => Json(ApiResponse::ok("Tokens listados", tokens)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn get_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("GET /api/tokens/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.get(&ctx, id).await {
        Ok(token) => Json(ApiResponse::ok("Token encontrado", token)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn set_token_ativo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<SetAtivoRequest>,
) -> Response {
    info!("PUT /api/tokens/{id}/ativo - {}", request.ativo);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.set_ativo(&ctx, id, request.ativo).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Token atualizado")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!("Token não encontrado: {id}"))),
        Err(e) => erro_response(e),
    }
}

pub async fn delete_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("DELETE /api/tokens/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.delete(&ctx, id).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Token excluído")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!("Token não encontrado: {id}"))),
        Err(e) => erro_response(e),
    }
}

pub async fn purge_tokens(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("POST /api/tokens/purge");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.purge_expired(&ctx).await {
        Ok(removidos) => Json(ApiResponse::ok("Tokens expirados removidos", removidos)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn token_stats(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.stats(&ctx).await {
        Ok(stats) => Json(ApiResponse::ok("Estatísticas de tokens", stats)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn list_visitantes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("GET /api/tokens/{id}/visitantes");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.visitantes_do_token(&ctx, id).await {
        Ok(visitantes) => Json(ApiResponse::ok("Visitantes listados", visitantes)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn visitante_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.acesso.stats_do_token(&ctx, id).await {
        Ok(stats) => Json(ApiResponse::ok("Estatísticas de visitantes", stats)).into_response(),
        Err(e) => erro_response(e),
    }
}

/// Entry point of the guest flow: validate a presented token and resolve
/// the caller's visitor row. A valid token comes back with the visitor
/// record; invalid, inactive or expired ones get a 403.
pub async fn validar_acesso(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ValidarAcessoRequest>,
) -> Response {
    info!("POST /api/acesso/validar");

    let acesso = match state.acesso.validate(&request.token).await {
        Ok(Some(acesso)) => acesso,
        Ok(None) => {
            return erro_response(DomainError::Authorization(
                "Token de acesso inválido ou expirado".into(),
            ))
        }
        Err(e) => return erro_response(e),
    };

    let user_agent = headers.get("user-agent").and_then(|v| v.to_str().ok());
    let hash = crate::domain::acesso_service::fingerprint(
        user_agent,
        headers.get("accept-language").and_then(|v| v.to_str().ok()),
        headers.get("accept-encoding").and_then(|v| v.to_str().ok()),
    );

    match state
        .acesso
        .get_or_create_visitante(acesso.id, &hash, user_agent)
        .await
    {
        Ok(visitante) => Json(ApiResponse::ok("Acesso liberado", visitante)).into_response(),
        Err(e) => erro_response(e),
    }
}

/// Answer to the one-time identification prompt shown to visitors.
pub async fn registrar_identificacao(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<IdentificacaoRequest>,
) -> Response {
    info!("POST /api/acesso/identificacao");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let Some(visitor_id) = ctx.visitor_id else {
        return erro_response(DomainError::Authorization(
            "Token de acesso inválido ou expirado".into(),
        ));
    };

    match state
        .acesso
        .record_identification(visitor_id, request.nome.as_deref())
        .await
    {
        Ok(visitante) => Json(ApiResponse::ok("Identificação registrada", visitante)).into_response(),
        Err(e) => erro_response(e),
    }
}
