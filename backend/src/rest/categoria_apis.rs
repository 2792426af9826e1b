//! Handlers for expense categories.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::{ApiResponse, CreateCategoriaRequest, UpdateCategoriaRequest};
use tracing::info;

use super::{contexto, erro_response, AppState};
use crate::domain::error::DomainError;
use crate::domain::models::categoria::{CategoriaFiltro, CategoriaUpdate, NovaCategoria};

#[derive(Deserialize, Debug, Default)]
pub struct CategoriaListQuery {
    pub busca: Option<String>,
    #[serde(default)]
    pub incluir_inativas: bool,
}

#[derive(Deserialize, Debug)]
pub struct SetAtivaRequest {
    pub ativa: bool,
}

pub async fn list_categorias(
    State(state): State<AppState>,
    Query(query): Query<CategoriaListQuery>,
) -> Response {
    info!("GET /api/categorias - query: {:?}", query);

    let filtro = CategoriaFiltro {
        busca: query.busca,
        incluir_inativas: query.incluir_inativas,
    };

    match state.categorias.list(&filtro).await {
        Ok(categorias) => Json(ApiResponse::ok("Categorias listadas", categorias)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn create_categoria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateCategoriaRequest>,
) -> Response {
    info!("POST /api/categorias - nome: {}", request.nome);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let nova = NovaCategoria {
        nome: request.nome,
        descricao: request.descricao,
        cor: request.cor,
        icone: request.icone,
    };

    match state.categorias.create(&ctx, nova).await {
        Ok(categoria) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok("Categoria criada com sucesso", categoria)),
        )
            .into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn get_categoria(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    info!("GET /api/categorias/{id}");

    match state.categorias.get(id).await {
        Ok(categoria) => Json(ApiResponse::ok("Categoria encontrada", categoria)).into_response(),
        Err(e) => erro_response(e),
    }
}

pub async fn update_categoria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoriaRequest>,
) -> Response {
    info!("PUT /api/categorias/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    let dados = CategoriaUpdate {
        nome: request.nome,
        descricao: request.descricao,
        cor: request.cor,
        icone: request.icone,
        ativa: request.ativa,
    };

    match state.categorias.update(&ctx, id, dados).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Categoria atualizada")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!(
            "Categoria não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

/// Reversible alternative to deletion.
pub async fn set_categoria_ativa(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<SetAtivaRequest>,
) -> Response {
    info!("PUT /api/categorias/{id}/ativa - {}", request.ativa);

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.categorias.set_ativa(&ctx, id, request.ativa).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Categoria atualizada")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!(
            "Categoria não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}

/// Count of non-deleted saídas in the category, for display next to it.
pub async fn contar_saidas_categoria(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    info!("GET /api/categorias/{id}/saidas/count");

    match state.categorias.contar_saidas(id).await {
        Ok(total) => Json(ApiResponse::ok("Saídas contadas", total)).into_response(),
        Err(e) => erro_response(e),
    }
}

/// Hard delete; refused while saídas still reference the category.
pub async fn delete_categoria(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    info!("DELETE /api/categorias/{id}");

    let ctx = match contexto(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(e) => return erro_response(e),
    };

    match state.categorias.delete(&ctx, id).await {
        Ok(true) => Json(ApiResponse::<()>::ok_empty("Categoria excluída")).into_response(),
        Ok(false) => erro_response(DomainError::NotFound(format!(
            "Categoria não encontrada: {id}"
        ))),
        Err(e) => erro_response(e),
    }
}
