//! 库存处理器
//!
//! 只负责把产品库与查询引擎的结果转成 JSON，状态与金额都取自模型。

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    model::{Product, ProductDraft, ProductId, StockStatus},
    normalize::format_brl,
    query::{category_icon, Filters, InventoryStats, StatusFilter},
    service::ProductService,
};
use crate::core::{
    error::{CoreError, Result},
    response::ApiResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub product_service: Arc<Mutex<ProductService>>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(product_service: ProductService, page_size: usize) -> Self {
        Self {
            product_service: Arc::new(Mutex::new(product_service)),
            page_size,
        }
    }

    fn products(&self) -> Result<MutexGuard<'_, ProductService>> {
        self.product_service
            .lock()
            .map_err(|_| CoreError::Internal("product store lock poisoned".to_string()))
    }
}

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// 带派生字段的产品视图
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub status: StockStatus,
    pub status_label: &'static str,
    pub line_total: f64,
    /// `R$ 1.234,56`
    pub line_total_label: String,
    pub icon: &'static str,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let status = product.status();
        Self {
            status,
            status_label: status.label(),
            line_total: product.line_total(),
            line_total_label: format_brl(product.line_total()),
            icon: category_icon(&product.category),
            product,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductView>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct NextCode {
    pub code: String,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ProductPage>>> {
    let status_param = query.status.unwrap_or_default();
    let status = StatusFilter::parse(&status_param).ok_or_else(|| {
        CoreError::InvalidInput(vec![format!("Status inválido: {}", status_param)])
    })?;

    let filters = Filters {
        term: query.q.unwrap_or_default().trim().to_string(),
        category: query.category.unwrap_or_default(),
        status,
    };
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(state.page_size);

    let (result, total) = state.products()?.query(&filters, page, page_size);

    let message = if total == 0 {
        "Nenhum produto encontrado".to_string()
    } else {
        format!("{} produto(s) encontrado(s)", total)
    };

    Ok(Json(ApiResponse::success(
        ProductPage {
            items: result.items.into_iter().map(ProductView::from).collect(),
            page,
            page_size,
            total_pages: result.total_pages,
            total,
        },
        message,
    )))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductView>>> {
    let id = ProductId::from(id);
    let product = state
        .products()?
        .get_by_id(&id)
        .cloned()
        .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
    Ok(Json(ApiResponse::success(product.into(), "Produto encontrado")))
}

pub async fn next_code(State(state): State<AppState>) -> Result<Json<ApiResponse<NextCode>>> {
    let code = state.products()?.next_code();
    Ok(Json(ApiResponse::success(NextCode { code }, "Próximo código")))
}

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InventoryStats>>> {
    let stats = state.products()?.stats();
    Ok(Json(ApiResponse::success(stats, "Estatísticas do estoque")))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let product = state.products()?.create(draft)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(product.into(), "Produto cadastrado com sucesso")),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ApiResponse<ProductView>>> {
    let product = state.products()?.update(&ProductId::from(id), draft)?;
    Ok(Json(ApiResponse::success(
        product.into(),
        "Produto atualizado com sucesso",
    )))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductView>>> {
    let removed = state.products()?.delete(&ProductId::from(id))?;
    Ok(Json(ApiResponse::success(
        removed.into(),
        "Produto excluído com sucesso",
    )))
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let count = state.products()?.len();
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "products": count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
