//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::infrastructure::storage::StorageError;

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("produto não encontrado: {0}")]
    NotFound(String),
    #[error("dados inválidos: {}", .0.join("; "))]
    InvalidInput(Vec<String>),
    #[error("falha ao persistir: {0}")]
    Persistence(String),
    #[error("erro interno: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        CoreError::InvalidInput(validation_messages(&err))
    }
}

/// 展开字段校验错误为可读消息，按字段名排序
pub fn validation_messages(err: &validator::ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = err.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(_, errors)| {
            errors.iter().map(|error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| "Campo inválido".to_string())
            })
        })
        .collect()
}

/// 错误响应结构
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub messages: Vec<String>,
    pub code: u16,
    pub timestamp: String,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, error_code, messages) = match self {
            CoreError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                vec![format!("Produto não encontrado: {}", id)],
            ),
            CoreError::InvalidInput(messages) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", messages)
            }
            CoreError::Persistence(msg) => {
                error!("Persistence error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    vec!["Erro ao salvar produtos. Tente novamente.".to_string()],
                )
            }
            CoreError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    vec!["Erro interno".to_string()],
                )
            }
        };

        let error_response = ErrorResponse {
            success: false,
            error: error_code.to_string(),
            messages,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}
