//! 库存数据模型
//!
//! 字段名与旧版快照保持一致（`codigo`、`nome`、`precoCusto` ……），
//! 已有数据可以原样读取。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::normalize::{
    count_or_zero, currency_or_zero, lenient_amount, lenient_count, NumericInput,
};
use super::query::classify_status;
use crate::core::error::{validation_messages, CoreError, Result};

/// 产品标识，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 库存状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "sem_estoque")]
    OutOfStock,
    #[serde(rename = "critico")]
    Critical,
    #[serde(rename = "baixo")]
    Low,
    #[serde(rename = "ok")]
    Ok,
}

impl StockStatus {
    pub const ALL: [StockStatus; 4] = [
        StockStatus::OutOfStock,
        StockStatus::Critical,
        StockStatus::Low,
        StockStatus::Ok,
    ];

    /// 过滤参数中使用的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "sem_estoque",
            StockStatus::Critical => "critico",
            StockStatus::Low => "baixo",
            StockStatus::Ok => "ok",
        }
    }

    /// 界面显示文本
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Sem Estoque",
            StockStatus::Critical => "Crítico",
            StockStatus::Low => "Baixo",
            StockStatus::Ok => "OK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// 产品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "quantidade", default, deserialize_with = "lenient_count")]
    pub quantity: u32,
    #[serde(rename = "estoqueMinimo", default, deserialize_with = "lenient_count")]
    pub minimum_stock: u32,
    #[serde(rename = "precoCusto", default, deserialize_with = "lenient_amount")]
    pub cost_price: f64,
    #[serde(rename = "precoVenda", default, deserialize_with = "lenient_amount")]
    pub sale_price: f64,
    #[serde(rename = "fornecedor", default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(rename = "localizacao", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "dataCadastro")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "dataAtualizacao")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 由草稿构建新记录，数值字段在此规范化
    pub fn from_draft(
        id: ProductId,
        code: String,
        draft: &ProductDraft,
        now: DateTime<Utc>,
    ) -> Self {
        let mut product = Self {
            id,
            code,
            name: String::new(),
            category: String::new(),
            description: None,
            quantity: 0,
            minimum_stock: 0,
            cost_price: 0.0,
            sale_price: 0.0,
            supplier: None,
            location: None,
            created_at: now,
            updated_at: now,
        };
        product.apply_draft(draft);
        product
    }

    /// 用草稿替换可编辑字段；`id`、`code` 与时间戳不变
    pub fn apply_draft(&mut self, draft: &ProductDraft) {
        self.name = draft.name.trim().to_string();
        self.category = draft.category.trim().to_string();
        self.description = non_blank(draft.description.as_deref());
        self.quantity = count_or_zero(draft.quantity.as_ref());
        self.minimum_stock = count_or_zero(draft.minimum_stock.as_ref());
        self.cost_price = currency_or_zero(draft.cost_price.as_ref());
        self.sale_price = currency_or_zero(draft.sale_price.as_ref());
        self.supplier = non_blank(draft.supplier.as_deref());
        self.location = non_blank(draft.location.as_deref());
    }

    pub fn status(&self) -> StockStatus {
        classify_status(self.quantity, self.minimum_stock)
    }

    /// 库存金额 = 数量 × 成本价
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.cost_price
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 用户提交的产品字段
///
/// 字段名沿用旧表单（`nome`、`categoria` ……），同时接受英文别名。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    #[serde(rename = "codigo", alias = "code")]
    pub code: Option<String>,
    #[serde(rename = "nome", alias = "name")]
    pub name: String,
    #[serde(rename = "categoria", alias = "category")]
    pub category: String,
    #[serde(rename = "descricao", alias = "description")]
    pub description: Option<String>,
    #[serde(rename = "quantidade", alias = "quantity")]
    pub quantity: Option<NumericInput>,
    #[serde(rename = "estoqueMinimo", alias = "minimumStock")]
    pub minimum_stock: Option<NumericInput>,
    #[serde(rename = "precoCusto", alias = "costPrice")]
    pub cost_price: Option<NumericInput>,
    #[serde(rename = "precoVenda", alias = "salePrice")]
    pub sale_price: Option<NumericInput>,
    #[serde(rename = "fornecedor", alias = "supplier")]
    pub supplier: Option<String>,
    #[serde(rename = "localizacao", alias = "location")]
    pub location: Option<String>,
}

#[derive(Validate)]
struct RequiredFields {
    #[validate(length(min = 1, message = "Categoria é obrigatória"))]
    category: String,
    #[validate(length(min = 1, message = "Nome do produto é obrigatório"))]
    name: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// 提交前校验，失败时返回全部错误消息
    pub fn check(&self) -> Result<()> {
        let required = RequiredFields {
            category: self.category.trim().to_string(),
            name: self.name.trim().to_string(),
        };
        let mut messages = match required.validate() {
            Ok(()) => Vec::new(),
            Err(e) => validation_messages(&e),
        };

        let negative_count = |input: &Option<NumericInput>| {
            matches!(input.as_ref().and_then(NumericInput::signed_count), Some(n) if n < 0)
        };
        let negative_amount = |input: &Option<NumericInput>| {
            matches!(input, Some(NumericInput::Number(n)) if *n < 0.0)
        };

        if negative_count(&self.quantity) {
            messages.push("Quantidade não pode ser negativa".to_string());
        }
        if negative_count(&self.minimum_stock) {
            messages.push("Estoque mínimo não pode ser negativo".to_string());
        }
        if negative_amount(&self.cost_price) {
            messages.push("Preço de custo não pode ser negativo".to_string());
        }
        if negative_amount(&self.sale_price) {
            messages.push("Preço de venda não pode ser negativo".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidInput(messages))
        }
    }

    /// 非空白的自带编码
    pub fn supplied_code(&self) -> Option<&str> {
        self.code.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_legacy_snapshot_record() {
        let legacy = json!({
            "id": "lk3j2h1abc",
            "codigo": "P0001",
            "nome": "Bateria X",
            "categoria": "Baterias",
            "descricao": "",
            "quantidade": 7,
            "estoqueMinimo": 5,
            "precoCusto": 12.5,
            "precoVenda": 30,
            "fornecedor": "ACME",
            "dataCadastro": "2024-03-01T10:00:00.000Z",
            "dataAtualizacao": "2024-03-02T10:00:00.000Z",
            "extra": true
        });

        let product: Product = serde_json::from_value(legacy).unwrap();
        assert_eq!(product.id.as_str(), "lk3j2h1abc");
        assert_eq!(product.code, "P0001");
        assert_eq!(product.sale_price, 30.0);
        assert_eq!(product.location, None);
        assert_eq!(product.line_total(), 87.5);
        assert_eq!(product.status(), StockStatus::Low);
    }

    #[test]
    fn test_serializes_legacy_field_names() {
        let draft = ProductDraft::new("Tela Y", "Telas");
        let product = Product::from_draft(ProductId::from("a"), "P0001".into(), &draft, Utc::now());
        let value = serde_json::to_value(&product).unwrap();

        let fields = [
            "id",
            "codigo",
            "nome",
            "categoria",
            "quantidade",
            "estoqueMinimo",
            "precoCusto",
            "precoVenda",
            "dataCadastro",
            "dataAtualizacao",
        ];
        for field in fields {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
        assert!(value.get("descricao").is_none());
    }

    #[test]
    fn test_from_draft_normalizes() {
        let draft = ProductDraft {
            code: None,
            name: "  Conector USB-C ".into(),
            category: "Conectores".into(),
            description: Some("   ".into()),
            quantity: Some("15 un".into()),
            minimum_stock: Some("abc".into()),
            cost_price: Some("R$ 1.234,56".into()),
            sale_price: Some("abc".into()),
            supplier: Some("Fornecedor A".into()),
            location: None,
        };
        let now = Utc::now();
        let product = Product::from_draft(ProductId::new(), "P0001".into(), &draft, now);

        assert_eq!(product.name, "Conector USB-C");
        assert_eq!(product.description, None);
        assert_eq!(product.quantity, 15);
        assert_eq!(product.minimum_stock, 0);
        assert_eq!(product.cost_price, 1234.56);
        assert_eq!(product.sale_price, 0.0);
        assert_eq!(product.supplier.as_deref(), Some("Fornecedor A"));
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
    }

    #[test]
    fn test_check_reports_all_problems() {
        let draft = ProductDraft {
            name: "   ".into(),
            quantity: Some("-1".into()),
            sale_price: Some(NumericInput::Number(-3.0)),
            ..ProductDraft::default()
        };

        match draft.check() {
            Err(CoreError::InvalidInput(messages)) => {
                assert!(messages.contains(&"Nome do produto é obrigatório".to_string()));
                assert!(messages.contains(&"Categoria é obrigatória".to_string()));
                assert!(messages.contains(&"Quantidade não pode ser negativa".to_string()));
                assert!(messages.contains(&"Preço de venda não pode ser negativo".to_string()));
                assert_eq!(messages.len(), 4);
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_check_accepts_minimal_draft() {
        assert!(ProductDraft::new("Tela", "Telas").check().is_ok());
    }

    #[test]
    fn test_draft_accepts_english_aliases() {
        let draft: ProductDraft = serde_json::from_value(json!({
            "name": "Bateria",
            "category": "Baterias",
            "quantity": 3,
            "costPrice": "10,00"
        }))
        .unwrap();
        assert_eq!(draft.name, "Bateria");
        assert_eq!(draft.quantity, Some(NumericInput::Number(3.0)));
        assert_eq!(draft.supplied_code(), None);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(StockStatus::parse("critico"), Some(StockStatus::Critical));
        assert_eq!(StockStatus::parse("all"), None);
        assert_eq!(StockStatus::OutOfStock.label(), "Sem Estoque");
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"sem_estoque\""
        );
    }
}
