//! # 库存管理
//!
//! 产品库存的数据层与查询引擎：
//! - 产品增删改查，每次变更后整体写回键值存储
//! - 数量与本地化金额的规范化
//! - 库存状态分类、关键字/分类/状态过滤、分页与统计
//! - 基于 Axum 的 JSON 接口

pub mod app;
pub mod core;
pub mod infrastructure;

pub use crate::core::error::{CoreError, Result};
pub use app::inventory::{
    Filters, InventoryStats, NumericInput, Page, Product, ProductDraft, ProductId,
    ProductService, StatusFilter, StockStatus,
};
