//! 库存模块：产品库、查询引擎与 HTTP 适配层

pub mod handler;
pub mod model;
pub mod normalize;
pub mod query;
pub mod service;

pub use model::{Product, ProductDraft, ProductId, StockStatus};
pub use normalize::NumericInput;
pub use query::{Filters, InventoryStats, Page, StatusFilter};
pub use service::ProductService;
