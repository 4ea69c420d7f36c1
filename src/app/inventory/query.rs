//! 查询引擎：状态分类、过滤、分页与统计
//!
//! 这里的函数都不修改产品列表，只返回派生视图。

use serde::Serialize;
use tracing::debug;

use super::model::{Product, StockStatus};

/// 根据数量与最低库存分类；按严重程度依次判断，先命中者优先
pub fn classify_status(quantity: u32, minimum_stock: u32) -> StockStatus {
    if quantity == 0 {
        StockStatus::OutOfStock
    } else if quantity <= minimum_stock {
        StockStatus::Critical
    } else if f64::from(quantity) <= f64::from(minimum_stock) * 1.5 {
        StockStatus::Low
    } else {
        StockStatus::Ok
    }
}

/// `P` + 四位补零序号
pub fn format_code(sequence: u64) -> String {
    format!("P{:04}", sequence)
}

/// 由当前列表长度生成下一个编码
pub fn generate_code(current_count: usize) -> String {
    format_code(current_count as u64 + 1)
}

/// 解析 `P0012` 形式编码中的序号
pub fn code_sequence(code: &str) -> Option<u64> {
    let digits = code.strip_prefix('P')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 状态过滤条件，`"all"` 表示不过滤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(StockStatus),
}

impl StatusFilter {
    /// 空字符串与 `"all"` 都视为不过滤；未知取值返回 `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "all" => Some(StatusFilter::All),
            other => StockStatus::parse(other).map(StatusFilter::Only),
        }
    }

    pub fn matches(&self, status: StockStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// 组合过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub term: String,
    pub category: String,
    pub status: StatusFilter,
}

/// 任一字段包含关键字即命中（不区分大小写）
pub fn matches_term(product: &Product, needle_lower: &str) -> bool {
    product.name.to_lowercase().contains(needle_lower)
        || product.code.to_lowercase().contains(needle_lower)
        || product.category.to_lowercase().contains(needle_lower)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle_lower))
}

/// 关键字搜索，空白关键字返回全部
pub fn search<'a, I>(products: I, term: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    if term.trim().is_empty() {
        return products.into_iter().collect();
    }
    let needle = term.to_lowercase();
    products
        .into_iter()
        .filter(|p| matches_term(p, &needle))
        .collect()
}

/// 分类精确匹配（不区分大小写），空分类不过滤
pub fn filter_category<'a, I>(products: I, category: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    if category.is_empty() {
        return products.into_iter().collect();
    }
    let wanted = category.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.category.to_lowercase() == wanted)
        .collect()
}

pub fn filter_status<'a, I>(products: I, status: StatusFilter) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .filter(|p| status.matches(p.status()))
        .collect()
}

/// 依次应用关键字、分类、状态过滤
pub fn apply_filters<'a>(products: &'a [Product], filters: &Filters) -> Vec<&'a Product> {
    let matched = search(products, &filters.term);
    let matched = filter_category(matched, &filters.category);
    let matched = filter_status(matched, filters.status);
    debug!(
        term = %filters.term,
        category = %filters.category,
        status = ?filters.status,
        total = products.len(),
        matched = matched.len(),
        "filters applied"
    );
    matched
}

/// 一页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: usize,
}

/// 页码从 1 开始；越界页返回空列表，不做修正
pub fn paginate<T: Clone>(items: &[T], page_number: usize, page_size: usize) -> Page<T> {
    if page_size == 0 {
        return Page {
            items: Vec::new(),
            total_pages: 0,
        };
    }

    let total_pages = items.len().div_ceil(page_size);
    let page_items = match page_number.checked_sub(1) {
        Some(index) => {
            let start = index.saturating_mul(page_size);
            let end = start.saturating_add(page_size).min(items.len());
            if start < items.len() {
                items[start..end].to_vec()
            } else {
                Vec::new()
            }
        }
        None => Vec::new(),
    };

    Page {
        items: page_items,
        total_pages,
    }
}

/// 库存概况
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryStats {
    pub total_products: usize,
    /// Σ 数量 × 成本价
    pub total_value: f64,
    pub low_stock: usize,
    pub critical_stock: usize,
    pub out_of_stock: usize,
}

pub fn stats(products: &[Product]) -> InventoryStats {
    products
        .iter()
        .fold(InventoryStats::default(), |mut acc, product| {
            acc.total_products += 1;
            acc.total_value += product.line_total();
            match product.status() {
                StockStatus::Low => acc.low_stock += 1,
                StockStatus::Critical => acc.critical_stock += 1,
                StockStatus::OutOfStock => acc.out_of_stock += 1,
                StockStatus::Ok => {}
            }
            acc
        })
}

/// 分类图标
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Telas" => "📱",
        "Baterias" => "🔋",
        "Câmeras" => "📷",
        "Conectores" => "🔌",
        "Alto-falantes" => "🔊",
        "Outros" => "🛠️",
        _ => "📦",
    }
}
