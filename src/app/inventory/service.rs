//! 产品库：内存中的权威列表，每次变更后整体写回持久化存储

use chrono::Utc;
use tracing::{info, warn};

use super::model::{Product, ProductDraft, ProductId};
use super::query::{self, code_sequence, format_code, Filters, InventoryStats, Page};
use crate::core::error::{CoreError, Result};
use crate::infrastructure::config::CodeStrategy;
use crate::infrastructure::storage::KeyValueStore;

pub struct ProductService {
    storage: Box<dyn KeyValueStore>,
    key: String,
    strategy: CodeStrategy,
    products: Vec<Product>,
    /// 仅 `Monotonic` 策略使用：下一个待分配的序号
    next_sequence: u64,
}

impl ProductService {
    pub fn new(storage: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::with_strategy(storage, key, CodeStrategy::default())
    }

    pub fn with_strategy(
        storage: Box<dyn KeyValueStore>,
        key: impl Into<String>,
        strategy: CodeStrategy,
    ) -> Self {
        Self {
            storage,
            key: key.into(),
            strategy,
            products: Vec::new(),
            next_sequence: 1,
        }
    }

    fn sequence_key(&self) -> String {
        format!("{}.seq", self.key)
    }

    /// 重新读取快照并替换内存列表；快照缺失或损坏时得到空列表
    pub fn load(&mut self) -> &[Product] {
        self.products = match self.storage.load(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Product>>(&raw) {
                Ok(products) => products,
                Err(e) => {
                    warn!(
                        key = %self.key,
                        error = %e,
                        "malformed product snapshot, starting empty"
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "failed to read product snapshot, starting empty"
                );
                Vec::new()
            }
        };

        if self.strategy == CodeStrategy::Monotonic {
            self.next_sequence = self.seed_sequence();
        }

        info!(key = %self.key, count = self.products.len(), "products loaded");
        &self.products
    }

    fn seed_sequence(&self) -> u64 {
        let stored = match self.storage.load(&self.sequence_key()) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read code sequence");
                None
            }
        };
        let highest = self
            .products
            .iter()
            .filter_map(|p| code_sequence(&p.code))
            .max()
            .unwrap_or(0);
        let by_length = self.products.len() as u64 + 1;

        stored.unwrap_or(0).max(highest + 1).max(by_length)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// 下一次 `create` 会分配的编码
    pub fn next_code(&self) -> String {
        match self.strategy {
            CodeStrategy::ListLength => query::generate_code(self.products.len()),
            CodeStrategy::Monotonic => format_code(self.next_sequence),
        }
    }

    fn fresh_id(&self) -> ProductId {
        loop {
            let id = ProductId::new();
            if self.get_by_id(&id).is_none() {
                return id;
            }
        }
    }

    /// 先写入新列表，成功后才替换内存状态
    fn commit(&mut self, products: Vec<Product>) -> Result<()> {
        let raw = serde_json::to_string(&products)
            .map_err(|e| CoreError::Internal(format!("serialize products: {}", e)))?;
        self.storage.save(&self.key, &raw)?;
        self.products = products;
        Ok(())
    }

    pub fn create(&mut self, draft: ProductDraft) -> Result<Product> {
        draft.check()?;

        let code = match draft.supplied_code() {
            Some(code) => code.to_string(),
            None => self.next_code(),
        };

        let product = Product::from_draft(self.fresh_id(), code, &draft, Utc::now());
        let mut products = self.products.clone();
        products.push(product.clone());
        self.commit(products)?;

        if self.strategy == CodeStrategy::Monotonic {
            // 手工填写的 `P####` 编码同样占用序号
            if let Some(sequence) = code_sequence(&product.code) {
                self.bump_sequence_past(sequence);
            }
        }

        info!(id = %product.id, code = %product.code, name = %product.name, "product created");
        Ok(product)
    }

    fn bump_sequence_past(&mut self, used: u64) {
        let next = used.saturating_add(1);
        if next <= self.next_sequence {
            return;
        }
        self.next_sequence = next;
        let key = self.sequence_key();
        if let Err(e) = self.storage.save(&key, &self.next_sequence.to_string()) {
            // 内存中的序号仍然递增，重启时会从现有编码重新推算
            warn!(error = %e, "failed to persist code sequence");
        }
    }

    /// 替换除 `id`、`code`、`createdAt` 之外的字段
    pub fn update(&mut self, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        let Some(index) = self.products.iter().position(|p| &p.id == id) else {
            warn!(%id, "update of unknown product");
            return Err(CoreError::NotFound(id.to_string()));
        };
        draft.check()?;

        let mut products = self.products.clone();
        let product = &mut products[index];
        product.apply_draft(&draft);
        product.updated_at = Utc::now().max(product.updated_at).max(product.created_at);
        let updated = product.clone();

        self.commit(products)?;

        info!(id = %updated.id, name = %updated.name, "product updated");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &ProductId) -> Result<Product> {
        let Some(index) = self.products.iter().position(|p| &p.id == id) else {
            warn!(%id, "delete of unknown product");
            return Err(CoreError::NotFound(id.to_string()));
        };

        let mut products = self.products.clone();
        let removed = products.remove(index);
        self.commit(products)?;

        info!(id = %removed.id, name = %removed.name, "product removed");
        Ok(removed)
    }

    pub fn get_by_id(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&Product> {
        query::search(&self.products, term)
    }

    pub fn filter(&self, filters: &Filters) -> Vec<&Product> {
        query::apply_filters(&self.products, filters)
    }

    /// 过滤后取一页，同时返回过滤后的总数
    pub fn query(
        &self,
        filters: &Filters,
        page: usize,
        page_size: usize,
    ) -> (Page<Product>, usize) {
        let matched: Vec<Product> = self.filter(filters).into_iter().cloned().collect();
        let total = matched.len();
        (query::paginate(&matched, page, page_size), total)
    }

    pub fn stats(&self) -> InventoryStats {
        query::stats(&self.products)
    }
}
