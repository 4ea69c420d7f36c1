use anyhow::Context;
use estoque::app::{self, inventory::handler::AppState};
use estoque::infrastructure::{
    config::{load_config, StorageBackend},
    logger::Logger,
    storage::{FileStore, KeyValueStore, MemoryStore},
};
use estoque::ProductService;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_path) = load_config().context("无法加载配置")?;
    Logger::init(&config.logging);

    match &config_path {
        Some(path) => info!("从配置文件加载: {}", path.display()),
        None => info!("未找到配置文件，使用默认配置"),
    }

    let storage: Box<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::File => Box::new(
            FileStore::new(&config.storage.data_dir).with_context(|| {
                format!("无法创建数据目录 {}", config.storage.data_dir.display())
            })?,
        ),
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };

    let mut service = ProductService::with_strategy(
        storage,
        config.storage.products_key.clone(),
        config.inventory.code_strategy,
    );
    let count = service.load().len();
    info!("📦 产品总数: {}", count);

    let state = AppState::new(service, config.inventory.page_size);
    let app = app::router(state, Duration::from_secs(config.http.timeout_seconds));

    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法绑定到 {}", address))?;

    info!("🚀 库存服务运行在 http://{}", address);
    info!("   GET    /products            - 产品列表 (q, category, status, page, page_size)");
    info!("   POST   /products            - 新增产品");
    info!("   GET    /products/next-code  - 下一个产品编码");
    info!("   GET    /products/stats      - 库存统计");
    info!("   GET    /products/:id        - 查看产品");
    info!("   PUT    /products/:id        - 更新产品");
    info!("   DELETE /products/:id        - 删除产品");

    axum::serve(listener, app).await.context("服务器运行失败")?;

    Ok(())
}
