use std::time::Duration;

use rust_decimal::Decimal;

/// 库存同步配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | ADMIN_NAMESPACE | admin | 主目录 (master) 所在命名空间 |
/// | RECONCILIATION_HISTORY_LIMIT | 12 | 盘点历史保留条数 |
/// | HIGH_VALUE_THRESHOLD | 1000000 | 高库存价值提示阈值 |
/// | LOW_STOCK_WARNING_RATIO | 0.2 | 低库存警告比例 |
/// | OVERSTOCK_MULTIPLIER | 3 | 过量库存倍数 |
/// | DEFAULT_RESTOCK_AMOUNT | 10 | minStock 为 0 时的补货量 |
/// | READ_RETRY_ATTEMPTS | 3 | 只读操作重试次数 |
/// | READ_RETRY_BASE_DELAY_MS | 100 | 重试基础延迟(毫秒) |
/// | SNAPSHOT_BUFFER | 16 | 订阅通道容量 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 滚动日志目录 |
/// | ENVIRONMENT | development | 运行环境 (production 输出 JSON 日志) |
///
/// # 示例
///
/// ```ignore
/// ADMIN_NAMESPACE=hq LOG_LEVEL=debug cargo run -p stock-sync
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace whose `isMaster` records form the shared catalog
    pub admin_namespace: String,
    /// Recent stock-taking sessions returned by history reads
    pub reconciliation_history_limit: usize,
    /// Total inventory value above which an info recommendation is raised
    pub high_value_threshold: Decimal,
    /// Low-stock share above which a warning recommendation is raised
    pub low_stock_warning_ratio: Decimal,
    /// `stock > minStock * multiplier` counts as over-stocked
    pub overstock_multiplier: u32,
    /// Restock amount when a product has no reorder threshold
    pub default_restock_amount: u32,
    /// Attempts for idempotent reads (first try included)
    pub read_retry_attempts: u32,
    pub read_retry_base_delay_ms: u64,
    /// Per-subscription snapshot channel capacity
    pub snapshot_buffer: usize,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            admin_namespace: std::env::var("ADMIN_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty())
                .unwrap_or_else(|| "admin".into()),
            reconciliation_history_limit: std::env::var("RECONCILIATION_HISTORY_LIMIT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(12),
            high_value_threshold: std::env::var("HIGH_VALUE_THRESHOLD")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(Decimal::from(1_000_000)),
            low_stock_warning_ratio: std::env::var("LOW_STOCK_WARNING_RATIO")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(Decimal::new(2, 1)),
            overstock_multiplier: std::env::var("OVERSTOCK_MULTIPLIER")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            default_restock_amount: std::env::var("DEFAULT_RESTOCK_AMOUNT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            read_retry_attempts: std::env::var("READ_RETRY_ATTEMPTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            read_retry_base_delay_ms: std::env::var("READ_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(100),
            snapshot_buffer: std::env::var("SNAPSHOT_BUFFER")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(16),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景：固定命名空间并关闭重试等待
    pub fn with_overrides(admin_namespace: impl Into<String>, read_retry_base_delay_ms: u64) -> Self {
        let mut config = Self::from_env();
        config.admin_namespace = admin_namespace.into();
        config.read_retry_base_delay_ms = read_retry_base_delay_ms;
        config
    }

    pub fn read_retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_base_delay_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
