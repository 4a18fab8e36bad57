//! Shop Server - e-commerce order / stock-reservation backend
//!
//! # 模块结构
//!
//! ```text
//! shop-server/src/
//! ├── config.rs      # 环境配置
//! ├── state.rs       # 应用状态 (连接池、服务装配)
//! ├── auth/          # JWT 认证中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # PostgreSQL 数据访问层
//! ├── stock/         # 库存预扣: 缓存影子 + 分布式锁 + 两阶段确认
//! ├── orders/        # 订单编排、金额计算、超时回收
//! ├── payments/      # 支付回调集成
//! └── notify.rs      # 异步通知 webhook
//! ```
//!
//! The correctness-critical piece is the stock reservation pipeline: a
//! cache-side reserve under a per-product distributed lock, an authoritative
//! conditional decrement inside the order transaction, and idempotent
//! compensation on every failure path.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod state;
pub mod stock;

// Re-export 公共类型
pub use config::Config;
pub use state::AppState;
