// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认日志级别
const DEFAULT_FILTER: &str = "info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=media_plan_budget::engine=trace
///
/// # 示例
/// ```no_run
/// use media_plan_budget::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 宿主进程可能已安装订阅者, 重复初始化时忽略
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 分配树构建与告警评估输出 debug 级别的分深度/分规则计数
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("media_plan_budget=debug"))
        .with_test_writer()
        .try_init();
}
