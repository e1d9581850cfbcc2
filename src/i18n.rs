// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文, 用于告警文案
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 依赖具体文案的测试需持有此锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 是否为支持的语言
pub fn is_supported_locale(locale: &str) -> bool {
    SUPPORTED_LOCALES.contains(&locale)
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use media_plan_budget::i18n::t;
/// let msg = t("alert.no_creatives.title");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use media_plan_budget::i18n::t_with_args;
/// let msg = t_with_args("alert.no_creatives.description", &[("line", "Search")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    t_with_args_in(&current_locale(), key, args)
}

/// 按指定语言翻译消息（带参数）, 不读写全局语言
///
/// # 示例
/// ```no_run
/// use media_plan_budget::i18n::t_with_args_in;
/// let msg = t_with_args_in("en", "alert.no_creatives.description", &[("line", "Search")]);
/// ```
pub fn t_with_args_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key, locale = locale).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
