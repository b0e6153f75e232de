//! UI text translations
//!
//! Built-in tables for English, Traditional Chinese and Simplified Chinese.
//! Lookups fall back to English, then to the key itself.

use std::collections::HashMap;

use tracing::{info, warn};

pub const DEFAULT_LANGUAGE: &str = "zh-TW";
pub const FALLBACK_LANGUAGE: &str = "en";

const EN: &[(&str, &str)] = &[
    ("app_title", "MENU Application"),
    ("welcome", "Welcome to MENU"),
    ("hello", "Hello"),
    ("ready", "Ready"),
    ("error", "Error"),
    ("success", "Success"),
    ("ok", "OK"),
    ("cancel", "Cancel"),
    ("submit", "Submit"),
    ("test", "Test"),
    ("clear", "Clear"),
    ("generate_code", "Generate Code"),
    ("generated_code", "Generated Code"),
    ("execution_result", "Execution Result"),
    ("execution_error", "Execution Error"),
    ("command_executed", "Command executed"),
    ("api_result", "API Result"),
    ("api_error", "API Error"),
    ("connection_success", "Connection Successful"),
    ("connection_failed", "Connection Failed"),
    ("language_changed", "Language Changed"),
    ("debug_info", "Debug Info"),
    ("summary", "Summary"),
    ("processing", "Processing..."),
];

const ZH_TW: &[(&str, &str)] = &[
    ("app_title", "MENU 應用程式"),
    ("welcome", "歡迎使用 MENU"),
    ("hello", "你好"),
    ("ready", "就緒"),
    ("error", "錯誤"),
    ("success", "成功"),
    ("ok", "確定"),
    ("cancel", "取消"),
    ("submit", "提交"),
    ("test", "測試"),
    ("clear", "清除"),
    ("generate_code", "生成代碼"),
    ("generated_code", "生成的代碼"),
    ("execution_result", "執行結果"),
    ("execution_error", "執行錯誤"),
    ("command_executed", "指令已執行"),
    ("api_result", "API 結果"),
    ("api_error", "API 錯誤"),
    ("connection_success", "連線成功"),
    ("connection_failed", "連線失敗"),
    ("language_changed", "語言已變更"),
    ("debug_info", "除錯資訊"),
    ("summary", "摘要"),
    ("processing", "處理中..."),
];

const ZH_CN: &[(&str, &str)] = &[
    ("app_title", "MENU 应用程序"),
    ("welcome", "欢迎使用 MENU"),
    ("hello", "你好"),
    ("ready", "就绪"),
    ("error", "错误"),
    ("success", "成功"),
    ("ok", "确定"),
    ("cancel", "取消"),
    ("submit", "提交"),
    ("test", "测试"),
    ("clear", "清除"),
    ("generate_code", "生成代码"),
    ("generated_code", "生成的代码"),
    ("execution_result", "执行结果"),
    ("execution_error", "执行错误"),
    ("command_executed", "指令已执行"),
    ("api_result", "API 结果"),
    ("api_error", "API 错误"),
    ("connection_success", "连接成功"),
    ("connection_failed", "连接失败"),
    ("language_changed", "语言已变更"),
    ("debug_info", "调试信息"),
    ("summary", "摘要"),
    ("processing", "处理中..."),
];

#[derive(Debug, Clone)]
pub struct LanguageManager {
    translations: HashMap<String, HashMap<String, String>>,
    current: String,
}

impl LanguageManager {
    /// Built-in tables; an unsupported initial language falls back to the default
    pub fn new(language: &str) -> Self {
        let translations = [("en", EN), ("zh-TW", ZH_TW), ("zh-CN", ZH_CN)]
            .into_iter()
            .map(|(code, table)| {
                let table = table
                    .iter()
                    .map(|(key, text)| (key.to_string(), text.to_string()))
                    .collect();
                (code.to_string(), table)
            })
            .collect();

        let mut manager = Self {
            translations,
            current: DEFAULT_LANGUAGE.to_string(),
        };
        if !manager.set_language(language) {
            warn!(language, "unsupported language, using default");
        }
        manager
    }

    /// Switch language; unknown codes leave the current one in place
    pub fn set_language(&mut self, code: &str) -> bool {
        if !self.translations.contains_key(code) {
            return false;
        }
        if self.current != code {
            info!(from = %self.current, to = code, "language changed");
        }
        self.current = code.to_string();
        true
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn available(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.translations.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn get_text(&self, key: &str) -> String {
        [self.current.as_str(), FALLBACK_LANGUAGE]
            .iter()
            .find_map(|code| self.translations.get(*code)?.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Add or replace one entry, creating the language table if needed
    pub fn add_translation(&mut self, code: &str, key: &str, text: &str) {
        self.translations
            .entry(code.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }
}

impl Default for LanguageManager {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language() {
        let manager = LanguageManager::default();
        assert_eq!(manager.current(), "zh-TW");
        assert_eq!(manager.get_text("ready"), "就緒");
    }

    #[test]
    fn test_switch_and_reject() {
        let mut manager = LanguageManager::new("en");
        assert_eq!(manager.get_text("ready"), "Ready");
        assert!(manager.set_language("zh-CN"));
        assert_eq!(manager.get_text("ready"), "就绪");
        assert!(!manager.set_language("fr"));
        assert_eq!(manager.current(), "zh-CN");
    }

    #[test]
    fn test_fallback_chain() {
        let mut manager = LanguageManager::new("zh-TW");
        manager.add_translation("en", "only_english", "English only");
        assert_eq!(manager.get_text("only_english"), "English only");
        assert_eq!(manager.get_text("no_such_key"), "no_such_key");
    }

    #[test]
    fn test_unknown_initial_language() {
        let manager = LanguageManager::new("xx");
        assert_eq!(manager.current(), DEFAULT_LANGUAGE);
        assert_eq!(manager.available(), vec!["en", "zh-CN", "zh-TW"]);
    }
}
