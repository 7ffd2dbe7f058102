//! 把 [`Report`] 與狀態資訊轉成 Telegram HTML 訊息

use crate::domain::model::Report;

pub const HIGHLIGHT_MARKER: &str = "🟢";
pub const ZERO_MARKER: &str = "⚪️";

pub const WAITING_TEXT: &str = "⏳ Đang lấy số liệu, vui lòng đợi...";
pub const GREETING_TEXT: &str = "Xin chào! Gõ /thongke để xem thống kê.";
pub const PONG_TEXT: &str = "pong";
pub const UNKNOWN_COMMAND_TEXT: &str = "Mình chưa hiểu lệnh này. Thử /ping hoặc /thongke nhé.";
pub const CREDENTIAL_UPDATED_TEXT: &str = "✅ Đã cập nhật BEARER_TOKEN. Thử lại /thongke.";
pub const CREDENTIAL_DENIED_TEXT: &str = "⛔️ Bạn không có quyền dùng lệnh này.";
pub const CREDENTIAL_INVALID_TEXT: &str = "Token trống hoặc không hợp lệ.";
pub const CREDENTIAL_USAGE_TEXT: &str = "Cách dùng: /settoken &lt;token_mới&gt;";

const REPORT_HEADER: &str = "<b>📊 Thống kê hồ sơ từng lĩnh vực:</b>";
const AUTH_WARNING_BANNER: &str = "❗️ <b>BEARER_TOKEN có thể đã hết hạn hoặc không hợp lệ (401)</b>\n\
→ Cập nhật bằng lệnh <code>/settoken &lt;token_mới&gt;</code>";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_report(report: &Report) -> String {
    let mut lines = Vec::with_capacity(report.len() + 3);

    if report.any_auth_failed() {
        lines.push(AUTH_WARNING_BANNER.to_string());
        lines.push(String::new());
    }

    lines.push(REPORT_HEADER.to_string());
    for entry in report.entries() {
        let name = escape_html(&entry.category);
        if entry.has_records() {
            lines.push(format!(
                "- {} <b>{}: {} hồ sơ</b>",
                HIGHLIGHT_MARKER, name, entry.count
            ));
        } else {
            lines.push(format!("- {} {}: {} hồ sơ", ZERO_MARKER, name, entry.count));
        }
    }

    lines.join("\n")
}

/// `/status` 顯示的內容，secret path 與 credential 都必須是已遮罩的值
#[derive(Debug, Clone)]
pub struct StatusView {
    pub webhook_base_url: String,
    pub masked_secret_path: String,
    pub masked_credential: String,
    pub admin_id: Option<i64>,
}

pub fn render_status(status: &StatusView) -> String {
    let webhook = if status.webhook_base_url.is_empty() {
        "(empty)".to_string()
    } else {
        escape_html(&status.webhook_base_url)
    };
    let admin = status
        .admin_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(disabled)".to_string());

    format!(
        "🔎 Status:\n\
         - WEBHOOK_BASE_URL: {}\n\
         - SECRET_PATH: {}\n\
         - BEARER_TOKEN: {}\n\
         - ADMIN_USER_ID: {}",
        webhook,
        escape_html(&status.masked_secret_path),
        escape_html(&status.masked_credential),
        admin
    )
}

/// report_once 使用的純文字版本
pub fn render_plain(report: &Report) -> String {
    let mut lines = Vec::new();
    if report.any_auth_failed() {
        lines.push("!! BEARER_TOKEN rejected (401) by at least one endpoint".to_string());
    }
    for entry in report.entries() {
        let marker = if entry.has_records() { HIGHLIGHT_MARKER } else { ZERO_MARKER };
        lines.push(format!("{} {}: {}", marker, entry.category, entry.count));
    }
    lines.push(format!("Total: {}", report.total()));
    lines.join("\n")
}
