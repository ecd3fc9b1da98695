use time::{Date, OffsetDateTime, macros::format_description};

use crate::constants::CURRENCY;
use crate::html::{Markup, span};

/// Groups thousands with commas and keeps at most two decimals, e.g. `50,000`
/// or `1,234.5`.
pub fn format_number(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let negative = amount < 0.0;
    let rounded = (amount.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - whole as f64) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let fraction = match cents {
        0 => String::new(),
        c if c % 10 == 0 => format!(".{}", c / 10),
        c => format!(".{:02}", c),
    };
    let sign = if negative && (whole > 0 || cents > 0) { "-" } else { "" };
    format!("{}{}{}", sign, grouped, fraction)
}

pub fn format_ugx(amount: f64) -> String {
    format!("{} {}", CURRENCY, format_number(amount))
}

pub fn parse_date(value: &str) -> Option<Date> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok()
}

/// `2024-01-05` (or a timestamp starting with it) becomes `05 Jan 2024`.
pub fn format_date(value: &str) -> String {
    parse_date(value)
        .and_then(|d| {
            d.format(format_description!("[day] [month repr:short] [year]"))
                .ok()
        })
        .unwrap_or_else(|| value.to_string())
}

pub fn today_iso() -> String {
    OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn format_payment_method(method: Option<&str>) -> String {
    let Some(method) = method.map(str::trim).filter(|m| !m.is_empty()) else {
        return "Not specified".to_string();
    };
    let normalized = method
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    match normalized.as_str() {
        "mobile_money" => "Mobile Money",
        "bank_transfer" => "Bank Transfer",
        "western_union" => "Western Union",
        "paypal" => "PayPal",
        "cash" => "Cash",
        "other" => "Other",
        _ => return method.to_string(),
    }
    .to_string()
}

pub fn format_status_text(status: &str) -> String {
    match status.trim().to_lowercase().as_str() {
        "draft" => "Draft",
        "submitted" => "Submitted",
        "approved" => "Approved",
        "rejected" => "Rejected",
        "pending" | "pending approval" => "Pending Approval",
        "planned" => "Planned",
        "completed" => "Completed",
        _ => return status.to_string(),
    }
    .to_string()
}

pub fn status_class(status: &str) -> String {
    status.trim().to_lowercase().replace(' ', "_")
}

pub fn status_badge(status: Option<&str>, fallback: &str) -> Markup {
    let status = status.filter(|s| !s.trim().is_empty()).unwrap_or(fallback);
    let class = format!("status-badge {}", status_class(status));
    span(&class, Markup::text(&format_status_text(status)))
}

/// Font Awesome icon class for a file name.
pub fn file_icon(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "fa-file-pdf",
        "doc" | "docx" => "fa-file-word",
        "xls" | "xlsx" => "fa-file-excel",
        "ppt" | "pptx" => "fa-file-powerpoint",
        "jpg" | "jpeg" | "png" | "gif" => "fa-file-image",
        "zip" | "rar" => "fa-file-archive",
        _ => "fa-file",
    }
}

/// Byte count in the largest whole unit, e.g. `25 MB` or `512 KB`.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= KB * KB {
        format!("{} MB", format_number(bytes / (KB * KB)))
    } else if bytes >= KB {
        format!("{} KB", format_number(bytes / KB))
    } else {
        format!("{} bytes", bytes)
    }
}

pub fn or_na(value: Option<&str>) -> &str {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(crate::constants::NOT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_grouped() {
        assert_eq!(format_number(50000.0), "50,000");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(-2500.0), "-2,500");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn ugx_prefix() {
        assert_eq!(format_ugx(50000.0), "UGX 50,000");
    }

    #[test]
    fn dates_render_short_month() {
        assert_eq!(format_date("2024-01-05"), "05 Jan 2024");
        assert_eq!(format_date("2024-03-09T10:00:00"), "09 Mar 2024");
        assert_eq!(format_date("someday"), "someday");
    }

    #[test]
    fn payment_methods_are_humanized() {
        assert_eq!(format_payment_method(Some("mobile_money")), "Mobile Money");
        assert_eq!(format_payment_method(Some("Bank Transfer")), "Bank Transfer");
        assert_eq!(format_payment_method(Some("crypto")), "crypto");
        assert_eq!(format_payment_method(None), "Not specified");
        assert_eq!(format_payment_method(Some("  ")), "Not specified");
    }

    #[test]
    fn status_text_and_class() {
        assert_eq!(format_status_text("pending"), "Pending Approval");
        assert_eq!(status_class("pending approval"), "pending_approval");
        let badge = status_badge(None, "planned");
        assert!(badge.as_str().contains("status-badge planned"));
        assert!(badge.as_str().contains("Planned"));
    }

    #[test]
    fn sizes_use_largest_unit() {
        assert_eq!(format_size(25 * 1024 * 1024), "25 MB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(100), "100 bytes");
    }

    #[test]
    fn icons_follow_extension() {
        assert_eq!(file_icon("report.PDF"), "fa-file-pdf");
        assert_eq!(file_icon("budget.xlsx"), "fa-file-excel");
        assert_eq!(file_icon("README"), "fa-file");
    }
}
