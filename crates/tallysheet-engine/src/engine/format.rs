use super::{CellValue, ErrorCode};

/// Format a value for display.
pub fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => format_number(*n),
        CellValue::Text(s) => s.clone(),
        CellValue::Error(code) => code.to_string(),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        ErrorCode::Value.to_string()
    } else if n == 0.0 {
        // Also covers -0.0.
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}
