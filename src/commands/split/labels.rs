// Each label also matches its glyph-reversed spelling; right-to-left text
// sometimes comes out of the text layer in visual order.
pub const DEPARTMENT_LABEL: &str = r"(?:מחלקה|הקלחמ)";
pub const CUSTOMER_LABEL: &str = r"(?:לקוח|חוקל)";
pub const REPORT_LABEL: &str = r#"(?:דו["״']?ח|ח["״']?וד)"#;

pub const REPORT_DATE: &str = r"([0-9]{1,2})[/-]([0-9]{1,2})[/-]([0-9]{4})";

pub const LABEL_SEPARATOR: &str = r"[\s:.\-]*";

pub const DEPARTMENT_CODE_LEN: usize = 5;
pub const CUSTOMER_ID_DIRECT_MIN_DIGITS: usize = 4;
pub const CUSTOMER_ID_SPATIAL_MIN_DIGITS: usize = 5;
pub const INVOICE_NUMBER_MIN_DIGITS: usize = 4;

/// A maximal run of at least `min_digits` ASCII digits.
pub fn digit_run(min_digits: usize) -> String {
    format!("[0-9]{{{min_digits},}}")
}

pub fn label_then_digits(label: &str, min_digits: usize) -> String {
    format!("{label}{LABEL_SEPARATOR}([0-9]{{{min_digits},}})")
}

/// Exactly five digits adjacent to the department label, on either side.
pub fn department_adjacent_code() -> String {
    format!(
        "{label}{sep}([0-9]{{{len}}})(?:[^0-9]|$)|(?:^|[^0-9])([0-9]{{{len}}}){sep}{label}",
        label = DEPARTMENT_LABEL,
        sep = LABEL_SEPARATOR,
        len = DEPARTMENT_CODE_LEN,
    )
}
