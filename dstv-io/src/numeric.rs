use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid numeric token \"{token}\"")]
pub struct NumericFormatError {
    pub token: String,
}

/// 去掉字段末尾的字母注记（如 `45.0L`、`0.00l`、`12.5s`），剩余部分按 `.` 小数点解析。
pub fn normalize(token: &str) -> Result<f64, NumericFormatError> {
    let stripped = token.trim_end_matches(|ch: char| ch.is_ascii_alphabetic());
    stripped.parse::<f64>().map_err(|_| NumericFormatError {
        token: token.to_string(),
    })
}
