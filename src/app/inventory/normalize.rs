//! 数值规范化
//!
//! 表单输入的数量与价格在这里统一转换。解析失败一律得到 0，不产生错误。

use serde::{Deserialize, Deserializer, Serialize};

/// 表单中的数值字段：文本（按本地格式解析）或 JSON 数字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        NumericInput::Text(value)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        NumericInput::Number(value as f64)
    }
}

impl NumericInput {
    /// 解析出的原始整数（可能为负），无法解析时为 `None`
    pub fn signed_count(&self) -> Option<i64> {
        match self {
            NumericInput::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            NumericInput::Number(_) => None,
            NumericInput::Text(s) => parse_int_prefix(s),
        }
    }

    /// 规范化为非负数量
    pub fn to_count(&self) -> u32 {
        clamp_count(self.signed_count())
    }

    /// 规范化为非负金额
    pub fn to_currency(&self) -> f64 {
        match self {
            NumericInput::Number(n) if n.is_finite() && *n > 0.0 => *n,
            NumericInput::Number(_) => 0.0,
            NumericInput::Text(s) => parse_currency(s),
        }
    }
}

/// 缺省字段按 0 处理
pub fn count_or_zero(input: Option<&NumericInput>) -> u32 {
    input.map(NumericInput::to_count).unwrap_or(0)
}

pub fn currency_or_zero(input: Option<&NumericInput>) -> f64 {
    input.map(NumericInput::to_currency).unwrap_or(0.0)
}

/// 快照中的数量字段：`null`、负数与小数都按 [`NumericInput::to_count`] 规范化，
/// 单条异常记录不会让整个列表读取失败
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<NumericInput>::deserialize(deserializer)?;
    Ok(count_or_zero(input.as_ref()))
}

/// 快照中的金额字段，规则同 [`NumericInput::to_currency`]
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<NumericInput>::deserialize(deserializer)?;
    Ok(currency_or_zero(input.as_ref()))
}

/// 文本数量 → 非负整数，`"12abc"` 得 12，`"abc"` 与负数得 0
pub fn parse_count(input: &str) -> u32 {
    clamp_count(parse_int_prefix(input))
}

fn clamp_count(value: Option<i64>) -> u32 {
    match value {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// 按整数前缀解析：跳过前导空白，可选符号，随后的数字；其余字符忽略。
/// `0x` 前缀按十六进制读取。
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if rest.len() > 2 && (rest.starts_with("0x") || rest.starts_with("0X")) {
        (16, &rest[2..])
    } else {
        (10, rest)
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // 超出范围时饱和
    let magnitude = i64::from_str_radix(&digits[..end], radix).unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// 本地化金额 → 数值
///
/// 去掉数字和逗号以外的所有字符，第一个逗号视为小数点，再读取最长的数字前缀。
/// `"R$ 1.234,56"` 得 1234.56，`"abc"` 得 0。点号被当作千位分隔符丢弃，
/// 因此 `"12.50"` 得 1250。
pub fn parse_currency(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    let cleaned = cleaned.replacen(',', ".", 1);

    let (int_part, rest) = split_digits(&cleaned);
    let frac_part = rest
        .strip_prefix('.')
        .map(|r| split_digits(r).0)
        .unwrap_or("");

    if int_part.is_empty() && frac_part.is_empty() {
        return 0.0;
    }

    let literal = format!(
        "{}.{}",
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part }
    );
    literal.parse::<f64>().unwrap_or(0.0)
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// 金额显示为 `R$ 1.234,56`
pub fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("R$ {}{},{:02}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_locale_format() {
        assert_eq!(parse_currency("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_currency("1234,5"), 1234.5);
        assert_eq!(parse_currency("R$ 0,99"), 0.99);
        assert_eq!(parse_currency(",75"), 0.75);
        assert_eq!(parse_currency("10,"), 10.0);
    }

    #[test]
    fn test_currency_garbage_is_zero() {
        assert_eq!(parse_currency("abc"), 0.0);
        assert_eq!(parse_currency(""), 0.0);
        assert_eq!(parse_currency("R$ ,"), 0.0);
    }

    #[test]
    fn test_currency_quirks() {
        // 点号是千位分隔符
        assert_eq!(parse_currency("12.50"), 1250.0);
        // 只有第一个逗号是小数点
        assert_eq!(parse_currency("1,2,3"), 1.2);
        // 负号被去掉
        assert_eq!(parse_currency("-5,00"), 5.0);
    }

    #[test]
    fn test_count_prefix_parse() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count("  12abc"), 12);
        assert_eq!(parse_count("1.234"), 1);
        assert_eq!(parse_count("+7"), 7);
        assert_eq!(parse_count("0x1A"), 26);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count("99999999999999999999"), u32::MAX);
    }

    #[test]
    fn test_signed_count_keeps_sign() {
        assert_eq!(NumericInput::from("-3").signed_count(), Some(-3));
        assert_eq!(NumericInput::from(-2.9).signed_count(), Some(-2));
        assert_eq!(NumericInput::from("x").signed_count(), None);
    }

    #[test]
    fn test_numeric_input_from_json() {
        let text: NumericInput = serde_json::from_str("\"R$ 2,50\"").unwrap();
        assert_eq!(text.to_currency(), 2.5);

        let number: NumericInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(number.to_currency(), 12.5);
        assert_eq!(number.to_count(), 12);

        let negative: NumericInput = serde_json::from_str("-4").unwrap();
        assert_eq!(negative.to_currency(), 0.0);
        assert_eq!(negative.to_count(), 0);

        assert_eq!(count_or_zero(None), 0);
        assert_eq!(currency_or_zero(None), 0.0);
    }

    #[derive(Debug, Deserialize)]
    struct Stored {
        #[serde(default, deserialize_with = "lenient_count")]
        quantidade: u32,
        #[serde(default, deserialize_with = "lenient_amount")]
        preco: f64,
    }

    #[test]
    fn test_lenient_snapshot_fields() {
        let read = |raw: &str| serde_json::from_str::<Stored>(raw).unwrap();

        let negative = read(r#"{"quantidade": -3, "preco": -1.5}"#);
        assert_eq!((negative.quantidade, negative.preco), (0, 0.0));

        let nulls = read(r#"{"quantidade": null, "preco": null}"#);
        assert_eq!((nulls.quantidade, nulls.preco), (0, 0.0));

        let fractional = read(r#"{"quantidade": 2.7, "preco": 12.5}"#);
        assert_eq!((fractional.quantidade, fractional.preco), (2, 12.5));

        let text = read(r#"{"quantidade": "4", "preco": "R$ 3,20"}"#);
        assert_eq!((text.quantidade, text.preco), (4, 3.2));

        let missing = read("{}");
        assert_eq!((missing.quantidade, missing.preco), (0, 0.0));
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1234567.8), "R$ 1.234.567,80");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
    }
}
