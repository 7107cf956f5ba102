use crate::error::{ConvertError, Result};

/// 解析EDF时间字符串为100纳秒单位
pub fn parse_edf_time(s: &str) -> Result<i64> {
    let s = s.trim();

    if s.is_empty() {
        return Err(ConvertError::InvalidFormat("Empty time string".to_string()));
    }

    let (negative, s) = if s.starts_with('-') {
        (true, &s[1..])
    } else if s.starts_with('+') {
        (false, &s[1..])
    } else {
        (false, s)
    };

    let mut value = 0i64;

    if let Some(dot_pos) = s.find('.') {
        let integer_part = &s[..dot_pos];
        let decimal_part = &s[dot_pos + 1..];

        if !integer_part.is_empty() {
            value += integer_part.parse::<i64>()
                .map_err(|_| ConvertError::InvalidFormat("Invalid integer part".to_string()))?
                * crate::EDF_TIME_DIMENSION;
        }

        // 最多7位小数精度
        if !decimal_part.is_empty() {
            let decimal_str = if decimal_part.len() > 7 {
                &decimal_part[..7]
            } else {
                decimal_part
            };

            let decimal_value = decimal_str.parse::<i64>()
                .map_err(|_| ConvertError::InvalidFormat("Invalid decimal part".to_string()))?;

            let scale = 10i64.pow(7 - decimal_str.len() as u32);
            value += decimal_value * scale;
        }
    } else {
        value = s.parse::<i64>()
            .map_err(|_| ConvertError::InvalidFormat("Invalid integer".to_string()))?
            * crate::EDF_TIME_DIMENSION;
    }

    if negative {
        value = -value;
    }

    Ok(value)
}

/// 非本地化的整数解析（避免受系统locale影响）
pub fn atoi_nonlocalized(s: &str) -> i32 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    s.parse().unwrap_or(0)
}

/// 非本地化的浮点数解析
pub fn atof_nonlocalized(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    s.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atoi_nonlocalized() {
        assert_eq!(atoi_nonlocalized("  123 "), 123);
        assert_eq!(atoi_nonlocalized("-2048"), -2048);
        assert_eq!(atoi_nonlocalized(""), 0);
        assert_eq!(atoi_nonlocalized("abc"), 0);
    }

    #[test]
    fn test_parse_edf_time() {
        assert_eq!(parse_edf_time("1").unwrap(), 10_000_000);
        assert_eq!(parse_edf_time("1.5").unwrap(), 15_000_000);
        assert_eq!(parse_edf_time("-2.5").unwrap(), -25_000_000);
        assert_eq!(parse_edf_time("+0.0000001").unwrap(), 1);
    }
}
