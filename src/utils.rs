use crate::error::{CashFlowError, Result};
use crate::schema::{MAX_PERIOD, MIN_PERIOD};

pub fn validate_period(period: i64) -> Result<u32> {
    if !(MIN_PERIOD..=MAX_PERIOD).contains(&period) {
        return Err(CashFlowError::PeriodOutOfRange { period });
    }
    Ok(period as u32)
}

/// Checks that `length` consecutive periods starting at `start` fit on the
/// diagram. Returns the first and last period.
pub fn validate_span(start: i64, length: i64) -> Result<(u32, u32)> {
    if length < 1 {
        return Err(CashFlowError::invalid(
            "length",
            format!("{} is not a positive number of periods", length),
        ));
    }
    let first = validate_period(start)?;
    let last = validate_period(start.saturating_add(length - 1))?;
    Ok((first, last))
}

/// A user-entered amount must be a real, non-zero number.
pub fn validate_amount(field: &str, amount: f64) -> Result<f64> {
    if !amount.is_finite() {
        return Err(CashFlowError::invalid(field, "must be a finite number"));
    }
    if amount == 0.0 {
        return Err(CashFlowError::invalid(field, "cannot be zero"));
    }
    Ok(amount)
}

pub fn validate_finite(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(CashFlowError::invalid(field, "must be a finite number"));
    }
    Ok(value)
}

pub fn validate_series_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CashFlowError::invalid("series name", "cannot be blank"));
    }
    Ok(trimmed.to_string())
}

/// Parses a period text field ("0" to "100").
pub fn parse_period(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    let period: i64 = trimmed.parse().map_err(|_| {
        CashFlowError::invalid(
            "period",
            format!("'{}' is not an integer between 0 and 100", trimmed),
        )
    })?;
    validate_period(period)?;
    Ok(period)
}

/// Parses a positive count such as a series length or number of annual payments.
pub fn parse_count(field: &str, text: &str) -> Result<i64> {
    let trimmed = text.trim();
    match trimmed.parse::<i64>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(CashFlowError::invalid(
            field,
            format!("'{}' is not a positive whole number", trimmed),
        )),
    }
}

/// Parses a monetary text field: optional leading minus, digits, at most one
/// decimal point and two decimals.
pub fn parse_amount(field: &str, text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);

    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.split('.').nth(1).map_or(true, |cents| cents.len() <= 2);

    if !well_formed {
        return Err(CashFlowError::invalid(
            field,
            format!(
                "'{}' must be a number with at most two decimal places",
                trimmed
            ),
        ));
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| CashFlowError::invalid(field, format!("'{}' is not a number", trimmed)))?;
    validate_finite(field, amount)
}

/// Parses a percentage text field such as "5" or "-2.5" (a trailing `%` is allowed).
pub fn parse_percent(field: &str, text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let percent: f64 = number.parse().map_err(|_| {
        CashFlowError::invalid(field, format!("'{}' is not a valid percentage", trimmed))
    })?;
    validate_finite(field, percent)
}

pub fn parse_series_name(text: &str) -> Result<String> {
    validate_series_name(text)
}
