//! Application expiry (and effective) date decoding: BCD `YYMMDD` with
//! sliding-window century resolution (spec §4.1).

use chrono::{Datelike, NaiveDate};

use super::errors::DecodeError;
use crate::util::bcd_byte_to_decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryDate {
    pub year: i32,
    pub month: u8,
}

/// Resolves a two-digit BCD year against `current_yy` (the current year's
/// last two digits) using the sliding window from spec §4.1: `YY` in
/// `[80, 99]` with `current_yy < 80` belongs to the prior century; `YY < 20`
/// with `current_yy >= 80` belongs to the next century; otherwise it shares
/// the current century.
fn resolve_century(yy: u8, current_year: i32) -> i32 {
    let current_century = (current_year / 100) * 100;
    let current_yy = (current_year % 100) as u8;

    if (80..=99).contains(&yy) && current_yy < 80 {
        current_century - 100 + yy as i32
    } else if yy < 20 && current_yy >= 80 {
        current_century + 100 + yy as i32
    } else {
        current_century + yy as i32
    }
}

pub fn decode_date(raw: &[u8], current_year: i32) -> Result<ExpiryDate, DecodeError> {
    if raw.len() != 3 {
        return Err(DecodeError::InvalidExpiry("expected 3 BCD bytes (YYMMDD)"));
    }
    let yy = bcd_byte_to_decimal(raw[0]).ok_or(DecodeError::InvalidExpiry("bad BCD year"))?;
    let mm = bcd_byte_to_decimal(raw[1]).ok_or(DecodeError::InvalidExpiry("bad BCD month"))?;
    // Day (raw[2]) is part of the encoding but the date's validity only
    // hinges on year/month; keep it parsed for completeness.
    let _dd = bcd_byte_to_decimal(raw[2]).ok_or(DecodeError::InvalidExpiry("bad BCD day"))?;

    if !(1..=12).contains(&mm) {
        return Err(DecodeError::InvalidExpiry("month out of range 1..=12"));
    }

    Ok(ExpiryDate {
        year: resolve_century(yy, current_year),
        month: mm,
    })
}

/// Rejects any date whose `(year, month)` lies strictly before the current
/// `(year, month)` — the spec §8 invariant for `validate_expiry`.
pub fn validate_expiry(date: ExpiryDate, today: NaiveDate) -> Result<(), DecodeError> {
    let current = (today.year(), today.month() as u8);
    if (date.year, date.month) < current {
        return Err(DecodeError::InvalidExpiry("expired"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_same_century() {
        let date = decode_date(&[0x26, 0x05, 0x31], 2026).unwrap();
        assert_eq!(date, ExpiryDate { year: 2026, month: 5 });
    }

    #[test]
    fn resolves_yy_in_prior_century_window() {
        // current year 2005 (yy=05), card YY=95 -> belongs to 1995
        let date = decode_date(&[0x95, 0x01, 0x01], 2005).unwrap();
        assert_eq!(date.year, 1995);
    }

    #[test]
    fn resolves_yy_in_next_century_window() {
        // current year 2085 (yy=85), card YY=05 -> belongs to 2105
        let date = decode_date(&[0x05, 0x01, 0x01], 2085).unwrap();
        assert_eq!(date.year, 2105);
    }

    #[test]
    fn rejects_invalid_month() {
        assert_eq!(
            decode_date(&[0x26, 0x13, 0x01], 2026),
            Err(DecodeError::InvalidExpiry("month out of range 1..=12"))
        );
    }

    #[test]
    fn expired_card_fails_validation() {
        let date = decode_date(&[0x22, 0x01, 0x31], 2026).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert_eq!(
            validate_expiry(date, today),
            Err(DecodeError::InvalidExpiry("expired"))
        );
    }

    #[test]
    fn current_month_is_not_expired() {
        let date = decode_date(&[0x26, 0x07, 0x31], 2026).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        assert!(validate_expiry(date, today).is_ok());
    }
}
