//! Date/time functions
//!
//! Dates are serial numbers (days since a base date).
//!
//! Notes:
//! - In the 1900 date system serial 1 is 1900-01-01 and serial 60 is the
//!   fictional 1900-02-29, so every later serial is one more than the true
//!   day count.
//! - In the 1904 date system serial 0 is 1904-01-01.

use crate::coerce::{to_number, CalcResult};
use crate::context::EvaluationContext;
use cellcalc_core::{DateSystem, ErrorKind, Value};
use chrono::{Datelike, Duration, Local, NaiveDate, Timelike};

/// Largest serial in the 1900 system (9999-12-31)
const MAX_SERIAL_1900: f64 = 2_958_465.0;

fn base_date(system: DateSystem) -> Option<NaiveDate> {
    match system {
        DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 31),
        DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1),
    }
}

/// Serial number for a year, month and day
///
/// Months and days outside their usual range roll over into neighbouring
/// months and years. Returns `None` for dates before the base date or after
/// 9999-12-31.
pub fn serial_from_ymd(year: i32, month: i32, day: i32, system: DateSystem) -> Option<f64> {
    // 0-based month index keeps negative months correct
    let total_months = i64::from(year) * 12 + i64::from(month) - 1;
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = total_months.rem_euclid(12) as u32 + 1;
    if !(0..=9999).contains(&year) {
        return None;
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut month_start = (first - base_date(system)?).num_days();
    if system == DateSystem::Excel1900 && first >= NaiveDate::from_ymd_opt(1900, 3, 1)? {
        month_start += 1;
    }

    let serial = month_start + i64::from(day) - 1;
    let max = match system {
        DateSystem::Excel1900 => MAX_SERIAL_1900 as i64,
        DateSystem::Excel1904 => MAX_SERIAL_1900 as i64 - 1462,
    };
    (0..=max).contains(&serial).then_some(serial as f64)
}

/// Year, month and day of a serial number; the time fraction is ignored
///
/// Serial 0 in the 1900 system is the placeholder date 1900-01-00.
pub fn ymd_from_serial(serial: f64, system: DateSystem) -> Option<(i32, u32, u32)> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL_1900 {
        return None;
    }
    let serial = serial.floor() as i64;

    let days = match system {
        DateSystem::Excel1900 => match serial {
            0 => return Some((1900, 1, 0)),
            60 => return Some((1900, 2, 29)),
            s if s > 60 => s - 1,
            s => s,
        },
        DateSystem::Excel1904 => serial,
    };

    let date = base_date(system)?.checked_add_signed(Duration::days(days))?;
    if date.year() > 9999 {
        return None;
    }
    Some((date.year(), date.month(), date.day()))
}

fn serial_from_date(date: NaiveDate, system: DateSystem) -> CalcResult<f64> {
    serial_from_ymd(date.year(), date.month() as i32, date.day() as i32, system)
        .ok_or(ErrorKind::NumberInvalid)
}

fn date_parts(args: &[Value], ctx: &EvaluationContext) -> CalcResult<(i32, u32, u32)> {
    let serial = to_number(&args[0], ctx.culture())?;
    ymd_from_serial(serial, ctx.culture().date_system).ok_or(ErrorKind::NumberInvalid)
}

/// DATE(year, month, day)
pub fn fn_date(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let culture = ctx.culture();
    let mut parts = [0i32; 3];
    for (part, arg) in parts.iter_mut().zip(args) {
        let n = to_number(arg, culture)?.trunc();
        if n.abs() > f64::from(i32::MAX) {
            return Err(ErrorKind::NumberInvalid);
        }
        *part = n as i32;
    }
    let [mut year, month, day] = parts;

    // Years 0..1899 count from 1900
    if (0..1900).contains(&year) {
        year += 1900;
    }
    if !(0..=9999).contains(&year) {
        return Err(ErrorKind::NumberInvalid);
    }

    serial_from_ymd(year, month, day, culture.date_system)
        .map(Value::Number)
        .ok_or(ErrorKind::NumberInvalid)
}

/// YEAR(serial)
pub fn fn_year(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let (year, _, _) = date_parts(args, ctx)?;
    Ok(Value::Number(f64::from(year)))
}

/// MONTH(serial)
pub fn fn_month(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let (_, month, _) = date_parts(args, ctx)?;
    Ok(Value::Number(f64::from(month)))
}

/// DAY(serial)
pub fn fn_day(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let (_, _, day) = date_parts(args, ctx)?;
    Ok(Value::Number(f64::from(day)))
}

/// TODAY()
pub fn fn_today(_args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let today = Local::now().date_naive();
    serial_from_date(today, ctx.culture().date_system).map(Value::Number)
}

/// NOW()
pub fn fn_now(_args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let now = Local::now().naive_local();
    let day = serial_from_date(now.date(), ctx.culture().date_system)?;
    let seconds = f64::from(now.time().num_seconds_from_midnight());
    Ok(Value::Number(day + seconds / 86_400.0))
}
