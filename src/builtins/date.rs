//! `Date` (spec.md §4.3): milliseconds since the epoch, stored as an
//! `Option<f64>` (`None`/`NaN` both represent an invalid date internally,
//! spec.md's "Time Value" `NaN` case collapses to `None` here to keep
//! `ObjectData::Date` cheap to match on).

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    value::JsValue,
};
use chrono::{Datelike, TimeZone, Timelike, Utc};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().object_prototype();
    let prototype = JsObject::ordinary(Some(prototype));

    prototype.create_method("getTime", 0, get_time, context);
    prototype.create_method("valueOf", 0, get_time, context);
    prototype.create_method("getFullYear", 0, get_full_year, context);
    prototype.create_method("getMonth", 0, get_month, context);
    prototype.create_method("getDate", 0, get_date, context);
    prototype.create_method("getDay", 0, get_day, context);
    prototype.create_method("getHours", 0, get_hours, context);
    prototype.create_method("getMinutes", 0, get_minutes, context);
    prototype.create_method("getSeconds", 0, get_seconds, context);
    prototype.create_method("getMilliseconds", 0, get_milliseconds, context);
    prototype.create_method("setTime", 1, set_time, context);
    prototype.create_method("toISOString", 0, to_iso_string, context);
    prototype.create_method("toString", 0, to_iso_string, context);
    prototype.create_method("toJSON", 1, to_iso_string, context);

    let ctor = native_constructor("Date", 7, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_method("now", 0, now, context);
    ctor.create_method("parse", 1, parse, context);
    context.intrinsics_mut().insert("%Date.prototype%", prototype);
    install_global("Date", ctor, context);
}

fn construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Date constructor called on non-object").into());
    };
    let time = match args.len() {
        0 => Some(current_time_millis()),
        1 => match &args[0] {
            JsValue::String(s) => parse_iso(&s.to_string_lossy()),
            other => Some(other.to_number(context)?).filter(|n| n.is_finite()),
        },
        _ => {
            let year = args[0].to_number(context)?;
            let month = args.get(1).map(|v| v.to_number(context)).transpose()?.unwrap_or(0.0);
            let day = args.get(2).map(|v| v.to_number(context)).transpose()?.unwrap_or(1.0);
            let hour = args.get(3).map(|v| v.to_number(context)).transpose()?.unwrap_or(0.0);
            let minute = args.get(4).map(|v| v.to_number(context)).transpose()?.unwrap_or(0.0);
            let second = args.get(5).map(|v| v.to_number(context)).transpose()?.unwrap_or(0.0);
            let ms = args.get(6).map(|v| v.to_number(context)).transpose()?.unwrap_or(0.0);
            time_from_fields(year, month, day, hour, minute, second, ms)
        }
    };
    obj.borrow_mut().data = ObjectData::Date(time);
    Ok(this.clone())
}

fn current_time_millis() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

/// `MakeDate(MakeDay(...), MakeTime(...))` (spec.md's Date field
/// constructor): `month`/`day` may be any integer, out-of-range values
/// overflow into the adjacent year/month the way `new Date(2024, 12, 0)`
/// does in JS, so this walks through `chrono`'s month/day arithmetic
/// rather than validating the fields up front.
fn time_from_fields(year: f64, month: f64, day: f64, hour: f64, minute: f64, second: f64, ms: f64) -> Option<f64> {
    if [year, month, day, hour, minute, second, ms].iter().any(|n| !n.is_finite()) {
        return None;
    }
    let year = if (0.0..=99.0).contains(&year) { 1900.0 + year } else { year };
    let base = chrono::NaiveDate::from_ymd_opt(year as i32, 1, 1)?;
    let month_offset = month as i64;
    let date = if month_offset >= 0 {
        base.checked_add_months(chrono::Months::new(month_offset as u32))?
    } else {
        base.checked_sub_months(chrono::Months::new((-month_offset) as u32))?
    };
    let day_offset = day as i64 - 1;
    let date = if day_offset >= 0 {
        date.checked_add_days(chrono::Days::new(day_offset as u64))?
    } else {
        date.checked_sub_days(chrono::Days::new((-day_offset) as u64))?
    };
    let millis = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64
        + hour * 3_600_000.0
        + minute * 60_000.0
        + second * 1000.0
        + ms;
    Some(millis)
}

fn parse_iso(s: &str) -> Option<f64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp_millis() as f64)
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis() as f64)
        })
}

fn this_time(this: &JsValue) -> JsResult<Option<f64>> {
    match this.as_object() {
        Some(obj) => match &obj.borrow().data {
            ObjectData::Date(t) => Ok(*t),
            _ => Err(JsNativeError::typ().with_message("Date.prototype method called on incompatible receiver").into()),
        },
        None => Err(JsNativeError::typ().with_message("Date.prototype method called on incompatible receiver").into()),
    }
}

fn to_datetime(this: &JsValue) -> JsResult<Option<chrono::DateTime<Utc>>> {
    Ok(this_time(this)?.and_then(|t| Utc.timestamp_millis_opt(t as i64).single()))
}

fn get_time(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(this_time(this)?.unwrap_or(f64::NAN)))
}

fn set_time(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Date.prototype.setTime called on non-object").into());
    };
    let n = args.first().cloned().unwrap_or_else(JsValue::undefined).to_number(context)?;
    let value = if n.is_finite() { Some(n) } else { None };
    obj.borrow_mut().data = ObjectData::Date(value);
    Ok(JsValue::from(value.unwrap_or(f64::NAN)))
}

fn get_full_year(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.year() as f64),
        None => JsValue::nan(),
    })
}

fn get_month(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from((dt.month() - 1) as f64),
        None => JsValue::nan(),
    })
}

fn get_date(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.day() as f64),
        None => JsValue::nan(),
    })
}

fn get_day(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.weekday().num_days_from_sunday() as f64),
        None => JsValue::nan(),
    })
}

fn get_hours(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.hour() as f64),
        None => JsValue::nan(),
    })
}

fn get_minutes(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.minute() as f64),
        None => JsValue::nan(),
    })
}

fn get_seconds(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match to_datetime(this)? {
        Some(dt) => JsValue::from(dt.second() as f64),
        None => JsValue::nan(),
    })
}

fn get_milliseconds(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(match this_time(this)? {
        Some(t) => JsValue::from(t.rem_euclid(1000.0)),
        None => JsValue::nan(),
    })
}

fn to_iso_string(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    match to_datetime(this)? {
        Some(dt) => Ok(JsValue::string(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())),
        None => Err(JsNativeError::range().with_message("Invalid time value").into()),
    }
}

fn now(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(current_time_millis()))
}

fn parse(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::from(parse_iso(&s).unwrap_or(f64::NAN)))
}
