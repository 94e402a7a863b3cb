//! Display text for PostgreSQL values without a typed decoder
//!
//! Works on the binary wire format, so every non-NULL value renders to
//! something: arrays in `{a,b}` literal form, `bytea` as `\x` hex, intervals
//! and `timetz` the way psql prints them, and numerics too wide (or too
//! special) for rust_decimal.

use crate::db::decode::format_float;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::error::Error;
use tokio_postgres::types::{FromSql, Kind, Type};

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Any non-NULL value as display text.
pub struct OpaqueText(pub String);

impl<'a> FromSql<'a> for OpaqueText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(OpaqueText(value_text(ty, raw)))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

pub fn value_text(ty: &Type, raw: &[u8]) -> String {
    match ty.kind() {
        Kind::Array(elem) => array_text(elem, raw).unwrap_or_else(|| hex(raw)),
        Kind::Domain(inner) => value_text(inner, raw),
        _ => scalar_text(ty, raw),
    }
}

fn typed<'a, T: FromSql<'a>>(ty: &Type, raw: &'a [u8]) -> Option<T> {
    if T::accepts(ty) { T::from_sql(ty, raw).ok() } else { None }
}

fn scalar_text(ty: &Type, raw: &[u8]) -> String {
    let special = if *ty == Type::BYTEA {
        Some(hex(raw))
    } else if *ty == Type::INTERVAL {
        interval_text(raw)
    } else if *ty == Type::TIMETZ {
        timetz_text(raw)
    } else if *ty == Type::NUMERIC {
        numeric_text(raw)
    } else {
        None
    };

    special
        .or_else(|| typed::<String>(ty, raw))
        .or_else(|| typed::<bool>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<i64>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<i32>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<i16>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<u32>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<f64>(ty, raw).map(format_float))
        .or_else(|| typed::<f32>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<uuid::Uuid>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<serde_json::Value>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<NaiveDateTime>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<DateTime<Utc>>(ty, raw).map(|v| v.to_rfc3339()))
        .or_else(|| typed::<NaiveDate>(ty, raw).map(|v| v.to_string()))
        .or_else(|| typed::<NaiveTime>(ty, raw).map(|v| v.to_string()))
        // enums and other text-shaped types send their label as-is
        .or_else(|| std::str::from_utf8(raw).ok().map(str::to_string))
        .unwrap_or_else(|| hex(raw))
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Some(head)
    }

    fn i16(&mut self) -> Option<i16> {
        self.take(2).and_then(|b| b.try_into().ok()).map(i16::from_be_bytes)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).and_then(|b| b.try_into().ok()).map(u16::from_be_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take(4).and_then(|b| b.try_into().ok()).map(i32::from_be_bytes)
    }

    fn i64(&mut self) -> Option<i64> {
        self.take(8).and_then(|b| b.try_into().ok()).map(i64::from_be_bytes)
    }
}

fn hex(raw: &[u8]) -> String {
    let digits: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
    format!("\\x{}", digits)
}

fn array_text(elem: &Type, raw: &[u8]) -> Option<String> {
    let mut r = Reader::new(raw);
    let ndim = usize::try_from(r.i32()?).ok()?;
    let _has_nulls = r.i32()?;
    let _elem_oid = r.i32()?;
    if ndim == 0 {
        return Some("{}".to_string());
    }

    let mut dims = Vec::with_capacity(ndim);
    for _ in 0..ndim {
        dims.push(usize::try_from(r.i32()?).ok()?);
        let _lower_bound = r.i32()?;
    }

    let mut out = String::new();
    write_dimension(&mut r, elem, &dims, &mut out)?;
    Some(out)
}

fn write_dimension(r: &mut Reader<'_>, elem: &Type, dims: &[usize], out: &mut String) -> Option<()> {
    let (len, inner) = dims.split_first()?;
    out.push('{');
    for i in 0..*len {
        if i > 0 {
            out.push(',');
        }
        if !inner.is_empty() {
            write_dimension(r, elem, inner, out)?;
            continue;
        }
        let size = r.i32()?;
        if size < 0 {
            out.push_str("NULL");
        } else {
            let bytes = r.take(usize::try_from(size).ok()?)?;
            out.push_str(&quote_element(&value_text(elem, bytes)));
        }
    }
    out.push('}');
    Some(())
}

fn quote_element(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.eq_ignore_ascii_case("null")
        || s.chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace());
    if !needs_quotes {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// `HH:MM:SS[.ffffff]`, hours unbounded, trailing fraction zeros dropped
fn clock_text(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let total = micros.unsigned_abs();
    let secs = total / 1_000_000;
    let frac = total % 1_000_000;
    let mut s = format!("{}{:02}:{:02}:{:02}", sign, secs / 3600, secs / 60 % 60, secs % 60);
    if frac != 0 {
        s.push_str(format!(".{:06}", frac).trim_end_matches('0'));
    }
    s
}

fn plural(n: i32, unit: &str) -> String {
    if n == 1 { format!("{} {}", n, unit) } else { format!("{} {}s", n, unit) }
}

fn interval_text(raw: &[u8]) -> Option<String> {
    let mut r = Reader::new(raw);
    let micros = r.i64()?;
    let days = r.i32()?;
    let months = r.i32()?;

    let mut parts = Vec::new();
    if months / 12 != 0 {
        parts.push(plural(months / 12, "year"));
    }
    if months % 12 != 0 {
        parts.push(plural(months % 12, "mon"));
    }
    if days != 0 {
        parts.push(plural(days, "day"));
    }
    if micros != 0 || parts.is_empty() {
        parts.push(clock_text(micros));
    }
    Some(parts.join(" "))
}

fn timetz_text(raw: &[u8]) -> Option<String> {
    let mut r = Reader::new(raw);
    let micros = r.i64()?;
    // seconds west of UTC
    let zone = r.i32()?;

    let east = -i64::from(zone);
    let sign = if east < 0 { '-' } else { '+' };
    let abs = east.unsigned_abs();
    let mut offset = format!("{}{:02}", sign, abs / 3600);
    if abs % 3600 != 0 {
        offset.push_str(&format!(":{:02}", abs / 60 % 60));
    }
    if abs % 60 != 0 {
        offset.push_str(&format!(":{:02}", abs % 60));
    }
    Some(format!("{}{}", clock_text(micros), offset))
}

/// Base-10000 digit groups with a weight and display scale.
fn numeric_text(raw: &[u8]) -> Option<String> {
    let mut r = Reader::new(raw);
    let ndigits = usize::from(r.u16()?);
    let weight = i32::from(r.i16()?);
    let sign = r.u16()?;
    let dscale = usize::from(r.u16()?);

    match sign {
        NUMERIC_NAN => return Some("NaN".to_string()),
        NUMERIC_PINF => return Some("Infinity".to_string()),
        NUMERIC_NINF => return Some("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|_| r.i16())
        .collect::<Option<Vec<i16>>>()?;
    let digit_at = |w: i32| -> i16 {
        usize::try_from(weight - w)
            .ok()
            .and_then(|idx| digits.get(idx).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit_at(weight).to_string());
        for w in (0..weight).rev() {
            out.push_str(&format!("{:04}", digit_at(w)));
        }
    }
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut w = -1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit_at(w)));
            w -= 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Some(out)
}
