//! Decoded SNMP values.
//!
//! This crate consumes and produces already-decoded protocol data units;
//! wire encoding is the codec layer's job. `Value` therefore carries the
//! decoded representation only.

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::oid::Oid;

/// A decoded SNMP value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// ASN.1 INTEGER.
    Integer(i32),
    /// OCTET STRING (arbitrary bytes, often text).
    OctetString(Bytes),
    /// OBJECT IDENTIFIER.
    ObjectId(Oid),
    /// IpAddress (RFC 2578).
    IpAddress(Ipv4Addr),
    /// Counter32: wraps at 2^32.
    Counter32(u32),
    /// Gauge32 / Unsigned32.
    Gauge32(u32),
    /// TimeTicks: hundredths of a second.
    TimeTicks(u32),
    /// Counter64.
    Counter64(u64),
    /// Opaque (legacy wrapped encoding).
    Opaque(Bytes),
    /// ASN.1 NULL.
    Null,
}

impl Value {
    /// Render an OCTET STRING as text if it is printable ASCII.
    fn fmt_octets(f: &mut std::fmt::Formatter<'_>, bytes: &Bytes) -> std::fmt::Result {
        if bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            write!(f, "{}", String::from_utf8_lossy(bytes))
        } else {
            for (i, b) in bytes.iter().enumerate() {
                if i > 0 {
                    write!(f, ":")?;
                }
                write!(f, "{:02X}", b)?;
            }
            Ok(())
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(b) => Self::fmt_octets(f, b),
            Value::ObjectId(oid) => write!(f, "{}", oid),
            Value::IpAddress(ip) => write!(f, "{}", ip),
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::Opaque(b) => Self::fmt_octets(f, b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectId(oid)
    }
}
