//! Object identifier (OID) type.
//!
//! OIDs name managed objects and notification types. They are compared
//! arc-by-arc as unsigned integers, which gives the lexicographic ordering
//! used throughout SNMP.

use smallvec::SmallVec;

use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs in an OID (RFC 2578: 128 sub-identifiers).
pub const MAX_OID_LEN: usize = 128;

/// Inline arc capacity. Most real-world OIDs (MIB-2, enterprise traps)
/// fit in 12 arcs without heap allocation.
const INLINE_ARCS: usize = 12;

/// An object identifier: a sequence of unsigned 32-bit arcs.
///
/// # Example
///
/// ```rust
/// use snmp_dispatch::{Oid, oid};
///
/// let sys_uptime = oid!(1, 3, 6, 1, 2, 1, 1, 3, 0);
/// assert!(sys_uptime.starts_with(&oid!(1, 3, 6, 1, 2, 1, 1)));
/// assert_eq!(sys_uptime.to_string(), "1.3.6.1.2.1.1.3.0");
///
/// let parsed: Oid = "1.3.6.1.6.3.1.1.5.1".parse().unwrap();
/// assert_eq!(parsed.len(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; INLINE_ARCS]>,
}

impl Oid {
    /// Create an OID from arcs without validation.
    ///
    /// Intended for compile-time-known OIDs (the [`oid!`](crate::oid!) macro).
    /// Use [`Oid::new`] for untrusted input.
    pub fn from_arcs_unchecked(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create a validated OID from arcs.
    ///
    /// Enforces the ASN.1 structure rules: at least two arcs, first arc in
    /// 0..=2, second arc below 40 when the first is 0 or 1, and at most
    /// [`MAX_OID_LEN`] arcs.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Result<Self> {
        let arcs: SmallVec<[u32; INLINE_ARCS]> = arcs.into_iter().collect();
        if arcs.len() < 2 {
            return Err(Error::invalid_oid(OidErrorKind::TooShort));
        }
        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count: arcs.len(),
                max: MAX_OID_LEN,
            }));
        }
        if arcs[0] > 2 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(arcs[0])));
        }
        if arcs[0] < 2 && arcs[1] >= 40 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                first: arcs[0],
                second: arcs[1],
            }));
        }
        Ok(Self { arcs })
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// True if the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// True if this OID begins with `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.len() >= prefix.arcs.len() && self.arcs[..prefix.arcs.len()] == prefix.arcs[..]
    }

    /// Return a new OID with `arc` appended.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }
        // Accept a leading dot (".1.3.6.1" style) as net-snmp tools print it.
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        let mut arcs = SmallVec::<[u32; INLINE_ARCS]>::new();
        for part in trimmed.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }
        Oid::new(arcs).map_err(|e| match e {
            Error::InvalidOid { kind, .. } => Error::invalid_oid_with_input(kind, s),
            other => other,
        })
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<u32> for Oid {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self::from_arcs_unchecked(iter)
    }
}

/// Construct an [`Oid`] from literal arcs.
///
/// # Example
///
/// ```rust
/// use snmp_dispatch::oid;
///
/// let cold_start = oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1);
/// assert_eq!(cold_start.len(), 10);
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),+ $(,)?) => {
        $crate::Oid::from_arcs_unchecked([$($arc as u32),+])
    };
}
