//! Decoded protocol data units.
//!
//! The dispatch engine routes PDUs; it never encodes them. A [`Pdu`] is the
//! decoded message body handed to the transport collaborator (outgoing) or
//! received from the request-processing pipeline (incoming proxy requests).

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::varbind::VarBind;

/// PDU type (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    GetBulkRequest,
    SetRequest,
    Response,
    /// SNMPv1 trap (converted from TrapV2 on v1 targets).
    TrapV1,
    /// SNMPv2 trap (unacknowledged notification).
    TrapV2,
    /// Inform request (acknowledged notification).
    InformRequest,
    Report,
}

/// The category a PDU type belongs to for proxy registration (RFC 2573).
///
/// A [`ProxyForwarder`](crate::proxy::ProxyForwarder) registers for one
/// category; `All` matches every forwardable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PduCategory {
    /// All forwardable PDU types.
    All,
    /// set
    Write,
    /// get, get-next, get-bulk
    Read,
    /// trap
    Notify,
    /// inform
    Inform,
}

impl PduCategory {
    /// The category of a concrete PDU type, or `None` for types that are
    /// never forwarded (responses, reports).
    pub fn of(pdu_type: PduType) -> Option<PduCategory> {
        match pdu_type {
            PduType::GetRequest | PduType::GetNextRequest | PduType::GetBulkRequest => {
                Some(PduCategory::Read)
            }
            PduType::SetRequest => Some(PduCategory::Write),
            PduType::TrapV1 | PduType::TrapV2 => Some(PduCategory::Notify),
            PduType::InformRequest => Some(PduCategory::Inform),
            PduType::Response | PduType::Report => None,
        }
    }

    /// True if a forwarder registered for `self` handles `category`.
    pub fn covers(&self, category: PduCategory) -> bool {
        *self == PduCategory::All || *self == category
    }

    /// True if relay for this category resolves a single outbound target
    /// (read/write) rather than a target list (notify/inform).
    pub fn is_single_target(&self) -> bool {
        matches!(self, PduCategory::Read | PduCategory::Write)
    }

    /// Numeric code used as the snmpProxyType table value (RFC 2573).
    pub fn as_i32(&self) -> i32 {
        match self {
            PduCategory::Read => 1,
            PduCategory::Write => 2,
            PduCategory::Notify => 3,
            PduCategory::Inform => 4,
            PduCategory::All => 5,
        }
    }
}

impl std::fmt::Display for PduCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PduCategory::All => write!(f, "all"),
            PduCategory::Write => write!(f, "write"),
            PduCategory::Read => write!(f, "read"),
            PduCategory::Notify => write!(f, "notify"),
            PduCategory::Inform => write!(f, "inform"),
        }
    }
}

/// Notification header carried by trap/inform PDUs.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyHeader {
    /// The trap OID identifying the event (snmpTrapOID.0).
    pub trap_oid: Oid,
    /// Enterprise OID; empty for all but enterprise-specific v1 traps.
    pub enterprise: Oid,
    /// sysUpTime at generation, hundredths of a second.
    pub timestamp: u32,
}

/// A decoded protocol data unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type.
    pub pdu_type: PduType,
    /// Request ID for correlation; the transport rewrites it for relayed
    /// requests so downstream responses never collide with upstream IDs.
    pub request_id: i32,
    /// Error status (responses only; NoError otherwise).
    pub error_status: ErrorStatus,
    /// 1-based index of the failing varbind, 0 if none.
    pub error_index: i32,
    /// Ordered variable bindings.
    pub varbinds: Vec<VarBind>,
    /// Present for trap/inform PDUs.
    pub notify: Option<NotifyHeader>,
}

impl Pdu {
    /// Create a request PDU (get/get-next/get-bulk/set).
    pub fn request(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            varbinds,
            notify: None,
        }
    }

    /// Create a notification PDU (trap or inform).
    pub fn notification(
        pdu_type: PduType,
        varbinds: Vec<VarBind>,
        trap_oid: Oid,
        enterprise: Oid,
        timestamp: u32,
    ) -> Self {
        Self {
            pdu_type,
            request_id: 0,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            varbinds,
            notify: Some(NotifyHeader {
                trap_oid,
                enterprise,
                timestamp,
            }),
        }
    }

    /// Create a response PDU echoing a request ID.
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            varbinds,
            notify: None,
        }
    }

    /// Create an error response for a request.
    pub fn error_response(request_id: i32, status: ErrorStatus, index: i32) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id,
            error_status: status,
            error_index: index,
            varbinds: Vec::new(),
            notify: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    #[test]
    fn test_category_of_pdu_type() {
        assert_eq!(PduCategory::of(PduType::GetRequest), Some(PduCategory::Read));
        assert_eq!(
            PduCategory::of(PduType::GetBulkRequest),
            Some(PduCategory::Read)
        );
        assert_eq!(PduCategory::of(PduType::SetRequest), Some(PduCategory::Write));
        assert_eq!(PduCategory::of(PduType::TrapV2), Some(PduCategory::Notify));
        assert_eq!(
            PduCategory::of(PduType::InformRequest),
            Some(PduCategory::Inform)
        );
        assert_eq!(PduCategory::of(PduType::Response), None);
        assert_eq!(PduCategory::of(PduType::Report), None);
    }

    #[test]
    fn test_category_covers() {
        assert!(PduCategory::All.covers(PduCategory::Read));
        assert!(PduCategory::All.covers(PduCategory::Inform));
        assert!(PduCategory::Read.covers(PduCategory::Read));
        assert!(!PduCategory::Read.covers(PduCategory::Write));
        assert!(!PduCategory::Notify.covers(PduCategory::Inform));
    }

    #[test]
    fn test_single_target_categories() {
        assert!(PduCategory::Read.is_single_target());
        assert!(PduCategory::Write.is_single_target());
        assert!(!PduCategory::Notify.is_single_target());
        assert!(!PduCategory::Inform.is_single_target());
        assert!(!PduCategory::All.is_single_target());
    }

    #[test]
    fn test_notification_pdu_carries_header() {
        let pdu = Pdu::notification(
            PduType::TrapV2,
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(1))],
            oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1),
            Oid::default(),
            1,
        );
        let header = pdu.notify.expect("notification header");
        assert_eq!(header.trap_oid, oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1));
        assert!(header.enterprise.is_empty());
    }
}
