use crate::id::{AccountKey, RequestId, Timestamp};
use crate::property::SaleStatus;
use serde::{Deserialize, Serialize};

/// Events emitted by the ledger, in commit order
///
/// The event stream is the authoritative audit trail: the history
/// projection is rebuilt from scratch by folding over it, so every
/// mutating operation appends exactly one event describing its effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A new request entered the ledger in Pending
    Submitted {
        id: RequestId,
        requester: AccountKey,
        fee: u64,
        at: Timestamp,
    },

    /// A government officer verified the parcel and assigned its khasra number
    Verified {
        id: RequestId,
        khasra_number: String,
        at: Timestamp,
    },

    /// A surveyor completed the land survey
    Surveyed { id: RequestId, at: Timestamp },

    /// The registrar approved the request; the record is now transferable
    Minted { id: RequestId, at: Timestamp },

    /// The request was terminally rejected before minting
    Rejected { id: RequestId, at: Timestamp },

    /// The owner listed a minted record for sale or lease
    Listed {
        id: RequestId,
        sale_status: SaleStatus,
        amount: u64,
        at: Timestamp,
    },

    /// Ownership transferred on a successful purchase
    Sold {
        id: RequestId,
        from: AccountKey,
        to: AccountKey,
        amount: u64,
        at: Timestamp,
    },

    /// A time-bounded lease was granted; ownership is unaffected
    Rented {
        id: RequestId,
        tenant: AccountKey,
        amount: u64,
        start: Timestamp,
        end: Timestamp,
    },

    /// The admin drained the treasury balance
    Withdrawn {
        to: AccountKey,
        amount: u64,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// The request this event concerns, if it concerns one
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            LedgerEvent::Submitted { id, .. }
            | LedgerEvent::Verified { id, .. }
            | LedgerEvent::Surveyed { id, .. }
            | LedgerEvent::Minted { id, .. }
            | LedgerEvent::Rejected { id, .. }
            | LedgerEvent::Listed { id, .. }
            | LedgerEvent::Sold { id, .. }
            | LedgerEvent::Rented { id, .. } => Some(*id),
            LedgerEvent::Withdrawn { .. } => None,
        }
    }

    /// When the event was committed
    pub fn timestamp(&self) -> Timestamp {
        match self {
            LedgerEvent::Submitted { at, .. }
            | LedgerEvent::Verified { at, .. }
            | LedgerEvent::Surveyed { at, .. }
            | LedgerEvent::Minted { at, .. }
            | LedgerEvent::Rejected { at, .. }
            | LedgerEvent::Listed { at, .. }
            | LedgerEvent::Sold { at, .. }
            | LedgerEvent::Withdrawn { at, .. } => *at,
            LedgerEvent::Rented { start, .. } => *start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_accessor() {
        let id = RequestId::new(7);
        let minted = LedgerEvent::Minted { id, at: 100 };
        assert_eq!(minted.request_id(), Some(id));

        let withdrawn = LedgerEvent::Withdrawn {
            to: AccountKey::zero(),
            amount: 50,
            at: 100,
        };
        assert_eq!(withdrawn.request_id(), None);
    }

    #[test]
    fn test_rented_timestamp_is_lease_start() {
        let ev = LedgerEvent::Rented {
            id: RequestId::new(3),
            tenant: AccountKey::derive(&[b"tenant"]),
            amount: 25,
            start: 500,
            end: 900,
        };
        assert_eq!(ev.timestamp(), 500);
    }

    #[test]
    fn test_event_bincode_round_trip() {
        let ev = LedgerEvent::Sold {
            id: RequestId::new(9),
            from: AccountKey::derive(&[b"seller"]),
            to: AccountKey::derive(&[b"buyer"]),
            amount: 1_000,
            at: 777,
        };

        let bytes = bincode::serialize(&ev).expect("serialize");
        let back: LedgerEvent = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(ev, back);
    }
}
