use crate::id::{AccountKey, RequestId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a property request
///
/// Requests only ever progress forward along
/// Pending -> GovtVerified -> Surveyed -> Minted, or drop out of any
/// non-terminal status into Rejected. No other transition is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Submitted, awaiting government verification
    Pending,
    /// Parcel verified and khasra number assigned by a government officer
    GovtVerified,
    /// Land survey completed by a licensed surveyor
    Surveyed,
    /// Approved by the registrar; the record is now a transferable asset
    Minted,
    /// Terminally rejected before minting
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::GovtVerified => "govt_verified",
            RequestStatus::Surveyed => "surveyed",
            RequestStatus::Minted => "minted",
            RequestStatus::Rejected => "rejected",
        };
        write!(f, "{}", name)
    }
}

impl RequestStatus {
    /// Whether this status admits no further lifecycle transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Minted | RequestStatus::Rejected)
    }
}

/// Marketplace listing status of a minted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleStatus {
    /// Not listed
    None,
    /// Listed for outright sale at `price`
    ForSale,
    /// Listed for time-bounded lease at `lease_price`
    ForLease,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::None
    }
}

/// The caller-supplied descriptive fields of a new property request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertySubmission {
    /// Legal owner name as it should appear on the record
    pub owner_name: String,

    /// Postal/parcel address of the property
    pub property_address: String,

    /// Land area in square metres
    pub land_area: u64,

    /// Opaque hash linking to the submitter's off-chain legal identity
    pub identity_ref: String,

    /// Pointer to off-chain descriptive metadata (images, geolocation)
    pub metadata_ref: String,
}

/// A land-property record in the ledger
///
/// Created once by `request_registration` and never deleted. Once the
/// record is `Minted`, `requester` means "current owner" and changes on a
/// successful purchase; a lease never changes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyRequest {
    /// Ledger-assigned identifier
    pub id: RequestId,

    /// Submitter, and current owner once minted
    pub requester: AccountKey,

    /// Legal owner name supplied at submission
    pub owner_name: String,

    /// Postal/parcel address supplied at submission
    pub property_address: String,

    /// Land area in square metres
    pub land_area: u64,

    /// Opaque hash linking to the submitter's off-chain legal identity, immutable
    pub identity_ref: String,

    /// Official land-parcel reference, set only by government verification
    pub khasra_number: Option<String>,

    /// Pointer to off-chain descriptive metadata
    pub metadata_ref: String,

    /// Lifecycle status
    pub status: RequestStatus,

    /// Marketplace listing status; only meaningful once minted
    pub sale_status: SaleStatus,

    /// Asking price while listed for sale
    pub price: u64,

    /// Asking price per lease term while listed for lease
    pub lease_price: u64,

    /// Active tenant, if any lease has been granted
    pub tenant: Option<AccountKey>,

    /// End of the current lease term; tenancy is active only while
    /// `now < lease_end`
    pub lease_end: Option<Timestamp>,

    /// When the request was submitted
    pub requested_at: Timestamp,
}

impl PropertyRequest {
    /// Create a new request in `Pending` from a submission
    pub fn new(
        id: RequestId,
        requester: AccountKey,
        submission: PropertySubmission,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            id,
            requester,
            owner_name: submission.owner_name,
            property_address: submission.property_address,
            land_area: submission.land_area,
            identity_ref: submission.identity_ref,
            khasra_number: None,
            metadata_ref: submission.metadata_ref,
            status: RequestStatus::Pending,
            sale_status: SaleStatus::None,
            price: 0,
            lease_price: 0,
            tenant: None,
            lease_end: None,
            requested_at,
        }
    }

    /// Get the current owner (the submitter until minted, then whoever
    /// last bought the record)
    pub fn owner(&self) -> &AccountKey {
        &self.requester
    }

    /// Whether the record is a transferable asset
    pub fn is_minted(&self) -> bool {
        self.status == RequestStatus::Minted
    }

    /// Lease expiry is evaluated lazily: a tenancy is active only while
    /// the clock has not passed `lease_end`
    pub fn has_active_lease(&self, now: Timestamp) -> bool {
        match (self.tenant, self.lease_end) {
            (Some(_), Some(end)) => now < end,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> PropertySubmission {
        PropertySubmission {
            owner_name: "R. Sharma".to_string(),
            property_address: "12 Canal Road".to_string(),
            land_area: 420,
            identity_ref: "idhash:abc".to_string(),
            metadata_ref: "ipfs://QmParcel".to_string(),
        }
    }

    #[test]
    fn test_new_request_is_pending() {
        let requester = AccountKey::derive(&[b"submitter"]);
        let req = PropertyRequest::new(RequestId::new(1), requester, submission(), 1_000);

        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.sale_status, SaleStatus::None);
        assert_eq!(req.khasra_number, None);
        assert_eq!(req.price, 0);
        assert_eq!(req.tenant, None);
        assert_eq!(req.owner(), &requester);
        assert!(!req.is_minted());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RequestStatus::Minted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::GovtVerified.is_terminal());
        assert!(!RequestStatus::Surveyed.is_terminal());
    }

    #[test]
    fn test_lease_expiry_is_lazy() {
        let requester = AccountKey::derive(&[b"submitter"]);
        let tenant = AccountKey::derive(&[b"tenant"]);
        let mut req = PropertyRequest::new(RequestId::new(1), requester, submission(), 1_000);

        // No tenant yet
        assert!(!req.has_active_lease(1_000));

        req.tenant = Some(tenant);
        req.lease_end = Some(2_000);

        assert!(req.has_active_lease(1_999));
        assert!(!req.has_active_lease(2_000));
        assert!(!req.has_active_lease(3_000));
    }
}
