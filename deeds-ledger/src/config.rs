use deeds_core::identity::Role;
use serde::{Deserialize, Serialize};

/// Out-of-band access secrets required to register under a privileged role
///
/// The secrets themselves are provisioned outside the ledger; the ledger
/// only compares what a registering caller supplies against these values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessSecrets {
    pub govt_officer: String,
    pub surveyor: String,
    pub registrar: String,
}

impl AccessSecrets {
    /// The secret expected for a role, if the role is privileged
    pub fn for_role(&self, role: Role) -> Option<&str> {
        match role {
            Role::GovtOfficer => Some(&self.govt_officer),
            Role::Surveyor => Some(&self.surveyor),
            Role::Registrar => Some(&self.registrar),
            Role::Unset | Role::User | Role::Admin => None,
        }
    }
}

impl Default for AccessSecrets {
    fn default() -> Self {
        Self {
            govt_officer: String::new(),
            surveyor: String::new(),
            registrar: String::new(),
        }
    }
}

/// Static configuration of a ledger instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Exact fee attached to `request_registration`
    pub registration_fee: u64,

    /// Lease term in seconds granted by `rent_property`
    pub lease_term_secs: u64,

    /// Platform cut retained from each sale, in basis points
    pub sale_cut_bps: u64,

    /// Access secrets for privileged role registration
    pub secrets: AccessSecrets,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            registration_fee: 100,
            // 30 days
            lease_term_secs: 30 * 24 * 60 * 60,
            sale_cut_bps: 0,
            secrets: AccessSecrets::default(),
        }
    }
}

impl LedgerConfig {
    /// The platform cut retained from a sale of `price`
    ///
    /// `sale_cut_bps` is capped at 10_000, so the cut never exceeds the
    /// price and the seller's share never underflows.
    pub fn sale_cut(&self, price: u64) -> u64 {
        let bps = self.sale_cut_bps.min(10_000);
        price.saturating_mul(bps) / 10_000
    }
}
