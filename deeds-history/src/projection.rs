use deeds_core::error::LedgerError;
use deeds_core::events::LedgerEvent;
use deeds_core::id::{AccountKey, RequestId, Timestamp};
use deeds_core::identity::NameResolver;
use deeds_store::EventJournal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display label used when a key is unregistered or is the zero/system key
pub const UNKNOWN_PARTY: &str = "unregistered account";

/// The kind of audit entry derived from an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
    /// The record became a transferable asset under its first owner
    Minted,
    /// Ownership changed hands for `amount`
    Sold,
    /// A lease was granted until `lease_end` for `amount`
    Rented { lease_end: Timestamp },
}

/// One line of a property's audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the underlying event committed
    pub at: Timestamp,

    /// What happened
    pub kind: HistoryKind,

    /// The owner (mint/sale) or tenant (lease) the entry concerns
    pub party: AccountKey,

    /// Display name resolved at projection time
    pub party_name: String,

    /// Amount paid; zero for minting
    pub amount: u64,
}

/// The full audit trail of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PropertyHistory {
    pub entries: Vec<HistoryEntry>,
}

impl PropertyHistory {
    /// The key of the current owner, if the property has been minted
    pub fn current_owner(&self) -> Option<&AccountKey> {
        self.entries
            .iter()
            .rev()
            .find(|e| matches!(e.kind, HistoryKind::Minted | HistoryKind::Sold))
            .map(|e| &e.party)
    }
}

/// Derived, append-only view over the ledger's event stream
///
/// Holds no state of its own beyond what a replay produces: rebuilding
/// from scratch over the same events yields an identical projection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryProjection {
    per_property: BTreeMap<RequestId, PropertyHistory>,
}

impl HistoryProjection {
    /// The audit trail of one property
    pub fn property(&self, id: RequestId) -> Option<&PropertyHistory> {
        self.per_property.get(&id)
    }

    /// All audited properties, ordered by id
    pub fn properties(&self) -> impl Iterator<Item = (&RequestId, &PropertyHistory)> {
        self.per_property.iter()
    }

    /// Number of audited properties
    pub fn len(&self) -> usize {
        self.per_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_property.is_empty()
    }
}

fn resolve(resolver: &dyn NameResolver, key: &AccountKey) -> String {
    if key.is_zero() {
        return UNKNOWN_PARTY.to_string();
    }
    resolver
        .display_name(key)
        .unwrap_or_else(|| UNKNOWN_PARTY.to_string())
}

/// Fold an ordered event stream into a history projection
///
/// Pure: no side effects, deterministic for a given stream and resolver.
/// Only `Minted`, `Sold`, and `Rented` produce entries; `Submitted` is
/// consumed to learn who owned the record at mint time, and everything
/// else is skipped.
pub fn fold_events<'a, I>(events: I, resolver: &dyn NameResolver) -> HistoryProjection
where
    I: IntoIterator<Item = &'a LedgerEvent>,
{
    let mut projection = HistoryProjection::default();
    // Submitter of each request, so Minted can attribute the first owner
    let mut submitters: BTreeMap<RequestId, AccountKey> = BTreeMap::new();

    for event in events {
        match event {
            LedgerEvent::Submitted { id, requester, .. } => {
                submitters.insert(*id, *requester);
            }
            LedgerEvent::Minted { id, at } => {
                let owner = submitters.get(id).copied().unwrap_or_else(AccountKey::zero);
                projection
                    .per_property
                    .entry(*id)
                    .or_default()
                    .entries
                    .push(HistoryEntry {
                        at: *at,
                        kind: HistoryKind::Minted,
                        party: owner,
                        party_name: resolve(resolver, &owner),
                        amount: 0,
                    });
            }
            LedgerEvent::Sold {
                id, to, amount, at, ..
            } => {
                projection
                    .per_property
                    .entry(*id)
                    .or_default()
                    .entries
                    .push(HistoryEntry {
                        at: *at,
                        kind: HistoryKind::Sold,
                        party: *to,
                        party_name: resolve(resolver, to),
                        amount: *amount,
                    });
            }
            LedgerEvent::Rented {
                id,
                tenant,
                amount,
                start,
                end,
            } => {
                projection
                    .per_property
                    .entry(*id)
                    .or_default()
                    .entries
                    .push(HistoryEntry {
                        at: *start,
                        kind: HistoryKind::Rented { lease_end: *end },
                        party: *tenant,
                        party_name: resolve(resolver, tenant),
                        amount: *amount,
                    });
            }
            LedgerEvent::Verified { .. }
            | LedgerEvent::Surveyed { .. }
            | LedgerEvent::Rejected { .. }
            | LedgerEvent::Listed { .. }
            | LedgerEvent::Withdrawn { .. } => {}
        }
    }

    projection
}

/// Rebuild the projection from a journal, oldest event first
pub fn replay_journal(
    journal: &dyn EventJournal,
    resolver: &dyn NameResolver,
) -> Result<HistoryProjection, LedgerError> {
    let events: Vec<LedgerEvent> = journal.iter_events().collect::<Result<Vec<_>, _>>()?;
    Ok(fold_events(events.iter(), resolver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn keys() -> (AccountKey, AccountKey, AccountKey) {
        (
            AccountKey::derive(&[b"asha"]),
            AccountKey::derive(&[b"bela"]),
            AccountKey::derive(&[b"tariq"]),
        )
    }

    fn names(owner: AccountKey, buyer: AccountKey, tenant: AccountKey) -> HashMap<AccountKey, String> {
        let mut names = HashMap::new();
        names.insert(owner, "Asha".to_string());
        names.insert(buyer, "Bela".to_string());
        names.insert(tenant, "Tariq".to_string());
        names
    }

    fn sample_stream(owner: AccountKey, buyer: AccountKey, tenant: AccountKey) -> Vec<LedgerEvent> {
        let id = RequestId::new(1);
        vec![
            LedgerEvent::Submitted {
                id,
                requester: owner,
                fee: 100,
                at: 10,
            },
            LedgerEvent::Verified {
                id,
                khasra_number: "KH-102/7".to_string(),
                at: 20,
            },
            LedgerEvent::Surveyed { id, at: 30 },
            LedgerEvent::Minted { id, at: 40 },
            LedgerEvent::Sold {
                id,
                from: owner,
                to: buyer,
                amount: 5_000,
                at: 50,
            },
            LedgerEvent::Rented {
                id,
                tenant,
                amount: 250,
                start: 60,
                end: 1_060,
            },
        ]
    }

    #[test]
    fn test_fold_produces_ownership_timeline() {
        let (owner, buyer, tenant) = keys();
        let events = sample_stream(owner, buyer, tenant);
        let resolver = names(owner, buyer, tenant);

        let projection = fold_events(events.iter(), &resolver);
        assert_eq!(projection.len(), 1);

        let history = projection.property(RequestId::new(1)).expect("history");
        assert_eq!(history.entries.len(), 3);

        assert_eq!(history.entries[0].kind, HistoryKind::Minted);
        assert_eq!(history.entries[0].party, owner);
        assert_eq!(history.entries[0].party_name, "Asha");
        assert_eq!(history.entries[0].amount, 0);

        assert_eq!(history.entries[1].kind, HistoryKind::Sold);
        assert_eq!(history.entries[1].party, buyer);
        assert_eq!(history.entries[1].party_name, "Bela");
        assert_eq!(history.entries[1].amount, 5_000);

        assert_eq!(history.entries[2].kind, HistoryKind::Rented { lease_end: 1_060 });
        assert_eq!(history.entries[2].party_name, "Tariq");

        // Leases never change ownership
        assert_eq!(history.current_owner(), Some(&buyer));
    }

    #[test]
    fn test_fold_is_deterministic() {
        let (owner, buyer, tenant) = keys();
        let events = sample_stream(owner, buyer, tenant);
        let resolver = names(owner, buyer, tenant);

        let first = fold_events(events.iter(), &resolver);
        let second = fold_events(events.iter(), &resolver);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_keys_fall_back_to_generic_label() {
        let (owner, buyer, tenant) = keys();
        let events = sample_stream(owner, buyer, tenant);
        // Empty resolver: nobody is registered
        let resolver: HashMap<AccountKey, String> = HashMap::new();

        let projection = fold_events(events.iter(), &resolver);
        let history = projection.property(RequestId::new(1)).expect("history");
        for entry in &history.entries {
            assert_eq!(entry.party_name, UNKNOWN_PARTY);
        }
    }

    #[test]
    fn test_mint_without_submission_attributes_zero_key() {
        let events = vec![LedgerEvent::Minted {
            id: RequestId::new(9),
            at: 40,
        }];
        let resolver: HashMap<AccountKey, String> = HashMap::new();

        let projection = fold_events(events.iter(), &resolver);
        let history = projection.property(RequestId::new(9)).expect("history");
        assert_eq!(history.entries[0].party, AccountKey::zero());
        assert_eq!(history.entries[0].party_name, UNKNOWN_PARTY);
    }

    #[test]
    fn test_replay_from_live_ledger_journal() {
        use deeds_ledger::{AccessSecrets, Ledger, LedgerConfig, ManualClock};
        use deeds_store::MemoryEventJournal;
        use std::sync::Arc;

        let clock = Arc::new(ManualClock::new(1_000));
        let config = LedgerConfig {
            registration_fee: 100,
            lease_term_secs: 1_000,
            sale_cut_bps: 0,
            secrets: AccessSecrets {
                govt_officer: "o".to_string(),
                surveyor: "s".to_string(),
                registrar: "r".to_string(),
            },
        };
        let admin = AccountKey::derive(&[b"admin"]);
        let mut ledger = Ledger::with_clock(admin, config, clock);
        let journal = Arc::new(MemoryEventJournal::new());
        ledger.attach_journal(journal.clone());

        let seller = AccountKey::derive(&[b"seller"]);
        let buyer = AccountKey::derive(&[b"buyer"]);
        let officer = AccountKey::derive(&[b"officer"]);
        let surveyor = AccountKey::derive(&[b"surveyor"]);
        let registrar = AccountKey::derive(&[b"registrar"]);
        ledger
            .register_user(seller, "Asha", "a@example.com", deeds_core::Role::User, None, "id:a")
            .expect("register seller");
        ledger
            .register_user(buyer, "Bela", "b@example.com", deeds_core::Role::User, None, "id:b")
            .expect("register buyer");
        ledger
            .register_user(officer, "Officer", "", deeds_core::Role::GovtOfficer, Some("o"), "id:o")
            .expect("register officer");
        ledger
            .register_user(surveyor, "Surveyor", "", deeds_core::Role::Surveyor, Some("s"), "id:s")
            .expect("register surveyor");
        ledger
            .register_user(registrar, "Registrar", "", deeds_core::Role::Registrar, Some("r"), "id:r")
            .expect("register registrar");

        let id = ledger
            .request_registration(
                seller,
                deeds_core::PropertySubmission {
                    owner_name: "Asha".to_string(),
                    property_address: "12 Canal Road".to_string(),
                    land_area: 250,
                    identity_ref: "id:a".to_string(),
                    metadata_ref: "ipfs://QmParcel".to_string(),
                },
                100,
            )
            .expect("submit");
        ledger.verify_by_govt(officer, id, "KH-102/7").expect("verify");
        ledger.complete_survey(surveyor, id).expect("survey");
        ledger.approve_and_mint(registrar, id).expect("mint");
        ledger.list_for_sale(seller, id, 5_000).expect("list");
        ledger.buy_property(buyer, id, "Bela", 5_000).expect("buy");

        // The projection resolves names through the ledger's registry
        let projection = replay_journal(journal.as_ref(), &ledger).expect("replay");
        let history = projection.property(id).expect("history");
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.entries[0].party_name, "Asha");
        assert_eq!(history.entries[1].party_name, "Bela");
        assert_eq!(history.current_owner(), Some(&buyer));
    }
}
