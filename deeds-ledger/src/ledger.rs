use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::treasury::Treasury;
use deeds_core::error::LedgerError;
use deeds_core::events::LedgerEvent;
use deeds_core::id::{AccountKey, RequestId};
use deeds_core::identity::{IdentityRecord, NameResolver, Role};
use deeds_core::property::{PropertyRequest, PropertySubmission, RequestStatus, SaleStatus};
use deeds_store::EventJournal;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// The mutable registry state, guarded by a single mutex
///
/// Every authorization read (role, status, ownership, lease expiry) is
/// taken under the same guard as the mutation it gates, so each operation
/// observes and produces one consistent snapshot.
struct LedgerState {
    /// Identity records keyed by authentication key
    identities: HashMap<AccountKey, IdentityRecord>,

    /// All property requests, keyed by their assigned identifier
    requests: BTreeMap<RequestId, PropertyRequest>,

    /// The identifier the next submission will receive
    next_id: RequestId,

    /// Fee and payment bookkeeping
    treasury: Treasury,

    /// Events emitted so far, in commit order
    events: Vec<LedgerEvent>,
}

/// The authoritative land-property ledger
///
/// Owns the identity registry, the request lifecycle state machine, the
/// marketplace extension, and the treasury. All mutating operations are
/// serialized and either commit in full or fail without touching state,
/// so a retry after failure is always safe as a fresh operation.
pub struct Ledger {
    state: Mutex<LedgerState>,
    config: LedgerConfig,
    admin: AccountKey,
    clock: Arc<dyn Clock>,
    journal: Option<Arc<dyn EventJournal>>,
}

impl Ledger {
    /// Create a ledger with the given admin key and configuration
    ///
    /// The admin key is fixed for the lifetime of the ledger and is
    /// registered as the only `Admin` identity; `register_user` cannot
    /// grant that role.
    pub fn new(admin: AccountKey, config: LedgerConfig) -> Self {
        Self::with_clock(admin, config, Arc::new(SystemClock))
    }

    /// Create a ledger driven by an explicit clock
    pub fn with_clock(admin: AccountKey, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let mut identities = HashMap::new();
        identities.insert(
            admin,
            IdentityRecord::new(
                admin,
                "platform-admin".to_string(),
                String::new(),
                Role::Admin,
                String::new(),
                clock.now(),
            ),
        );

        Self {
            state: Mutex::new(LedgerState {
                identities,
                requests: BTreeMap::new(),
                next_id: RequestId::new(1),
                treasury: Treasury::new(),
                events: Vec::new(),
            }),
            config,
            admin,
            clock,
            journal: None,
        }
    }

    /// Attach a journal; every event emitted from now on is appended to it
    pub fn attach_journal(&mut self, journal: Arc<dyn EventJournal>) {
        self.journal = Some(journal);
    }

    /// The fixed admin key
    pub fn admin_key(&self) -> &AccountKey {
        &self.admin
    }

    /// The ledger configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        self.state
            .lock()
            .map_err(|e| LedgerError::Other(format!("Failed to acquire ledger lock: {}", e)))
    }

    /// Record an event in commit order and mirror it to the journal
    ///
    /// A journal write failure does not abort the committed operation; the
    /// in-memory event stream stays authoritative and the failure is
    /// surfaced in the log.
    fn emit(&self, state: &mut LedgerState, event: LedgerEvent) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(&event) {
                warn!("failed to journal event {:?}: {}", event, e);
            }
        }
        state.events.push(event);
    }

    fn role_of(state: &LedgerState, key: &AccountKey) -> Role {
        state
            .identities
            .get(key)
            .map(|record| record.role)
            .unwrap_or(Role::Unset)
    }

    // ---- Identity registry ----

    /// Register the caller's key with a profile and role
    ///
    /// A key registers exactly once; a second call always fails with
    /// `AlreadyRegistered` and never overwrites. Privileged roles require
    /// the matching out-of-band access secret. `Admin` is fixed at
    /// construction and cannot be requested here.
    pub fn register_user(
        &self,
        caller: AccountKey,
        name: &str,
        email: &str,
        role: Role,
        access_secret: Option<&str>,
        identity_proof: &str,
    ) -> Result<(), LedgerError> {
        if caller.is_zero() {
            return Err(LedgerError::Unauthorized(
                "the zero key cannot register".to_string(),
            ));
        }

        let mut state = self.lock()?;
        // A registered key always fails here, whatever the arguments
        if state.identities.contains_key(&caller) {
            return Err(LedgerError::AlreadyRegistered);
        }

        match role {
            Role::Admin | Role::Unset => {
                return Err(LedgerError::Unauthorized(format!(
                    "role {} cannot be requested at registration",
                    role
                )));
            }
            Role::User | Role::GovtOfficer | Role::Surveyor | Role::Registrar => {}
        }

        if let Some(expected) = self.config.secrets.for_role(role) {
            match access_secret {
                Some(secret) if secret == expected && !expected.is_empty() => {}
                _ => return Err(LedgerError::InvalidAccessSecret(role.to_string())),
            }
        }

        let record = IdentityRecord::new(
            caller,
            name.to_string(),
            email.to_string(),
            role,
            identity_proof.to_string(),
            self.clock.now(),
        );
        state.identities.insert(caller, record);
        info!("registered {} as {}", caller, role);
        Ok(())
    }

    /// Look up the identity record bound to a key
    pub fn identity(&self, key: &AccountKey) -> Option<IdentityRecord> {
        let state = self.state.lock().ok()?;
        state.identities.get(key).cloned()
    }

    // ---- Property lifecycle ----

    /// Submit a new property request, paying the registration fee
    ///
    /// The fee must match the configured amount exactly and is credited to
    /// the treasury. A second non-rejected request by the same submitter
    /// for the same property address is refused, so a retry after an
    /// ambiguous submission failure cannot create duplicates.
    pub fn request_registration(
        &self,
        caller: AccountKey,
        submission: PropertySubmission,
        payment: u64,
    ) -> Result<RequestId, LedgerError> {
        let mut state = self.lock()?;
        if !state.identities.contains_key(&caller) {
            return Err(LedgerError::NotRegistered);
        }
        if payment != self.config.registration_fee {
            return Err(LedgerError::InsufficientPayment {
                required: self.config.registration_fee,
                provided: payment,
            });
        }
        let duplicate = state.requests.values().any(|r| {
            r.requester == caller
                && r.property_address == submission.property_address
                && r.status != RequestStatus::Rejected
        });
        if duplicate {
            return Err(LedgerError::DuplicateRequest(
                submission.property_address.clone(),
            ));
        }

        let id = state.next_id;
        state.next_id = id.next();
        let now = self.clock.now();

        let request = PropertyRequest::new(id, caller, submission, now);
        state.requests.insert(id, request);
        state.treasury.deposit(payment);

        self.emit(
            &mut state,
            LedgerEvent::Submitted {
                id,
                requester: caller,
                fee: payment,
                at: now,
            },
        );
        info!("{} submitted {}", caller, id);
        Ok(id)
    }

    /// Government verification: binds the parcel's khasra number to the request
    ///
    /// This is the single point where the submitter's legal identity is
    /// linked to a specific land parcel. Requires a `GovtOfficer` caller
    /// and a `Pending` request; a repeat call fails on the status check.
    pub fn verify_by_govt(
        &self,
        caller: AccountKey,
        id: RequestId,
        khasra_number: &str,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        if Self::role_of(&state, &caller) != Role::GovtOfficer {
            return Err(LedgerError::Unauthorized(
                "verification requires a government officer".to_string(),
            ));
        }
        let now = self.clock.now();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if request.status != RequestStatus::Pending {
            return Err(LedgerError::InvalidState(format!(
                "{} is {}, expected pending",
                id, request.status
            )));
        }

        request.status = RequestStatus::GovtVerified;
        request.khasra_number = Some(khasra_number.to_string());

        self.emit(
            &mut state,
            LedgerEvent::Verified {
                id,
                khasra_number: khasra_number.to_string(),
                at: now,
            },
        );
        info!("{} verified by {}", id, caller);
        Ok(())
    }

    /// Survey completion by a licensed surveyor
    pub fn complete_survey(&self, caller: AccountKey, id: RequestId) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        if Self::role_of(&state, &caller) != Role::Surveyor {
            return Err(LedgerError::Unauthorized(
                "survey completion requires a surveyor".to_string(),
            ));
        }
        let now = self.clock.now();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if request.status != RequestStatus::GovtVerified {
            return Err(LedgerError::InvalidState(format!(
                "{} is {}, expected govt_verified",
                id, request.status
            )));
        }

        request.status = RequestStatus::Surveyed;

        self.emit(&mut state, LedgerEvent::Surveyed { id, at: now });
        info!("{} surveyed by {}", id, caller);
        Ok(())
    }

    /// Registrar approval: the request becomes a transferable asset
    ///
    /// From this point on `requester` means "current owner".
    pub fn approve_and_mint(&self, caller: AccountKey, id: RequestId) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        if Self::role_of(&state, &caller) != Role::Registrar {
            return Err(LedgerError::Unauthorized(
                "minting requires the registrar".to_string(),
            ));
        }
        let now = self.clock.now();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if request.status != RequestStatus::Surveyed {
            return Err(LedgerError::InvalidState(format!(
                "{} is {}, expected surveyed",
                id, request.status
            )));
        }

        request.status = RequestStatus::Minted;

        self.emit(&mut state, LedgerEvent::Minted { id, at: now });
        info!("{} minted by {}", id, caller);
        Ok(())
    }

    /// Terminally reject a request from any non-terminal status
    ///
    /// The registration fee already deposited stays with the treasury.
    pub fn reject_request(&self, caller: AccountKey, id: RequestId) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        if !Self::role_of(&state, &caller).may_reject() {
            return Err(LedgerError::Unauthorized(
                "rejection requires the registrar or a government officer".to_string(),
            ));
        }
        let now = self.clock.now();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if request.status.is_terminal() {
            return Err(LedgerError::InvalidState(format!(
                "{} is already {}",
                id, request.status
            )));
        }

        request.status = RequestStatus::Rejected;

        self.emit(&mut state, LedgerEvent::Rejected { id, at: now });
        info!("{} rejected by {}", id, caller);
        Ok(())
    }

    // ---- Marketplace extension ----

    /// List a minted record for sale at `price`
    pub fn list_for_sale(
        &self,
        caller: AccountKey,
        id: RequestId,
        price: u64,
    ) -> Result<(), LedgerError> {
        self.list(caller, id, SaleStatus::ForSale, price)
    }

    /// List a minted record for lease at `lease_price` per term
    pub fn list_for_lease(
        &self,
        caller: AccountKey,
        id: RequestId,
        lease_price: u64,
    ) -> Result<(), LedgerError> {
        self.list(caller, id, SaleStatus::ForLease, lease_price)
    }

    fn list(
        &self,
        caller: AccountKey,
        id: RequestId,
        sale_status: SaleStatus,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let now = self.clock.now();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if !request.is_minted() {
            return Err(LedgerError::NotMinted(id.to_string()));
        }
        if *request.owner() != caller {
            return Err(LedgerError::NotOwner(id.to_string()));
        }
        if request.has_active_lease(now) {
            return Err(LedgerError::AlreadyLeased(id.to_string()));
        }

        request.sale_status = sale_status;
        match sale_status {
            SaleStatus::ForSale => request.price = amount,
            SaleStatus::ForLease => request.lease_price = amount,
            SaleStatus::None => {}
        }

        self.emit(
            &mut state,
            LedgerEvent::Listed {
                id,
                sale_status,
                amount,
                at: now,
            },
        );
        Ok(())
    }

    /// Buy a record listed for sale
    ///
    /// Ownership reassignment and payment settlement commit together under
    /// the state lock; there is no intermediate state where one happened
    /// without the other. The payment, net of the configured platform cut,
    /// is settled to the previous owner.
    pub fn buy_property(
        &self,
        caller: AccountKey,
        id: RequestId,
        buyer_name: &str,
        payment: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let now = self.clock.now();
        let seller;
        let price;
        {
            let request = state
                .requests
                .get_mut(&id)
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
            if request.sale_status != SaleStatus::ForSale {
                return Err(LedgerError::NotForSale(id.to_string()));
            }
            seller = *request.owner();
            if seller == caller {
                return Err(LedgerError::NotOwner(
                    "owner cannot buy their own listing".to_string(),
                ));
            }
            price = request.price;
            if payment != price {
                return Err(LedgerError::InsufficientPayment {
                    required: price,
                    provided: payment,
                });
            }

            request.requester = caller;
            request.owner_name = buyer_name.to_string();
            request.sale_status = SaleStatus::None;
            request.price = 0;
        }

        let cut = self.config.sale_cut(price);
        state.treasury.deposit(cut);
        state.treasury.settle(seller, price - cut);

        self.emit(
            &mut state,
            LedgerEvent::Sold {
                id,
                from: seller,
                to: caller,
                amount: payment,
                at: now,
            },
        );
        info!("{} sold by {} to {} for {}", id, seller, caller, payment);
        Ok(())
    }

    /// Rent a record listed for lease for one lease term
    ///
    /// Expiry is lazy: a new lease is granted whenever the clock has
    /// passed the previous `lease_end`, with no separate expiry step.
    /// Ownership is unaffected.
    pub fn rent_property(
        &self,
        caller: AccountKey,
        id: RequestId,
        payment: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let now = self.clock.now();
        let end = now + self.config.lease_term_secs;
        let owner;
        let lease_price;
        {
            let request = state
                .requests
                .get_mut(&id)
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
            if request.sale_status != SaleStatus::ForLease {
                return Err(LedgerError::NotForLease(id.to_string()));
            }
            owner = *request.owner();
            if owner == caller {
                return Err(LedgerError::NotOwner(
                    "owner cannot lease their own record".to_string(),
                ));
            }
            lease_price = request.lease_price;
            if payment != lease_price {
                return Err(LedgerError::InsufficientPayment {
                    required: lease_price,
                    provided: payment,
                });
            }
            if request.has_active_lease(now) {
                return Err(LedgerError::AlreadyLeased(id.to_string()));
            }

            request.tenant = Some(caller);
            request.lease_end = Some(end);
        }

        state.treasury.settle(owner, payment);

        self.emit(
            &mut state,
            LedgerEvent::Rented {
                id,
                tenant: caller,
                amount: payment,
                start: now,
                end,
            },
        );
        info!("{} leased to {} until {}", id, caller, end);
        Ok(())
    }

    // ---- Treasury ----

    /// Drain the platform balance to the admin
    ///
    /// Admin only. Returns the drained amount; draining a zero balance is
    /// a valid success returning 0 and emits nothing.
    pub fn withdraw_funds(&self, caller: AccountKey) -> Result<u64, LedgerError> {
        let mut state = self.lock()?;
        if Self::role_of(&state, &caller) != Role::Admin {
            return Err(LedgerError::Unauthorized(
                "withdrawal requires the admin".to_string(),
            ));
        }

        let amount = state.treasury.withdraw_all();
        if amount > 0 {
            let now = self.clock.now();
            self.emit(
                &mut state,
                LedgerEvent::Withdrawn {
                    to: caller,
                    amount,
                    at: now,
                },
            );
            info!("treasury drained: {} to {}", amount, caller);
        }
        Ok(amount)
    }

    /// Current platform treasury balance
    pub fn treasury_balance(&self) -> Result<u64, LedgerError> {
        Ok(self.lock()?.treasury.balance())
    }

    /// Cumulative sale/lease proceeds settled to `key`
    pub fn payout_total(&self, key: &AccountKey) -> Result<u64, LedgerError> {
        Ok(self.lock()?.treasury.payout_total(key))
    }

    // ---- Read projections ----

    /// Get a request by id
    pub fn request(&self, id: RequestId) -> Option<PropertyRequest> {
        let state = self.state.lock().ok()?;
        state.requests.get(&id).cloned()
    }

    /// Get all requests, ordered by id
    pub fn all_requests(&self) -> Result<Vec<PropertyRequest>, LedgerError> {
        Ok(self.lock()?.requests.values().cloned().collect())
    }

    /// All events emitted so far, in commit order
    pub fn events(&self) -> Result<Vec<LedgerEvent>, LedgerError> {
        Ok(self.lock()?.events.clone())
    }
}

impl NameResolver for Ledger {
    fn display_name(&self, key: &AccountKey) -> Option<String> {
        self.identity(key).map(|record| record.name)
    }
}
