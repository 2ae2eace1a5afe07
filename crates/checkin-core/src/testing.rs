//! In-memory `CloudApi` doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cloud_client::{
    CapacityInfo, ClientFactory, CloudApi, CloudError, FamilyInfo, FamilySignResult, TokenStore,
    UserSignResult, UserSizeInfo,
};

pub const ONE_GIB: u64 = 1 << 30;
pub const ONE_MIB: u64 = 1 << 20;

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Timeout,
    Reset,
    Api,
}

impl Fault {
    fn error(self) -> CloudError {
        match self {
            Fault::Timeout => CloudError::Timeout("operation timed out".into()),
            Fault::Reset => CloudError::ConnectionReset("connection reset by peer".into()),
            Fault::Api => CloudError::Api {
                status: 500,
                body: "internal error".into(),
            },
        }
    }
}

pub fn group(id: &str, name: &str) -> FamilyInfo {
    FamilyInfo {
        family_id: id.into(),
        remark_name: Some(name.into()),
    }
}

pub fn fresh(bonus: u64) -> Result<FamilySignResult, Fault> {
    Ok(FamilySignResult {
        sign_status: Some(false),
        bonus_space: bonus,
    })
}

/// How one account's fake remote behaves.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub sign_fault: Option<Fault>,
    pub already_signed: bool,
    pub groups: Vec<FamilyInfo>,
    pub family_list_fault: Option<Fault>,
    /// Result of the n-th family sign-in; calls past the end reuse the last entry.
    pub family_results: Vec<Result<FamilySignResult, Fault>>,
    pub capacity_fault: Option<Fault>,
    /// Fault for every capacity query after the first one.
    pub later_capacity_fault: Option<Fault>,
    /// Personal capacity gained once check-in has happened, in bytes.
    pub personal_growth: u64,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            sign_fault: None,
            already_signed: false,
            groups: vec![group("f1", "home")],
            family_list_fault: None,
            family_results: vec![fresh(20)],
            capacity_fault: None,
            later_capacity_fault: None,
            personal_growth: 10 * ONE_MIB,
        }
    }
}

#[derive(Debug, Default)]
pub struct Calls {
    pub sign_in: AtomicUsize,
    pub family_list: AtomicUsize,
    pub family_sign_in: AtomicUsize,
    pub capacity: AtomicUsize,
    pub family_ids: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        Self::get(&self.sign_in)
            + Self::get(&self.family_list)
            + Self::get(&self.family_sign_in)
            + Self::get(&self.capacity)
    }
}

pub struct MockCloud {
    name: String,
    behavior: Behavior,
    calls: Arc<Calls>,
    trace: Arc<Mutex<Vec<String>>>,
}

impl MockCloud {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            name: "mock".into(),
            behavior,
            calls: Arc::default(),
            trace: Arc::default(),
        }
    }

    pub fn calls(&self) -> &Calls {
        &self.calls
    }

    fn record(&self, op: &str) {
        self.trace
            .lock()
            .unwrap()
            .push(format!("{}:{op}", self.name));
    }
}

#[async_trait]
impl CloudApi for MockCloud {
    async fn sign_in(&self) -> cloud_client::Result<UserSignResult> {
        self.calls.sign_in.fetch_add(1, Ordering::SeqCst);
        self.record("sign_in");
        if let Some(fault) = self.behavior.sign_fault {
            return Err(fault.error());
        }
        Ok(UserSignResult {
            is_sign: self.behavior.already_signed,
            netdisk_bonus: if self.behavior.already_signed { 0 } else { 15 },
        })
    }

    async fn family_list(&self) -> cloud_client::Result<Vec<FamilyInfo>> {
        self.calls.family_list.fetch_add(1, Ordering::SeqCst);
        self.record("family_list");
        if let Some(fault) = self.behavior.family_list_fault {
            return Err(fault.error());
        }
        Ok(self.behavior.groups.clone())
    }

    async fn family_sign_in(&self, family_id: &str) -> cloud_client::Result<FamilySignResult> {
        let n = self.calls.family_sign_in.fetch_add(1, Ordering::SeqCst);
        self.record("family_sign_in");
        self.calls
            .family_ids
            .lock()
            .unwrap()
            .push(family_id.to_owned());

        let now = self.calls.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.calls.in_flight.fetch_sub(1, Ordering::SeqCst);

        let results = &self.behavior.family_results;
        match results.get(n).or(results.last()) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(fault)) => Err(fault.error()),
            None => Ok(FamilySignResult {
                sign_status: Some(true),
                bonus_space: 0,
            }),
        }
    }

    async fn capacity_info(&self) -> cloud_client::Result<UserSizeInfo> {
        let n = self.calls.capacity.fetch_add(1, Ordering::SeqCst);
        self.record("capacity");
        if let Some(fault) = self.behavior.capacity_fault {
            return Err(fault.error());
        }
        if n > 0 {
            if let Some(fault) = self.behavior.later_capacity_fault {
                return Err(fault.error());
            }
        }
        let growth = if n == 0 { 0 } else { self.behavior.personal_growth };
        Ok(UserSizeInfo {
            cloud_capacity_info: CapacityInfo {
                total_size: ONE_GIB + growth,
                used_size: 0,
            },
            family_capacity_info: CapacityInfo {
                total_size: 2 * ONE_GIB,
                used_size: 0,
            },
        })
    }
}

/// Hands out [`MockCloud`]s per identifier and records every remote call in
/// one shared trace, in order, as `identifier:operation`.
#[derive(Default)]
pub struct MockFactory {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<HashMap<String, Arc<Calls>>>,
    pub trace: Arc<Mutex<Vec<String>>>,
    pub token_stores: Mutex<Vec<Option<TokenStore>>>,
}

impl MockFactory {
    pub fn with(mut self, identifier: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(identifier.into(), behavior);
        self
    }

    pub fn calls(&self, identifier: &str) -> Arc<Calls> {
        self.calls
            .lock()
            .unwrap()
            .entry(identifier.into())
            .or_default()
            .clone()
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }
}

impl ClientFactory for MockFactory {
    type Client = MockCloud;

    fn connect(
        &self,
        identifier: &str,
        _secret: &str,
        tokens: Option<TokenStore>,
    ) -> cloud_client::Result<MockCloud> {
        self.token_stores.lock().unwrap().push(tokens);
        Ok(MockCloud {
            name: identifier.into(),
            behavior: self.behaviors.get(identifier).cloned().unwrap_or_default(),
            calls: self.calls(identifier),
            trace: self.trace.clone(),
        })
    }
}
