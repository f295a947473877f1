use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use grocer_cart::{Cart, PaymentSelector};
use grocer_core::{NotificationAdapter, PaymentAdapter};
use grocer_order::{CheckoutOrchestrator, CheckoutTimeouts, OrderRepository};
use rust_decimal::Decimal;
use tokio::sync::MutexGuard;

/// Sessions untouched for this long are dropped by the sweeper.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// One shopper's checkout state: cart, payment selection, submission state.
pub struct ShopperSession {
    pub cart: Cart,
    pub selector: PaymentSelector,
    pub orchestrator: CheckoutOrchestrator,
}

/// A shopper session plus the flag that marks a checkout submission in flight.
/// The flag lives outside the lock so short reads never look like a submission.
pub struct Session {
    shopper: tokio::sync::Mutex<ShopperSession>,
    submitting: AtomicBool,
}

impl Session {
    fn new(shopper: ShopperSession) -> Self {
        Self {
            shopper: tokio::sync::Mutex::new(shopper),
            submitting: AtomicBool::new(false),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ShopperSession> {
        self.shopper.lock().await
    }

    /// `None` while another submission holds the flag
    pub fn begin_submission(&self) -> Option<SubmissionGuard<'_>> {
        if self.submitting.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(SubmissionGuard(&self.submitting))
        }
    }
}

/// Clears the in-flight flag on drop, including when the handler errors out.
pub struct SubmissionGuard<'a>(&'a AtomicBool);

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub type SharedSession = Arc<Session>;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

#[derive(Clone, Copy, Debug)]
pub struct CheckoutSettings {
    pub delivery_fee: Decimal,
    pub timeouts: CheckoutTimeouts,
    pub session_idle: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentAdapter>,
    pub notifier: Arc<dyn NotificationAdapter>,
    pub settings: CheckoutSettings,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl AppState {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentAdapter>,
        notifier: Arc<dyn NotificationAdapter>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            orders,
            payments,
            notifier,
            settings,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or open the session for this shopper
    pub fn session(&self, id: &str) -> SharedSession {
        let mut sessions = self.sessions();

        let entry = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Arc::new(Session::new(self.open_session())),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Drop sessions idle past `settings.session_idle` that no request is using.
    /// Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let idle = self.settings.session_idle;
        let mut sessions = self.sessions();
        let before = sessions.len();

        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() < idle || Arc::strong_count(&entry.session) > 1
        });

        before - sessions.len()
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_session(&self) -> ShopperSession {
        let orchestrator = CheckoutOrchestrator::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.payments),
            Arc::clone(&self.notifier),
        )
        .with_timeouts(self.settings.timeouts);

        ShopperSession {
            cart: Cart::with_delivery_fee(self.settings.delivery_fee),
            selector: PaymentSelector::new(),
            orchestrator,
        }
    }
}
