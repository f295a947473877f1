use grocer_cart::{Cart, PaymentPlan, PaymentSelector, ValidationError};
use grocer_core::{
    CustomerProfile, NotificationAdapter, NotificationError, NotificationReceipt, PaymentAdapter,
    PaymentError, PaymentRequest,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::manager::OrderError;
use crate::models::Order;
use crate::repository::OrderRepository;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTimeouts {
    pub payment: Duration,
    pub notification: Duration,
}

impl Default for CheckoutTimeouts {
    fn default() -> Self {
        Self {
            payment: DEFAULT_TIMEOUT,
            notification: DEFAULT_TIMEOUT,
        }
    }
}

/// Where the checkout screen currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success { order_id: Uuid },
    /// Terminal: the shell is navigating to the payment page.
    Redirecting { checkout_url: String },
}

/// Resolves once the admin notification settles. `None` means it failed.
pub type NotificationHandle = JoinHandle<Option<NotificationReceipt>>;

#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Cash order accepted; show the acknowledgment.
    Placed {
        order: Order,
        notification: NotificationHandle,
    },
    /// Wallet order persisted; the caller must navigate to `checkout_url`.
    Redirect {
        order: Order,
        checkout_url: String,
        notification: NotificationHandle,
    },
}

impl SubmissionOutcome {
    pub fn order(&self) -> &Order {
        match self {
            SubmissionOutcome::Placed { order, .. } | SubmissionOutcome::Redirect { order, .. } => order,
        }
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Redirect { checkout_url, .. } => Some(checkout_url),
            SubmissionOutcome::Placed { .. } => None,
        }
    }

    pub fn into_parts(self) -> (Order, Option<String>, NotificationHandle) {
        match self {
            SubmissionOutcome::Placed { order, notification } => (order, None, notification),
            SubmissionOutcome::Redirect { order, checkout_url, notification } => {
                (order, Some(checkout_url), notification)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("A checkout submission is already in flight")]
    SubmissionInFlight,

    #[error("Failed to persist order: {0}")]
    Persistence(#[source] OrderError),

    #[error("Payment for order {reference} failed: {source}")]
    PaymentGateway {
        order_id: Uuid,
        reference: String,
        #[source]
        source: PaymentError,
    },
}

impl CheckoutError {
    /// Message for the inline error next to the checkout button
    pub fn user_message(&self) -> &'static str {
        match self {
            CheckoutError::Validation(err) => err.user_message(),
            CheckoutError::SubmissionInFlight => "Your order is already being submitted.",
            CheckoutError::Persistence(_) => "We could not place your order. Please try again.",
            CheckoutError::PaymentGateway { .. } => {
                "Wallet payment could not be started. Try again or pay cash on delivery."
            }
        }
    }
}

/// Drives one checkout at a time: persist, notify, and branch on payment method.
pub struct CheckoutOrchestrator {
    orders: Arc<dyn OrderRepository>,
    payments: Arc<dyn PaymentAdapter>,
    notifier: Arc<dyn NotificationAdapter>,
    timeouts: CheckoutTimeouts,
    state: SubmissionState,
}

impl CheckoutOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentAdapter>,
        notifier: Arc<dyn NotificationAdapter>,
    ) -> Self {
        Self {
            orders,
            payments,
            notifier,
            timeouts: CheckoutTimeouts::default(),
            state: SubmissionState::Idle,
        }
    }

    pub fn with_timeouts(mut self, timeouts: CheckoutTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Submit stays disabled while this is true.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Submitting | SubmissionState::Redirecting { .. }
        )
    }

    /// Place an order from the current cart.
    ///
    /// Validation errors leave everything untouched. Once the order is persisted it is
    /// never rolled back: a payment failure surfaces with the order still `pending`.
    pub async fn submit(
        &mut self,
        cart: &mut Cart,
        selector: &PaymentSelector,
        customer: &CustomerProfile,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        if self.is_busy() {
            return Err(CheckoutError::SubmissionInFlight);
        }

        let plan = selector.validate(cart, customer)?;

        self.state = SubmissionState::Submitting;
        let result = self.place(cart, plan, customer).await;

        self.state = match &result {
            Ok(SubmissionOutcome::Placed { order, .. }) => SubmissionState::Success { order_id: order.id },
            Ok(SubmissionOutcome::Redirect { checkout_url, .. }) => SubmissionState::Redirecting {
                checkout_url: checkout_url.clone(),
            },
            Err(_) => SubmissionState::Idle,
        };

        result
    }

    /// The "finish" action after the acknowledgment: empties the cart and re-arms checkout.
    pub fn finish(&mut self, cart: &mut Cart) {
        cart.clear();
        self.state = SubmissionState::Idle;
    }

    async fn place(
        &self,
        cart: &mut Cart,
        plan: PaymentPlan,
        customer: &CustomerProfile,
    ) -> Result<SubmissionOutcome, CheckoutError> {
        let order = Order::place(&cart.snapshot(), &plan, customer);

        self.orders.append(&order).await.map_err(|e| {
            error!(order_id = %order.id, error = %e, "Failed to persist order");
            CheckoutError::Persistence(e)
        })?;

        info!(
            order_id = %order.id,
            reference = %order.reference,
            payment_method = %order.payment_method,
            grand_total = %order.grand_total,
            "Order placed"
        );

        let notification = self.dispatch_notification(&order);

        match plan {
            PaymentPlan::Cash => Ok(SubmissionOutcome::Placed { order, notification }),
            PaymentPlan::Wallet { phone } => {
                let request = PaymentRequest {
                    amount: order.grand_total,
                    order_id: order.id,
                    reference: order.reference.clone(),
                    customer: customer.contact(&phone),
                };

                match self.request_checkout_url(&request).await {
                    Ok(checkout_url) => {
                        cart.clear();
                        info!(order_id = %order.id, "Redirecting to wallet checkout");
                        Ok(SubmissionOutcome::Redirect { order, checkout_url, notification })
                    }
                    Err(source) => {
                        error!(order_id = %order.id, error = %source, "Wallet payment intent failed; order left pending");
                        Err(CheckoutError::PaymentGateway {
                            order_id: order.id,
                            reference: order.reference,
                            source,
                        })
                    }
                }
            }
        }
    }

    async fn request_checkout_url(&self, request: &PaymentRequest) -> Result<String, PaymentError> {
        let limit = self.timeouts.payment;
        let session = timeout(limit, self.payments.create_intent(request))
            .await
            .map_err(|_| PaymentError::Timeout(limit))??;

        session
            .redirect_url()
            .map(str::to_string)
            .ok_or(PaymentError::MissingCheckoutUrl)
    }

    /// Detached: its outcome never feeds back into the submission.
    fn dispatch_notification(&self, order: &Order) -> NotificationHandle {
        let notifier = Arc::clone(&self.notifier);
        let event = order.to_placed_event();
        let limit = self.timeouts.notification;

        tokio::spawn(async move {
            let result = match timeout(limit, notifier.notify(&event)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(limit)),
            };

            match result {
                Ok(receipt) => {
                    info!(order_id = %event.order_id, sent_to = %receipt.sent_to, "Admin notified of new order");
                    Some(receipt)
                }
                Err(e) => {
                    warn!(order_id = %event.order_id, error = %e, "Admin notification failed");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::OrderHistory;
    use crate::models::OrderStatus;
    use async_trait::async_trait;
    use grocer_cart::{CartLine, PaymentMethod};
    use grocer_core::CheckoutSession;
    use grocer_shared::models::events::OrderPlacedEvent;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum GatewayReply {
        Url(&'static str),
        NoUrl,
        Fail,
        Hang,
    }

    struct FakePayments {
        reply: GatewayReply,
        requests: Mutex<Vec<PaymentRequest>>,
    }

    impl FakePayments {
        fn new(reply: GatewayReply) -> Arc<Self> {
            Arc::new(Self { reply, requests: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentAdapter for FakePayments {
        async fn create_intent(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.reply {
                GatewayReply::Url(url) => Ok(CheckoutSession { checkout_url: Some(url.to_string()) }),
                GatewayReply::NoUrl => Ok(CheckoutSession::default()),
                GatewayReply::Fail => Err(PaymentError::Rejected { status: 500, message: "boom".into() }),
                GatewayReply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(CheckoutSession::default())
                }
            }
        }
    }

    struct FakeNotifier {
        fail: bool,
        calls: AtomicUsize,
        last: Mutex<Option<OrderPlacedEvent>>,
    }

    impl FakeNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { fail, calls: AtomicUsize::new(0), last: Mutex::new(None) })
        }
    }

    #[async_trait]
    impl NotificationAdapter for FakeNotifier {
        async fn notify(&self, event: &OrderPlacedEvent) -> Result<NotificationReceipt, NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(event.clone());
            if self.fail {
                Err(NotificationError::Delivery("smtp down".into()))
            } else {
                Ok(NotificationReceipt { sent_to: "admin@grocer.test".into() })
            }
        }
    }

    struct Harness {
        history: Arc<OrderHistory>,
        payments: Arc<FakePayments>,
        notifier: Arc<FakeNotifier>,
        orchestrator: CheckoutOrchestrator,
    }

    fn harness(reply: GatewayReply, notifier_fails: bool) -> Harness {
        let history = Arc::new(OrderHistory::new());
        let payments = FakePayments::new(reply);
        let notifier = FakeNotifier::new(notifier_fails);
        let orchestrator = CheckoutOrchestrator::new(history.clone(), payments.clone(), notifier.clone());
        Harness { history, payments, notifier, orchestrator }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(CartLine::new("lamb", "Lamb", dec!(100)).with_quantity(2).with_unit("kg"))
            .unwrap();
        cart
    }

    fn wallet_selector() -> PaymentSelector {
        let mut selector = PaymentSelector::new();
        selector.select(PaymentMethod::Wallet);
        selector.set_wallet_phone(Some("01012345678".to_string()));
        selector
    }

    fn customer() -> CustomerProfile {
        CustomerProfile::new("Hana").with_email("hana@example.com")
    }

    #[tokio::test]
    async fn test_empty_cart_creates_nothing() {
        let mut h = harness(GatewayReply::Url("https://pay.test/1"), false);
        let mut empty = Cart::new();

        let result = h.orchestrator.submit(&mut empty, &wallet_selector(), &customer()).await;

        assert!(matches!(result, Err(CheckoutError::Validation(ValidationError::EmptyCart))));
        assert_eq!(h.orchestrator.state(), &SubmissionState::Idle);
        assert!(h.history.is_empty().await);
        assert_eq!(h.payments.calls(), 0);
        tokio::task::yield_now().await;
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cash_reaches_success_without_payment_call() {
        let mut h = harness(GatewayReply::Fail, false);
        let mut cart = cart();

        let outcome = h
            .orchestrator
            .submit(&mut cart, &PaymentSelector::new(), &customer())
            .await
            .unwrap();

        let order_id = outcome.order().id;
        assert!(outcome.redirect_url().is_none());
        assert_eq!(h.orchestrator.state(), &SubmissionState::Success { order_id });
        assert_eq!(h.payments.calls(), 0);

        // cart survives until the user finishes
        assert!(!cart.is_empty());

        let stored = h.history.get(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
        assert_eq!(stored.grand_total, dec!(205));
        assert_eq!(stored.points_earned, 2000);

        let (_, _, notification) = outcome.into_parts();
        let receipt = notification.await.unwrap().unwrap();
        assert_eq!(receipt.sent_to, "admin@grocer.test");

        h.orchestrator.finish(&mut cart);
        assert!(cart.is_empty());
        assert_eq!(h.orchestrator.state(), &SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_change_outcome() {
        let mut h = harness(GatewayReply::Fail, true);
        let mut cart = cart();

        let outcome = h
            .orchestrator
            .submit(&mut cart, &PaymentSelector::new(), &customer())
            .await
            .unwrap();

        let (order, _, notification) = outcome.into_parts();
        assert!(notification.await.unwrap().is_none());
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.orchestrator.state(), &SubmissionState::Success { order_id: order.id });
        assert_eq!(h.history.len().await, 1);
    }

    #[tokio::test]
    async fn test_wallet_redirect_survives_notification_failure() {
        let mut h = harness(GatewayReply::Url("https://pay.test/session/4"), true);
        let mut cart = cart();

        let outcome = h
            .orchestrator
            .submit(&mut cart, &wallet_selector(), &customer())
            .await
            .unwrap();

        let (order, redirect_url, notification) = outcome.into_parts();
        assert!(notification.await.unwrap().is_none());
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);

        assert_eq!(redirect_url.as_deref(), Some("https://pay.test/session/4"));
        assert_eq!(
            h.orchestrator.state(),
            &SubmissionState::Redirecting { checkout_url: "https://pay.test/session/4".into() }
        );
        assert!(cart.is_empty());
        assert_eq!(h.payments.calls(), 1);
        assert_eq!(h.history.len().await, 1);
        assert_eq!(h.history.get(order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_notification_carries_order_detail() {
        let mut h = harness(GatewayReply::Fail, false);
        let mut cart = cart();

        let outcome = h
            .orchestrator
            .submit(&mut cart, &PaymentSelector::new(), &customer())
            .await
            .unwrap();
        let (order, _, notification) = outcome.into_parts();
        notification.await.unwrap();

        let event = h.notifier.last.lock().unwrap().clone().unwrap();
        assert_eq!(event.order_id, order.id);
        assert_eq!(event.reference, order.reference);
        assert_eq!(event.lines.len(), 1);
        assert_eq!(event.grand_total, dec!(205));
    }

    #[tokio::test]
    async fn test_wallet_success_clears_cart_and_redirects() {
        let mut h = harness(GatewayReply::Url("https://pay.test/session/9"), false);
        let mut cart = cart();

        let outcome = h
            .orchestrator
            .submit(&mut cart, &wallet_selector(), &customer())
            .await
            .unwrap();

        assert_eq!(outcome.redirect_url(), Some("https://pay.test/session/9"));
        assert!(cart.is_empty());
        assert_eq!(
            h.orchestrator.state(),
            &SubmissionState::Redirecting { checkout_url: "https://pay.test/session/9".into() }
        );
        assert!(h.orchestrator.is_busy());

        let requests = h.payments.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, dec!(205));
        assert_eq!(requests[0].order_id, outcome.order().id);
        assert_eq!(requests[0].customer.phone.expose(), "01012345678");
        assert_eq!(requests[0].customer.name, "Hana");
    }

    #[tokio::test]
    async fn test_redirecting_blocks_resubmission() {
        let mut h = harness(GatewayReply::Url("https://pay.test/session/9"), false);
        let mut first = cart();
        h.orchestrator.submit(&mut first, &wallet_selector(), &customer()).await.unwrap();

        let mut again = cart();
        let result = h.orchestrator.submit(&mut again, &wallet_selector(), &customer()).await;
        assert!(matches!(result, Err(CheckoutError::SubmissionInFlight)));
        assert_eq!(h.history.len().await, 1);
    }

    #[tokio::test]
    async fn test_wallet_failure_keeps_cart_and_pending_order() {
        let mut h = harness(GatewayReply::Fail, false);
        let mut cart = cart();

        let err = h
            .orchestrator
            .submit(&mut cart, &wallet_selector(), &customer())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentGateway { .. }));
        assert_eq!(h.orchestrator.state(), &SubmissionState::Idle);
        assert_eq!(cart.lines().len(), 1);

        let orders = h.history.all().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].payment_method, PaymentMethod::Wallet);
    }

    #[tokio::test]
    async fn test_wallet_missing_url_is_gateway_error() {
        let mut h = harness(GatewayReply::NoUrl, false);
        let mut cart = cart();

        let err = h
            .orchestrator
            .submit(&mut cart, &wallet_selector(), &customer())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::PaymentGateway { source: PaymentError::MissingCheckoutUrl, .. }
        ));
        assert!(!cart.is_empty());
        assert_eq!(h.history.len().await, 1);
    }

    #[tokio::test]
    async fn test_wallet_timeout_is_gateway_error() {
        let h = harness(GatewayReply::Hang, false);
        let mut orchestrator = h.orchestrator.with_timeouts(CheckoutTimeouts {
            payment: Duration::from_millis(20),
            notification: Duration::from_millis(20),
        });
        let mut cart = cart();

        let err = orchestrator
            .submit(&mut cart, &wallet_selector(), &customer())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::PaymentGateway { source: PaymentError::Timeout(_), .. }
        ));
        assert_eq!(orchestrator.state(), &SubmissionState::Idle);
        assert_eq!(h.history.len().await, 1);
    }

    #[tokio::test]
    async fn test_wallet_without_phone_is_rejected_before_persisting() {
        let mut h = harness(GatewayReply::Url("https://pay.test/1"), false);
        let mut cart = cart();
        let mut selector = PaymentSelector::new();
        selector.select(PaymentMethod::Wallet);

        let err = h.orchestrator.submit(&mut cart, &selector, &customer()).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(ValidationError::MissingPhone)));
        assert_eq!(err.user_message(), "Enter the phone number linked to your wallet.");
        assert!(h.history.is_empty().await);
        assert_eq!(h.payments.calls(), 0);
    }

    #[tokio::test]
    async fn test_retry_after_gateway_failure_creates_second_order() {
        let mut h = harness(GatewayReply::Fail, false);
        let mut cart = cart();

        assert!(h.orchestrator.submit(&mut cart, &wallet_selector(), &customer()).await.is_err());
        assert!(h.orchestrator.submit(&mut cart, &PaymentSelector::new(), &customer()).await.is_ok());

        let orders = h.history.all().await;
        assert_eq!(orders.len(), 2);
        assert_ne!(orders[0].id, orders[1].id);
    }
}
