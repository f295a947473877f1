use serde::Serialize;

use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusStage {
    pub status: OrderStatus,
    pub rank: u8,
    pub label: &'static str,
    pub color: &'static str,
    pub reached: bool,
}

/// Progress timeline rendered on the order tracking screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub current: OrderStatus,
    pub stages: Vec<StatusStage>,
}

impl Timeline {
    pub fn current_stage(&self) -> &StatusStage {
        // stages always holds every status
        &self.stages[usize::from(self.current.rank())]
    }

    /// 0.0 for pending through 1.0 for delivered
    pub fn progress(&self) -> f64 {
        f64::from(self.current.rank()) / f64::from(OrderStatus::Delivered.rank())
    }

    pub fn is_complete(&self) -> bool {
        self.current == OrderStatus::Delivered
    }
}

pub fn label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Order received",
        OrderStatus::Preparing => "Preparing your order",
        OrderStatus::Shipping => "Out for delivery",
        OrderStatus::Delivered => "Delivered",
    }
}

pub fn color(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "#f59e0b",
        OrderStatus::Preparing => "#3b82f6",
        OrderStatus::Shipping => "#8b5cf6",
        OrderStatus::Delivered => "#22c55e",
    }
}

pub fn timeline(current: OrderStatus) -> Timeline {
    let stages = OrderStatus::ALL
        .iter()
        .map(|&status| StatusStage {
            status,
            rank: status.rank(),
            label: label(status),
            color: color(status),
            reached: status.rank() <= current.rank(),
        })
        .collect();

    Timeline { current, stages }
}

/// Timeline for a status as stored externally, which may be missing or unknown.
pub fn timeline_from_raw(raw: Option<&str>) -> Timeline {
    timeline(OrderStatus::parse_lenient(raw))
}

pub fn timeline_for(order: &Order) -> Timeline {
    timeline(order.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reached(timeline: &Timeline) -> Vec<bool> {
        timeline.stages.iter().map(|s| s.reached).collect()
    }

    #[test]
    fn test_shipping_reaches_first_three() {
        let t = timeline(OrderStatus::Shipping);
        assert_eq!(reached(&t), vec![true, true, true, false]);
        assert_eq!(t.current_stage().label, "Out for delivery");
        assert!(!t.is_complete());
    }

    #[test]
    fn test_stage_order_is_rank_order() {
        let t = timeline(OrderStatus::Pending);
        let ranks: Vec<u8> = t.stages.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert_eq!(reached(&t), vec![true, false, false, false]);
        assert_eq!(t.progress(), 0.0);
    }

    #[test]
    fn test_delivered_is_complete() {
        let t = timeline(OrderStatus::Delivered);
        assert!(t.stages.iter().all(|s| s.reached));
        assert!(t.is_complete());
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn test_unknown_or_missing_defaults_to_pending() {
        assert_eq!(timeline_from_raw(None).current, OrderStatus::Pending);
        assert_eq!(timeline_from_raw(Some("cancelled")).current, OrderStatus::Pending);
        assert_eq!(timeline_from_raw(Some("preparing")).current, OrderStatus::Preparing);
    }

    #[test]
    fn test_reached_matches_rank_for_every_status() {
        for current in OrderStatus::ALL {
            let t = timeline(current);
            for stage in &t.stages {
                assert_eq!(stage.reached, stage.rank <= current.rank());
            }
        }
    }
}
