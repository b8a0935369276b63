//! Order-created notifications.
//!
//! The core only formats the message and defines the dispatch seam; actual
//! transports (email, messenger webhooks) live outside this crate. Dispatch
//! failures must never fail a checkout, so implementations log and swallow
//! their own errors.

use std::fmt::Write;

use crate::domain::{Order, PricedLine};

pub trait OrderNotifier: Send + Sync {
    fn notify_order_created(&self, order: &Order, lines: &[PricedLine]);
}

/// Plain-text order summary sent to the shop operator.
pub fn format_order_message(order: &Order, lines: &[PricedLine], currency: &str) -> String {
    let mut msg = format!("New order #{}\n\n", order.id);
    msg.push_str("Customer:\n");
    let _ = writeln!(msg, "- Name: {}", order.customer.name);
    let _ = writeln!(msg, "- Phone: {}", order.customer.phone);
    let _ = writeln!(msg, "- City: {}", order.customer.city);
    let _ = writeln!(msg, "- Address: {}", order.customer.address);

    msg.push_str("\nItems:\n");
    for line in lines {
        let _ = writeln!(
            msg,
            "- {} x{} = {} {currency}",
            line.product.title, line.qty, line.line_total
        );
    }
    let _ = write!(msg, "\nTotal: {} {currency}", order.total);

    if !order.customer.comment.is_empty() {
        let _ = write!(msg, "\nComment: {}", order.customer.comment);
    }
    msg
}

/// Notifier that only logs; the default when no transport is wired up.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn notify_order_created(&self, order: &Order, lines: &[PricedLine]) {
        tracing::info!(
            order_id = order.id,
            total = %order.total,
            items = lines.len(),
            "order created"
        );
    }
}
