use crate::domain::analysis::Signal;

/// Transient alert raised by the watchlist monitor. Urgent events demand
/// attention (audible, must be dismissed); the rest are ambient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: String,
    pub body: String,
    pub urgent: bool,
}

impl NotificationEvent {
    pub fn signal_changed(
        symbol: &str,
        company_name: &str,
        from: Signal,
        to: Signal,
        price: &str,
        urgent: bool,
    ) -> Self {
        Self {
            title: format!("Signal change: {symbol}"),
            body: format!("{company_name} moved from {from} to {to}. Price: {price}"),
            urgent,
        }
    }

    pub fn strong_signal(symbol: &str, company_name: &str, signal: Signal, price: &str) -> Self {
        Self {
            title: format!("Strong opportunity: {symbol}"),
            body: format!(
                "Detected STRONG {signal} signal for {company_name}. Current price: {price}"
            ),
            urgent: true,
        }
    }
}
