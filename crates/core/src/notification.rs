//! Notifications for favorites whose threshold was crossed.

use crate::Favorite;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Alert payload for one triggered favorite.
///
/// Serialized as-is for both the webhook body and the bus message, so the
/// field names are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub email: String,
    pub currency_origin: CompactString,
    pub currency_destination: CompactString,
    pub current_rate: f64,
    pub threshold: f64,
}

impl Notification {
    /// Build a notification if `rate` crosses the favorite's threshold.
    /// Returns `None` when `rate < threshold`.
    pub fn for_triggered(favorite: &Favorite, rate: f64) -> Option<Self> {
        if !favorite.is_triggered_by(rate) {
            return None;
        }
        Some(Self {
            email: favorite.email.clone(),
            currency_origin: favorite.currency_origin.clone(),
            currency_destination: favorite.currency_destination.clone(),
            current_rate: rate,
            threshold: favorite.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_for_triggered_above_threshold() {
        let fav = Favorite::new(1, "a@x.com", "EUR", "COP", 4500.0);
        let notification = Notification::for_triggered(&fav, 4600.0).unwrap();
        assert_eq!(notification.email, "a@x.com");
        assert_eq!(notification.current_rate, 4600.0);
        assert_eq!(notification.threshold, 4500.0);
    }

    #[test]
    fn test_for_triggered_below_threshold() {
        let fav = Favorite::new(1, "a@x.com", "EUR", "COP", 4500.0);
        assert!(Notification::for_triggered(&fav, 4400.0).is_none());
    }

    #[test]
    fn test_wire_shape() {
        let fav = Favorite::new(1, "a@x.com", "EUR", "COP", 4500.0);
        let notification = Notification::for_triggered(&fav, 4600.0).unwrap();
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": "a@x.com",
                "currency_origin": "EUR",
                "currency_destination": "COP",
                "current_rate": 4600.0,
                "threshold": 4500.0
            })
        );
    }
}
