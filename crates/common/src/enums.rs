//! Wire enums.
//!
//! The small integer is the canonical wire and storage value for each of
//! these enums; the display string is always computed at the boundary and
//! never stored.

use thiserror::Error;

/// Raised when a wire integer does not map to an enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid {what} value: {value}")]
pub struct InvalidEnumValue {
    pub what: &'static str,
    pub value: i16,
}

/// Order lifecycle status.
///
/// Transitions:
/// ```text
/// Pending ──confirm──► Confirmed ──complete──► Completed
///    │
///    └──cancel──► (terminal, is_cancelled = true)
/// ```
///
/// Cancellation is tracked in a separate flag, orthogonal to the status: a
/// cancelled order keeps whatever status it had but is terminal. Every
/// transition additionally requires the flag to be unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending = 0,
    Confirmed = 1,
    Completed = 2,
}

impl OrderStatus {
    /// Returns true if the order can be confirmed from this status.
    pub fn can_confirm(self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed from this status.
    pub fn can_complete(self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    /// Returns true if the order can be cancelled from this status.
    pub fn can_cancel(self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Canonical wire value.
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Display name for the status alone; a cancelled order is rendered
    /// as "Cancelled" regardless of status (see [`OrderStatus::display`]).
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Completed => "Completed",
        }
    }

    /// Display string taking the cancelled flag into account.
    pub fn display(self, is_cancelled: bool) -> &'static str {
        if is_cancelled { "Cancelled" } else { self.as_str() }
    }
}

impl TryFrom<i16> for OrderStatus {
    type Error = InvalidEnumValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderStatus::Pending),
            1 => Ok(OrderStatus::Confirmed),
            2 => Ok(OrderStatus::Completed),
            _ => Err(InvalidEnumValue {
                what: "order status",
                value,
            }),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is placing the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerType {
    Individual = 0,
    Company = 1,
}

impl CustomerType {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CustomerType::Individual => "Individual",
            CustomerType::Company => "Company",
        }
    }
}

impl TryFrom<i16> for CustomerType {
    type Error = InvalidEnumValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CustomerType::Individual),
            1 => Ok(CustomerType::Company),
            _ => Err(InvalidEnumValue {
                what: "customer type",
                value,
            }),
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    Pickup = 0,
    Delivery = 1,
}

impl DeliveryMethod {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMethod::Pickup => "Pickup",
            DeliveryMethod::Delivery => "Delivery",
        }
    }
}

impl TryFrom<i16> for DeliveryMethod {
    type Error = InvalidEnumValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeliveryMethod::Pickup),
            1 => Ok(DeliveryMethod::Delivery),
            _ => Err(InvalidEnumValue {
                what: "delivery method",
                value,
            }),
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit a product is sold in. Building materials are either weighed or
/// measured by area, so quantities are fractional decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOfMeasure {
    ByWeight = 0,
    ByArea = 1,
}

impl UnitOfMeasure {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Short symbol shown next to quantities.
    pub fn symbol(self) -> &'static str {
        match self {
            UnitOfMeasure::ByWeight => "kg",
            UnitOfMeasure::ByArea => "m²",
        }
    }
}

impl TryFrom<i16> for UnitOfMeasure {
    type Error = InvalidEnumValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UnitOfMeasure::ByWeight),
            1 => Ok(UnitOfMeasure::ByArea),
            _ => Err(InvalidEnumValue {
                what: "unit of measure",
                value,
            }),
        }
    }
}

impl std::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Completed,
        ] {
            assert_eq!(OrderStatus::try_from(status.as_i16()).unwrap(), status);
        }
        for ct in [CustomerType::Individual, CustomerType::Company] {
            assert_eq!(CustomerType::try_from(ct.as_i16()).unwrap(), ct);
        }
        for dm in [DeliveryMethod::Pickup, DeliveryMethod::Delivery] {
            assert_eq!(DeliveryMethod::try_from(dm.as_i16()).unwrap(), dm);
        }
        for unit in [UnitOfMeasure::ByWeight, UnitOfMeasure::ByArea] {
            assert_eq!(UnitOfMeasure::try_from(unit.as_i16()).unwrap(), unit);
        }
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(OrderStatus::try_from(3).is_err());
        assert!(CustomerType::try_from(2).is_err());
        assert!(DeliveryMethod::try_from(-1).is_err());
        assert!(UnitOfMeasure::try_from(7).is_err());
    }

    #[test]
    fn only_pending_can_confirm_or_cancel() {
        assert!(OrderStatus::Pending.can_confirm());
        assert!(!OrderStatus::Confirmed.can_confirm());
        assert!(!OrderStatus::Completed.can_confirm());

        assert!(OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
    }

    #[test]
    fn only_confirmed_can_complete() {
        assert!(!OrderStatus::Pending.can_complete());
        assert!(OrderStatus::Confirmed.can_complete());
        assert!(!OrderStatus::Completed.can_complete());
    }

    #[test]
    fn cancelled_flag_overrides_display() {
        assert_eq!(OrderStatus::Pending.display(false), "Pending");
        assert_eq!(OrderStatus::Pending.display(true), "Cancelled");
        assert_eq!(OrderStatus::Confirmed.display(true), "Cancelled");
    }

    #[test]
    fn unit_symbols() {
        assert_eq!(UnitOfMeasure::ByWeight.symbol(), "kg");
        assert_eq!(UnitOfMeasure::ByArea.symbol(), "m²");
    }
}
