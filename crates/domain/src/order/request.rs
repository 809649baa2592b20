//! Order creation request and its validation sequence.

use common::{CustomerType, DeliveryMethod, ProductId};
use rust_decimal::Decimal;
use store::CustomerInfo;

use crate::error::{DomainError, Result};

/// One requested line: which product and how much of it.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

/// Buyer details as supplied by the client, untrimmed. Which fields are
/// required depends on the customer type.
#[derive(Debug, Clone, Default)]
pub struct CustomerDetails {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company_name: Option<String>,
    pub tax_id: Option<String>,
    pub representative: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

/// Request to place a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub customer_type: CustomerType,
    pub delivery_method: DeliveryMethod,
    pub customer: CustomerDetails,
    pub items: Vec<OrderLineRequest>,
}

/// Trims a field; whitespace-only input counts as absent.
fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    trimmed(value).ok_or_else(|| DomainError::Validation(format!("Field '{field}' is required.")))
}

fn is_valid_tax_id(tax_id: &str) -> bool {
    (tax_id.len() == 9 || tax_id.len() == 13) && tax_id.chars().all(|c| c.is_ascii_digit())
}

impl CreateOrderRequest {
    /// Runs the validation sequence and returns the trimmed customer
    /// snapshot to attach to the order. Fails fast: the first violated
    /// rule is reported alone, naming the offending field.
    ///
    /// Product existence/activity is checked separately by the service,
    /// which has store access.
    pub fn validate(&self) -> Result<CustomerInfo> {
        if self.items.is_empty() {
            return Err(DomainError::Validation(
                "An order must contain at least one item.".to_string(),
            ));
        }
        for line in &self.items {
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::Validation(
                    "Item quantity must be greater than zero.".to_string(),
                ));
            }
        }

        let customer = &self.customer;
        let snapshot = match self.customer_type {
            CustomerType::Individual => CustomerInfo {
                full_name: Some(required(&customer.full_name, "full name")?),
                phone: Some(required(&customer.phone, "phone")?),
                address: trimmed(&customer.address),
                company_name: trimmed(&customer.company_name),
                tax_id: trimmed(&customer.tax_id),
                representative: trimmed(&customer.representative),
                contact_person: trimmed(&customer.contact_person),
                contact_phone: trimmed(&customer.contact_phone),
            },
            CustomerType::Company => {
                let company_name = required(&customer.company_name, "company name")?;
                let tax_id = required(&customer.tax_id, "tax ID")?;
                if !is_valid_tax_id(&tax_id) {
                    return Err(DomainError::Validation(
                        "Tax ID must be 9 or 13 digits.".to_string(),
                    ));
                }
                CustomerInfo {
                    full_name: trimmed(&customer.full_name),
                    phone: trimmed(&customer.phone),
                    address: trimmed(&customer.address),
                    company_name: Some(company_name),
                    tax_id: Some(tax_id),
                    representative: Some(required(
                        &customer.representative,
                        "authorized representative",
                    )?),
                    contact_person: Some(required(&customer.contact_person, "contact person")?),
                    contact_phone: Some(required(&customer.contact_phone, "contact phone")?),
                }
            }
        };

        if self.delivery_method == DeliveryMethod::Delivery && snapshot.address.is_none() {
            return Err(DomainError::Validation(
                "Field 'delivery address' is required for delivery orders.".to_string(),
            ));
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual() -> CustomerDetails {
        CustomerDetails {
            full_name: Some("Maria Petrova".to_string()),
            phone: Some("+359888123456".to_string()),
            ..CustomerDetails::default()
        }
    }

    fn company() -> CustomerDetails {
        CustomerDetails {
            company_name: Some("Granit Build OOD".to_string()),
            tax_id: Some("123456789".to_string()),
            representative: Some("Ivan Stoyanov".to_string()),
            contact_person: Some("Petar Georgiev".to_string()),
            contact_phone: Some("+359887654321".to_string()),
            ..CustomerDetails::default()
        }
    }

    fn line() -> OrderLineRequest {
        OrderLineRequest {
            product_id: ProductId::new(),
            quantity: Decimal::from(2),
        }
    }

    fn request(
        customer_type: CustomerType,
        delivery_method: DeliveryMethod,
        customer: CustomerDetails,
        items: Vec<OrderLineRequest>,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_type,
            delivery_method,
            customer,
            items,
        }
    }

    fn expect_validation_message(result: Result<CustomerInfo>, needle: &str) {
        match result {
            Err(DomainError::Validation(msg)) => {
                assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_individual_pickup_passes() {
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Pickup,
            individual(),
            vec![line()],
        );
        let snapshot = req.validate().unwrap();
        assert_eq!(snapshot.full_name.as_deref(), Some("Maria Petrova"));
    }

    #[test]
    fn empty_items_rejected() {
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Pickup,
            individual(),
            vec![],
        );
        expect_validation_message(req.validate(), "at least one item");
    }

    #[test]
    fn non_positive_quantity_rejected() {
        for quantity in [Decimal::ZERO, Decimal::from(-1)] {
            let req = request(
                CustomerType::Individual,
                DeliveryMethod::Pickup,
                individual(),
                vec![OrderLineRequest {
                    product_id: ProductId::new(),
                    quantity,
                }],
            );
            expect_validation_message(req.validate(), "quantity");
        }
    }

    #[test]
    fn individual_requires_name_and_phone() {
        let mut details = individual();
        details.full_name = Some("   ".to_string());
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Pickup,
            details,
            vec![line()],
        );
        expect_validation_message(req.validate(), "full name");

        let mut details = individual();
        details.phone = None;
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Pickup,
            details,
            vec![line()],
        );
        expect_validation_message(req.validate(), "phone");
    }

    #[test]
    fn company_requires_all_company_fields() {
        for (field, mutate) in [
            ("company name", Box::new(|c: &mut CustomerDetails| c.company_name = None)
                as Box<dyn Fn(&mut CustomerDetails)>),
            ("tax ID", Box::new(|c: &mut CustomerDetails| c.tax_id = None)),
            (
                "authorized representative",
                Box::new(|c: &mut CustomerDetails| c.representative = None),
            ),
            (
                "contact person",
                Box::new(|c: &mut CustomerDetails| c.contact_person = None),
            ),
            (
                "contact phone",
                Box::new(|c: &mut CustomerDetails| c.contact_phone = None),
            ),
        ] {
            let mut details = company();
            mutate(&mut details);
            let req = request(
                CustomerType::Company,
                DeliveryMethod::Pickup,
                details,
                vec![line()],
            );
            expect_validation_message(req.validate(), field);
        }
    }

    #[test]
    fn tax_id_must_be_nine_or_thirteen_digits() {
        for bad in ["12345678", "1234567890", "12345678a", "123456789012345"] {
            let mut details = company();
            details.tax_id = Some(bad.to_string());
            let req = request(
                CustomerType::Company,
                DeliveryMethod::Pickup,
                details,
                vec![line()],
            );
            expect_validation_message(req.validate(), "9 or 13 digits");
        }
        for good in ["123456789", "1234567890123"] {
            let mut details = company();
            details.tax_id = Some(good.to_string());
            let req = request(
                CustomerType::Company,
                DeliveryMethod::Pickup,
                details,
                vec![line()],
            );
            assert!(req.validate().is_ok(), "{good} should be accepted");
        }
    }

    #[test]
    fn delivery_requires_address() {
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Delivery,
            individual(),
            vec![line()],
        );
        expect_validation_message(req.validate(), "delivery address");

        let mut details = individual();
        details.address = Some("12 Vitosha Blvd, Sofia".to_string());
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Delivery,
            details,
            vec![line()],
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn snapshot_fields_are_trimmed() {
        let mut details = individual();
        details.full_name = Some("  Maria Petrova  ".to_string());
        details.address = Some("  12 Vitosha Blvd  ".to_string());
        let req = request(
            CustomerType::Individual,
            DeliveryMethod::Pickup,
            details,
            vec![line()],
        );
        let snapshot = req.validate().unwrap();
        assert_eq!(snapshot.full_name.as_deref(), Some("Maria Petrova"));
        assert_eq!(snapshot.address.as_deref(), Some("12 Vitosha Blvd"));
    }
}
