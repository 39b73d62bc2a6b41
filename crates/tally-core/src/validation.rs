//! # Validation Module
//!
//! Input validation utilities for the ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (menu, import script, service handler)                │
//! │  └── Hands raw strings or typed values to the ledger                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (pure, before any transaction opens)             │
//! │  ├── Id / quantity parsing                                             │
//! │  ├── Field formats (phone, email, tax id, national id)                 │
//! │  └── Sale line shape (non-empty, positive quantities)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0)                                     │
//! │  └── UNIQUE (name_key, tax_id, national_id)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `ValidationError` from this module means nothing was read or written.
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{parse_id, validate_quantity};
//!
//! assert_eq!(parse_id("client_id", " 42 ").unwrap(), 42);
//! assert!(parse_id("client_id", "abc").is_err());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewCategory, NewClient, NewProduct, NewSupplier, SaleLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier & Quantity Parsing
// =============================================================================

/// Parses a caller-supplied identifier.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Must be made of ASCII digits only (no sign, no decimals)
/// - Must be greater than zero
pub fn parse_id(field: &str, raw: &str) -> ValidationResult<i64> {
    let value = parse_digits(field, raw)?;
    validate_id(field, value)?;
    Ok(value)
}

/// Validates an already-typed identifier.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Parses a caller-supplied quantity and checks it is positive.
pub fn parse_quantity(raw: &str) -> ValidationResult<i64> {
    let qty = parse_digits("quantity", raw)?;
    validate_quantity(qty)?;
    Ok(qty)
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// The upper bound is the product's stock, which is only known inside the
/// sale transaction.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates the requested lines of a sale.
///
/// ## Rules
/// - At least one line
/// - Every product id positive, every quantity positive
///
/// ## Sale Workflow
/// ```text
/// register_sale(client, lines)
///      │
///      ▼
/// validate_sale_lines(lines) ← THIS FUNCTION (no transaction yet)
///      │
///      ├── [] → Error: "lines must contain at least one entry"
///      ├── qty <= 0 → Error: "quantity must be positive"
///      │
///      └── OK → BEGIN IMMEDIATE, per-line recheck against live rows
/// ```
pub fn validate_sale_lines(lines: &[SaleLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    for line in lines {
        validate_id("product_id", line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

fn parse_digits(field: &str, raw: &str) -> ValidationResult<i64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        });
    }

    raw.parse::<i64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "number is too large".to_string(),
        })
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (category, supplier, product).
///
/// ## Rules
/// - Must not be blank
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a person's name: letters (accented included) and spaces.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_person_name;
///
/// assert!(validate_person_name("María Núñez").is_ok());
/// assert!(validate_person_name("R2D2").is_err());
/// ```
pub fn validate_person_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)?;

    if !name.trim().chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: "must contain only letters and spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a phone number: digits only, not empty.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address loosely: it must contain `@` and `.`.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if !email.contains('@') || !email.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must contain '@' and '.'".to_string(),
        });
    }

    Ok(())
}

/// Validates a supplier tax id: exactly 11 digits.
pub fn validate_tax_id(tax_id: &str) -> ValidationResult<()> {
    validate_digit_count("tax_id", tax_id, 11, 11)
}

/// Validates a client national id: 6 to 8 digits.
pub fn validate_national_id(national_id: &str) -> ValidationResult<()> {
    validate_digit_count("national_id", national_id, 6, 8)
}

fn validate_digit_count(field: &str, raw: &str, min: usize, max: usize) -> ValidationResult<()> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let all_digits = raw.chars().all(|c| c.is_ascii_digit());
    if !all_digits || raw.len() < min || raw.len() > max {
        let reason = if min == max {
            format!("must be exactly {min} digits")
        } else {
            format!("must be {min} to {max} digits")
        };
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock level: zero or more units.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a unit price in cents: strictly positive.
pub fn validate_unit_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

pub fn validate_new_category(input: &NewCategory) -> ValidationResult<()> {
    validate_name("name", &input.name)
}

pub fn validate_new_supplier(input: &NewSupplier) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_phone(&input.phone)?;
    validate_email(&input.email)?;
    validate_tax_id(&input.tax_id)
}

pub fn validate_new_client(input: &NewClient) -> ValidationResult<()> {
    validate_person_name(&input.name)?;
    validate_phone(&input.phone)?;
    validate_email(&input.email)?;
    validate_national_id(&input.national_id)
}

pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    validate_id("category_id", input.category_id)?;
    validate_id("supplier_id", input.supplier_id)?;
    validate_stock(input.stock)?;
    validate_unit_price_cents(input.unit_price_cents)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("id", "7").unwrap(), 7);
        assert_eq!(parse_id("id", "  12 ").unwrap(), 12);
        assert!(matches!(
            parse_id("id", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_id("id", "abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_id("id", "-3"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_id("id", "0"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(parse_id("id", "99999999999999999999").is_err());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert!(parse_quantity("0").is_err());
        assert!(parse_quantity("2.5").is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_sale_lines() {
        assert!(matches!(
            validate_sale_lines(&[]),
            Err(ValidationError::Empty { .. })
        ));
        assert!(validate_sale_lines(&[SaleLine::new(1, 2)]).is_ok());
        assert!(validate_sale_lines(&[SaleLine::new(1, 2), SaleLine::new(2, 0)]).is_err());
        assert!(validate_sale_lines(&[SaleLine::new(0, 1)]).is_err());

        // No upper bound on the number of lines.
        let many = vec![SaleLine::new(1, 1); 250];
        assert!(validate_sale_lines(&many).is_ok());
    }

    #[test]
    fn test_names() {
        assert!(validate_name("name", "Periféricos").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(500)).is_ok());

        assert!(validate_person_name("Ana Pérez").is_ok());
        assert!(validate_person_name("Ñandú Gómez").is_ok());
        assert!(validate_person_name("Ana_1").is_err());
    }

    #[test]
    fn test_contact_fields() {
        assert!(validate_phone("1144556677").is_ok());
        assert!(validate_phone("11-4455").is_err());
        assert!(validate_phone("").is_err());

        assert!(validate_email("ana@mail.com").is_ok());
        assert!(validate_email("ana.mail.com").is_err());
        assert!(validate_email("ana@mail").is_err());
    }

    #[test]
    fn test_identity_numbers() {
        assert!(validate_tax_id("20123456789").is_ok());
        assert!(validate_tax_id("2012345678").is_err());
        assert!(validate_tax_id("2012345678X").is_err());

        assert!(validate_national_id("123456").is_ok());
        assert!(validate_national_id("12345678").is_ok());
        assert!(validate_national_id("12345").is_err());
        assert!(validate_national_id("123456789").is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_unit_price_cents(1).is_ok());
        assert!(validate_unit_price_cents(0).is_err());
    }

    #[test]
    fn test_entity_validators() {
        let product = NewProduct {
            name: "Mouse".to_string(),
            category_id: 1,
            supplier_id: 1,
            stock: 0,
            unit_price_cents: 100,
        };
        assert!(validate_new_product(&product).is_ok());
        assert!(validate_new_product(&NewProduct {
            unit_price_cents: 0,
            ..product.clone()
        })
        .is_err());

        let client = NewClient {
            name: "Ana".to_string(),
            phone: "123".to_string(),
            email: "ana@mail.com".to_string(),
            national_id: "1234567".to_string(),
        };
        assert!(validate_new_client(&client).is_ok());
        assert!(validate_new_client(&NewClient {
            email: "nope".to_string(),
            ..client
        })
        .is_err());
    }
}
