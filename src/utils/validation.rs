//! Validation and normalisation utilities

use crate::closing::{CashierClosingForm, FixedClosingForm, WaiterClosingForm};
use crate::traits::*;
use crate::types::*;

/// Keep only ASCII digits
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Format a CPF progressively as `000.000.000-00`
pub fn format_cpf(raw: &str) -> String {
    let digits = digits_only(raw);
    let digits: String = digits.chars().take(11).collect();
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("{}.{}", &digits[..3], &digits[3..]),
        7..=9 => format!("{}.{}.{}", &digits[..3], &digits[3..6], &digits[6..]),
        _ => format!(
            "{}.{}.{}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..]
        ),
    }
}

/// Format a date of birth progressively as `dd/mm/yyyy`
pub fn format_date_of_birth(raw: &str) -> String {
    let digits: String = digits_only(raw).chars().take(8).collect();
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

/// Machine identifiers are typed in capitals on the form
pub fn normalize_machine_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Validate that a machine identifier is present
pub fn validate_machine_id(machine_id: &str) -> EventBarResult<()> {
    if machine_id.trim().is_empty() {
        return Err(EventBarError::Validation(
            "Machine number cannot be empty".to_string(),
        ));
    }

    if machine_id.len() > 32 {
        return Err(EventBarError::Validation(
            "Machine number cannot exceed 32 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a CPF has exactly eleven digits
pub fn validate_cpf(cpf: &str) -> EventBarResult<()> {
    let digits = digits_only(cpf);
    if digits.len() != 11 {
        return Err(EventBarError::Validation(format!(
            "CPF must have 11 digits, got {}",
            digits.len()
        )));
    }
    Ok(())
}

fn validate_selected<'a>(person: Option<&'a Person>, role: &str) -> EventBarResult<&'a Person> {
    let person = person.ok_or_else(|| EventBarError::Validation(format!("Select a {role}")))?;
    if person.name.trim().is_empty() {
        return Err(EventBarError::Validation(format!("{role} name cannot be empty")));
    }
    Ok(person)
}

/// Form checks the closing screens perform before asking for confirmation
pub struct DefaultClosingValidator;

impl ClosingValidator for DefaultClosingValidator {
    fn validate_waiter(&self, form: &WaiterClosingForm) -> EventBarResult<()> {
        validate_selected(form.waiter.as_ref(), "waiter")?;
        validate_machine_id(&form.machine_id)
    }

    fn validate_cashier(&self, form: &CashierClosingForm) -> EventBarResult<()> {
        validate_selected(form.cashier.as_ref(), "cashier")?;
        validate_machine_id(&form.machine_id)
    }

    fn validate_fixed(&self, form: &FixedClosingForm) -> EventBarResult<()> {
        if form.entries.is_empty() {
            return Err(EventBarError::Validation(
                "A cashier group needs at least one cashier".to_string(),
            ));
        }
        for (index, entry) in form.entries.iter().enumerate() {
            validate_selected(entry.cashier.as_ref(), "cashier")
                .and_then(|_| validate_machine_id(&entry.machine_id))
                .map_err(|e| for_entry(index, e))?;
        }
        Ok(())
    }
}

fn for_entry(index: usize, err: EventBarError) -> EventBarError {
    match err {
        EventBarError::Validation(message) => {
            EventBarError::Validation(format!("Cashier {}: {message}", index + 1))
        }
        other => other,
    }
}

/// Stricter validator that also checks CPF shape and rejects duplicate
/// machines inside a cashier group
pub struct StrictClosingValidator;

impl ClosingValidator for StrictClosingValidator {
    fn validate_waiter(&self, form: &WaiterClosingForm) -> EventBarResult<()> {
        DefaultClosingValidator.validate_waiter(form)?;
        if let Some(waiter) = &form.waiter {
            validate_cpf(&waiter.cpf)?;
        }
        Ok(())
    }

    fn validate_cashier(&self, form: &CashierClosingForm) -> EventBarResult<()> {
        DefaultClosingValidator.validate_cashier(form)?;
        if let Some(cashier) = &form.cashier {
            validate_cpf(&cashier.cpf)?;
        }
        Ok(())
    }

    fn validate_fixed(&self, form: &FixedClosingForm) -> EventBarResult<()> {
        DefaultClosingValidator.validate_fixed(form)?;

        let mut machines = std::collections::HashSet::new();
        for entry in &form.entries {
            if let Some(cashier) = &entry.cashier {
                validate_cpf(&cashier.cpf)?;
            }
            if !machines.insert(normalize_machine_id(&entry.machine_id)) {
                return Err(EventBarError::Validation(format!(
                    "Machine '{}' appears more than once in the group",
                    entry.machine_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closing::FixedCashierEntry;

    fn waiter_form() -> WaiterClosingForm {
        WaiterClosingForm {
            waiter: Some(Person::new("123.456.789-00", "Carlos")),
            shirt_number: "12".to_string(),
            machine_id: "M01".to_string(),
            input: ClosingInput::default(),
        }
    }

    #[test]
    fn test_format_cpf_progressive() {
        assert_eq!(format_cpf("123"), "123");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("1234567"), "123.456.7");
        assert_eq!(format_cpf("12345678900"), "123.456.789-00");
        assert_eq!(format_cpf("123.456.789-0099"), "123.456.789-00");
    }

    #[test]
    fn test_format_date_of_birth() {
        assert_eq!(format_date_of_birth("01"), "01");
        assert_eq!(format_date_of_birth("0102"), "01/02");
        assert_eq!(format_date_of_birth("01021990"), "01/02/1990");
    }

    #[test]
    fn test_waiter_requires_selection_and_machine() {
        assert!(DefaultClosingValidator.validate_waiter(&waiter_form()).is_ok());

        let mut form = waiter_form();
        form.waiter = None;
        assert!(DefaultClosingValidator.validate_waiter(&form).is_err());

        let mut form = waiter_form();
        form.machine_id = "   ".to_string();
        assert!(DefaultClosingValidator.validate_waiter(&form).is_err());
    }

    #[test]
    fn test_fixed_group_reports_failing_entry() {
        let form = FixedClosingForm {
            group_change: Adjustment::NONE,
            entries: vec![
                FixedCashierEntry {
                    cashier: Some(Person::new("11111111111", "Ana")),
                    machine_id: "A1".to_string(),
                    input: ClosingInput::default(),
                },
                FixedCashierEntry {
                    cashier: Some(Person::new("22222222222", "Bia")),
                    machine_id: String::new(),
                    input: ClosingInput::default(),
                },
            ],
        };
        let err = DefaultClosingValidator.validate_fixed(&form).unwrap_err();
        assert!(err.to_string().contains("Cashier 2"));

        let empty = FixedClosingForm {
            group_change: Adjustment::NONE,
            entries: Vec::new(),
        };
        assert!(DefaultClosingValidator.validate_fixed(&empty).is_err());
    }

    #[test]
    fn test_strict_validator_rejects_duplicate_machines() {
        let entry = FixedCashierEntry {
            cashier: Some(Person::new("11111111111", "Ana")),
            machine_id: "a1".to_string(),
            input: ClosingInput::default(),
        };
        let mut second = entry.clone();
        second.machine_id = "A1".to_string();
        let form = FixedClosingForm {
            group_change: Adjustment::NONE,
            entries: vec![entry, second],
        };
        assert!(DefaultClosingValidator.validate_fixed(&form).is_ok());
        assert!(StrictClosingValidator.validate_fixed(&form).is_err());
    }

    #[test]
    fn test_strict_validator_checks_cpf() {
        let mut form = waiter_form();
        form.waiter = Some(Person::new("123", "Carlos"));
        assert!(DefaultClosingValidator.validate_waiter(&form).is_ok());
        assert!(StrictClosingValidator.validate_waiter(&form).is_err());
    }
}
