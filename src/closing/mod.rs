//! Closing forms, wire payloads and the submission service

pub mod payload;
pub mod service;

pub use payload::*;
pub use service::*;

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Waiter closing form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterClosingForm {
    pub waiter: Option<Person>,
    pub shirt_number: String,
    pub machine_id: String,
    pub input: ClosingInput,
}

impl WaiterClosingForm {
    pub fn new(waiter: Person, machine_id: impl Into<String>) -> Self {
        Self {
            waiter: Some(waiter),
            machine_id: machine_id.into(),
            ..Self::default()
        }
    }
}

/// Mobile cashier closing form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashierClosingForm {
    pub cashier: Option<Person>,
    pub machine_id: String,
    pub input: ClosingInput,
}

impl CashierClosingForm {
    pub fn new(cashier: Person, machine_id: impl Into<String>) -> Self {
        Self {
            cashier: Some(cashier),
            machine_id: machine_id.into(),
            ..Self::default()
        }
    }
}

/// One cashier inside a fixed cashier group
///
/// `input.change` is not used here; the group carries a single change float.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCashierEntry {
    pub cashier: Option<Person>,
    pub machine_id: String,
    pub input: ClosingInput,
}

impl FixedCashierEntry {
    pub fn new(cashier: Person, machine_id: impl Into<String>, input: ClosingInput) -> Self {
        Self {
            cashier: Some(cashier),
            machine_id: machine_id.into(),
            input,
        }
    }
}

/// Fixed cashier group closing form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedClosingForm {
    /// Change float received by the whole group
    pub group_change: Adjustment,
    pub entries: Vec<FixedCashierEntry>,
}

impl Default for FixedClosingForm {
    /// A new group form starts with one blank cashier
    fn default() -> Self {
        Self {
            group_change: Adjustment::NONE,
            entries: vec![FixedCashierEntry::default()],
        }
    }
}

impl FixedClosingForm {
    /// Append a blank cashier and return its position
    pub fn add_entry(&mut self) -> usize {
        self.entries.push(FixedCashierEntry::default());
        self.entries.len() - 1
    }

    pub fn remove_entry(&mut self, index: usize) -> Option<FixedCashierEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Calculator inputs in entry order
    pub fn inputs(&self) -> Vec<ClosingInput> {
        self.entries.iter().map(|e| e.input.clone()).collect()
    }

    pub fn cashier_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.cashier.as_ref().map(|c| c.name.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_form_starts_with_one_entry() {
        let mut form = FixedClosingForm::default();
        assert_eq!(form.entries.len(), 1);

        assert_eq!(form.add_entry(), 1);
        assert_eq!(form.entries.len(), 2);
        assert!(form.remove_entry(5).is_none());
        assert!(form.remove_entry(0).is_some());
        assert_eq!(form.entries.len(), 1);
    }

    #[test]
    fn test_fixed_form_cashier_names_skip_unselected() {
        let mut form = FixedClosingForm::default();
        form.entries[0].cashier = Some(Person::new("1", "Ana"));
        form.add_entry();
        assert_eq!(form.cashier_names(), vec!["Ana"]);
    }
}
