//! Operator session, login matching and person lookup

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::closing::ClosingContext;
use crate::types::*;
use crate::utils::validation::digits_only;

/// Operator account as served by `GET /api/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub cpf: String,
    pub name: String,
    /// Date of birth, doubling as the login password
    pub dob: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub permissions: String,
}

/// The logged-in operator and the event they are working
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub operator_cpf: String,
    pub operator_name: String,
    pub profile: String,
    pub permissions: String,
    pub active_event: Option<String>,
}

impl Session {
    /// Match a typed CPF and date of birth against the user list.
    ///
    /// Both sides are compared on digits only, so `123.456.789-00` and
    /// `12345678900` are the same CPF and `01/02/1990` matches `01021990`.
    pub fn login(users: &[User], cpf: &str, password: &str) -> EventBarResult<Session> {
        let cpf = digits_only(cpf);
        let password = digits_only(password);
        if cpf.is_empty() || password.is_empty() {
            return Err(EventBarError::Validation(
                "CPF and date of birth are required".to_string(),
            ));
        }

        let user = users
            .iter()
            .find(|u| digits_only(&u.cpf) == cpf && digits_only(&u.dob) == password)
            .ok_or_else(|| {
                debug!(users = users.len(), "login attempt did not match any user");
                EventBarError::Validation("Incorrect CPF or date of birth".to_string())
            })?;

        info!(operator = %user.name, "operator logged in");
        Ok(Session::for_user(user))
    }

    pub fn for_user(user: &User) -> Self {
        Self {
            operator_cpf: user.cpf.clone(),
            operator_name: user.name.clone(),
            profile: user.profile.clone(),
            permissions: user.permissions.clone(),
            active_event: None,
        }
    }

    pub fn select_event(&mut self, event_name: impl Into<String>) {
        let event_name = event_name.into();
        info!(event = %event_name, "active event selected");
        self.active_event = Some(event_name);
    }

    pub fn clear_event(&mut self) {
        self.active_event = None;
    }

    /// Whether the stored permission list grants `permission`
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .any(|p| p.eq_ignore_ascii_case(permission))
    }

    /// Identifying fields for a closing, failing when no event is active
    pub fn closing_context(&self) -> EventBarResult<ClosingContext> {
        let event_name = self
            .active_event
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| EventBarError::SessionIncomplete("no active event".to_string()))?;

        if self.operator_name.trim().is_empty() {
            return Err(EventBarError::SessionIncomplete(
                "no operator logged in".to_string(),
            ));
        }

        Ok(ClosingContext {
            event_name: event_name.to_string(),
            operator_name: self.operator_name.clone(),
        })
    }
}

/// Autocomplete suggestions for a partially typed CPF
///
/// Empty input gives no suggestions; otherwise each person whose CPF digits
/// start with the typed digits is returned in list order.
pub fn suggest_by_cpf<'a>(people: &'a [Person], typed: &str) -> Vec<&'a Person> {
    let prefix = digits_only(typed);
    if prefix.is_empty() {
        return Vec::new();
    }
    people
        .iter()
        .filter(|p| p.cpf_digits().starts_with(&prefix))
        .collect()
}

/// Exact CPF lookup, ignoring punctuation
pub fn find_by_cpf<'a>(people: &'a [Person], cpf: &str) -> Option<&'a Person> {
    let cpf = digits_only(cpf);
    people.iter().find(|p| p.cpf_digits() == cpf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![User {
            cpf: "123.456.789-00".to_string(),
            name: "Fabio".to_string(),
            dob: "01/02/1990".to_string(),
            profile: "admin".to_string(),
            permissions: "financeiro,estoque".to_string(),
        }]
    }

    #[test]
    fn test_login_matches_digits_only() {
        let session = Session::login(&users(), "12345678900", "01021990").unwrap();
        assert_eq!(session.operator_name, "Fabio");
        assert!(session.active_event.is_none());
        assert!(session.has_permission("estoque"));
        assert!(!session.has_permission("admin"));
    }

    #[test]
    fn test_login_rejects_wrong_password() {
        assert!(Session::login(&users(), "123.456.789-00", "02/02/1990").is_err());
        assert!(Session::login(&users(), "", "").is_err());
    }

    #[test]
    fn test_closing_context_needs_event() {
        let mut session = Session::for_user(&users()[0]);
        assert!(matches!(
            session.closing_context(),
            Err(EventBarError::SessionIncomplete(_))
        ));

        session.select_event("Rodeio");
        let context = session.closing_context().unwrap();
        assert_eq!(context.event_name, "Rodeio");
        assert_eq!(context.operator_name, "Fabio");

        session.clear_event();
        assert!(session.closing_context().is_err());
    }

    #[test]
    fn test_suggest_by_cpf_prefix() {
        let people = vec![
            Person::new("111.222.333-44", "Ana"),
            Person::new("11199988877", "Bia"),
            Person::new("22233344455", "Caio"),
        ];
        let names: Vec<&str> = suggest_by_cpf(&people, "111.")
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ana", "Bia"]);
        assert!(suggest_by_cpf(&people, "").is_empty());
        assert!(suggest_by_cpf(&people, "999").is_empty());

        assert_eq!(find_by_cpf(&people, "222.333.444-55").unwrap().name, "Caio");
    }
}
