//! Inline edit state for a single row.

use std::str::FromStr;

use crate::types::{City, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Email,
    City,
    Role,
}

impl FromStr for EditField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(EditField::Name),
            "email" => Ok(EditField::Email),
            "city" => Ok(EditField::City),
            "role" => Ok(EditField::Role),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// The row being edited plus a scratch copy of its editable fields.
/// Nothing is sent until the session is turned into a `User` and saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    target: User,
    name: String,
    email: String,
    city: String,
    role: String,
}

impl EditSession {
    pub fn begin(user: &User) -> Self {
        Self {
            target: user.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            city: user.city.name().to_string(),
            role: user.role.clone(),
        }
    }

    pub fn id(&self) -> UserId {
        self.target.id
    }

    pub fn value(&self, field: EditField) -> &str {
        match field {
            EditField::Name => &self.name,
            EditField::Email => &self.email,
            EditField::City => &self.city,
            EditField::Role => &self.role,
        }
    }

    pub fn set(&mut self, field: EditField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EditField::Name => self.name = value,
            EditField::Email => self.email = value,
            EditField::City => self.city = value,
            EditField::Role => self.role = value,
        }
    }

    /// The target with the scratch fields applied. A structured city keeps
    /// its address when only the name changes.
    pub fn to_user(&self) -> User {
        let city = match &self.target.city {
            City::Located { name, .. } if *name == self.city => self.target.city.clone(),
            City::Located { address, .. } => City::Located {
                name: self.city.clone(),
                address: address.clone(),
            },
            City::Name(_) => City::Name(self.city.clone()),
        };
        User {
            name: self.name.clone(),
            email: self.email.clone(),
            city,
            role: self.role.clone(),
            ..self.target.clone()
        }
    }
}
