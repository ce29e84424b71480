//! Registration and authorization dates.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{DomainError, Violations};

/// Earliest accepted registration date (2024-01-01 UTC).
pub static REGISTRATION_FLOOR: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
});

/// Interprets a naive timestamp as local time and converts it to UTC.
///
/// Ambiguous local times (DST fold) resolve to the earliest instant; local
/// times that do not exist fall back to reading the value as UTC.
fn local_to_utc(value: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&value)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| value.and_utc())
}

fn is_unset(value: &DateTime<Utc>) -> bool {
    *value == DateTime::<Utc>::MIN_UTC
}

/// Date the account was created, never before [`REGISTRATION_FLOOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserRegistrationDate(DateTime<Utc>);

impl UserRegistrationDate {
    /// Validates a UTC registration date.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the date is the unset sentinel
    /// ([`DateTime::<Utc>::MIN_UTC`]) or earlier than 2024-01-01.
    pub fn create(value: DateTime<Utc>) -> Result<Self, Violations> {
        if is_unset(&value) {
            return Err(DomainError::DateNotSpecified {
                field: "registration_date",
            }
            .into());
        }

        if value < *REGISTRATION_FLOOR {
            return Err(DomainError::RegistrationDateTooEarly {
                floor: REGISTRATION_FLOOR.to_rfc3339(),
            }
            .into());
        }

        Ok(Self(value))
    }

    /// Same as [`UserRegistrationDate::create`] for a local naive timestamp.
    pub fn from_naive_local(value: NaiveDateTime) -> Result<Self, Violations> {
        Self::create(local_to_utc(value))
    }

    #[inline]
    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Date of the last successful sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserAuthorizationDate(DateTime<Utc>);

impl UserAuthorizationDate {
    /// Validates a UTC authorization date.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the date is the unset sentinel.
    pub fn create(value: DateTime<Utc>) -> Result<Self, Violations> {
        if is_unset(&value) {
            return Err(DomainError::DateNotSpecified {
                field: "authorization_date",
            }
            .into());
        }

        Ok(Self(value))
    }

    /// Same as [`UserAuthorizationDate::create`] for a local naive timestamp.
    pub fn from_naive_local(value: NaiveDateTime) -> Result<Self, Violations> {
        Self::create(local_to_utc(value))
    }

    #[inline]
    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }
}
