use chrono::{DateTime, Utc};

use cowork_core::{Combine, Entity, Error, Outcome, SeatId, Validator, ValueObject};

const NUMBER_MAX: usize = 16;
const DESCRIPTION_MAX: usize = 256;

/// Seat label as printed on the desk (e.g. `A-12`). Stored uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatNumber(String);

impl SeatNumber {
    pub fn parse(raw: &str) -> Outcome<Self> {
        let number = raw.trim().to_uppercase();
        if number.is_empty() {
            return Err(Error::validation("Seat.NumberEmpty", "seat number is required").into());
        }

        let mut v = Validator::new();
        v.ensure(number.chars().count() <= NUMBER_MAX, || {
            Error::validation(
                "Seat.NumberLength",
                format!("seat number must be at most {NUMBER_MAX} characters"),
            )
        })
        .ensure(number.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'), || {
            Error::validation(
                "Seat.NumberCharacters",
                "seat number may only contain letters, digits and hyphens",
            )
        });
        v.finish_with(Self(number))
    }
}

impl ValueObject for SeatNumber {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an optional description: blank means none.
fn parse_description(raw: Option<&str>) -> Outcome<Option<String>> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > DESCRIPTION_MAX {
        return Err(Error::validation(
            "Seat.DescriptionLength",
            format!("description must be at most {DESCRIPTION_MAX} characters"),
        )
        .into());
    }
    Ok(Some(text.to_string()))
}

/// Error catalogue for seat operations.
pub struct SeatErrors;

impl SeatErrors {
    pub fn not_found(id: SeatId) -> Error {
        Error::not_found("Seat.NotFound", format!("seat {id} does not exist"))
    }

    pub fn number_taken(number: &SeatNumber) -> Error {
        Error::conflict("Seat.NumberTaken", format!("seat number '{number}' is already in use"))
    }

    pub fn unavailable(number: &SeatNumber) -> Error {
        Error::conflict("Seat.Unavailable", format!("seat '{number}' is out of service"))
    }

    pub fn has_reservations(number: &SeatNumber) -> Error {
        Error::conflict(
            "Seat.HasReservations",
            format!("seat '{number}' still has upcoming reservations"),
        )
    }

    pub fn empty_update() -> Error {
        Error::validation("Seat.EmptyUpdate", "at least one field must be provided")
    }
}

/// A bookable seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: SeatId,
    pub number: SeatNumber,
    pub description: Option<String>,
    /// Out-of-service seats stay listed but cannot be reserved.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Seat {
    type Id = SeatId;

    fn id(&self) -> SeatId {
        self.id
    }

    const KIND: &'static str = "Seat";
}

impl Seat {
    pub fn create(id: SeatId, seat: ValidatedNewSeat, now: DateTime<Utc>) -> Self {
        Self {
            id,
            number: seat.number,
            description: seat.description,
            available: seat.available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Invariant helper: only seats in service can take new reservations.
    pub fn ensure_reservable(&self) -> Outcome<()> {
        if self.available {
            Ok(())
        } else {
            Err(SeatErrors::unavailable(&self.number).into())
        }
    }

    pub fn apply_changes(&self, changes: ValidatedSeatChanges, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            number: changes.number.unwrap_or_else(|| self.number.clone()),
            description: match changes.description {
                Some(d) => d,
                None => self.description.clone(),
            },
            available: changes.available.unwrap_or(self.available),
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

/// Raw seat creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeat {
    pub number: String,
    pub description: Option<String>,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedNewSeat {
    pub number: SeatNumber,
    pub description: Option<String>,
    pub available: bool,
}

impl NewSeat {
    pub fn validate(&self) -> Outcome<ValidatedNewSeat> {
        let (number, description) = (
            SeatNumber::parse(&self.number),
            parse_description(self.description.as_deref()),
        )
            .combine()?;
        Ok(ValidatedNewSeat {
            number,
            description,
            available: self.available,
        })
    }
}

/// Raw partial update. A blank `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatChanges {
    pub number: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSeatChanges {
    pub number: Option<SeatNumber>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub available: Option<bool>,
}

impl SeatChanges {
    pub fn validate(&self) -> Outcome<ValidatedSeatChanges> {
        if self.number.is_none() && self.description.is_none() && self.available.is_none() {
            return Err(SeatErrors::empty_update().into());
        }
        let (number, description) = (
            self.number.as_deref().map(SeatNumber::parse).transpose(),
            self.description
                .as_deref()
                .map(|d| parse_description(Some(d)))
                .transpose(),
        )
            .combine()?;
        Ok(ValidatedSeatChanges {
            number,
            description,
            available: self.available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cowork_core::{ErrorCategory, OutcomeExt};
    use proptest::prelude::*;

    fn seat(available: bool) -> Seat {
        let input = NewSeat {
            number: "a-12".to_string(),
            description: Some("  window  ".to_string()),
            available,
        };
        Seat::create(SeatId::new(), input.validate().unwrap(), Utc::now())
    }

    #[test]
    fn create_normalizes_input() {
        let s = seat(true);
        assert_eq!(s.number.as_str(), "A-12");
        assert_eq!(s.description.as_deref(), Some("window"));
        assert!(s.available);
    }

    #[test]
    fn seat_number_rules() {
        assert_eq!(SeatNumber::parse(" ").first_error().code(), "Seat.NumberEmpty");
        assert_eq!(
            SeatNumber::parse("A 12").first_error().code(),
            "Seat.NumberCharacters"
        );
        let long = SeatNumber::parse(&"B".repeat(17));
        assert_eq!(long.first_error().code(), "Seat.NumberLength");
    }

    #[test]
    fn blank_description_becomes_none() {
        let input = NewSeat {
            number: "C3".to_string(),
            description: Some("   ".to_string()),
            available: true,
        };
        assert_eq!(input.validate().unwrap().description, None);
    }

    #[test]
    fn creation_accumulates_errors() {
        let input = NewSeat {
            number: "!!".to_string(),
            description: Some("x".repeat(300)),
            available: true,
        };
        let codes: Vec<String> = input
            .validate()
            .errors()
            .iter()
            .map(|e| e.code().to_string())
            .collect();
        assert_eq!(codes, vec!["Seat.NumberCharacters", "Seat.DescriptionLength"]);
    }

    #[test]
    fn out_of_service_seats_are_not_reservable() {
        assert!(seat(true).ensure_reservable().is_ok());
        let err = seat(false).ensure_reservable().first_error();
        assert_eq!(err.code(), "Seat.Unavailable");
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn changes_apply_selectively() {
        let original = seat(true);
        let changes = SeatChanges {
            available: Some(false),
            description: Some("".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let updated = original.apply_changes(changes, Utc::now());

        assert_eq!(updated.number, original.number);
        assert_eq!(updated.description, None);
        assert!(!updated.available);
    }

    #[test]
    fn empty_changes_are_rejected() {
        assert_eq!(
            SeatChanges::default().validate().first_error(),
            SeatErrors::empty_update()
        );
    }

    proptest! {
        /// Property: valid labels always round-trip uppercased.
        #[test]
        fn valid_numbers_are_uppercased(raw in "[a-zA-Z0-9][a-zA-Z0-9-]{0,15}") {
            let number = SeatNumber::parse(&raw).unwrap();
            prop_assert_eq!(number.as_str(), raw.to_uppercase());
        }
    }
}
