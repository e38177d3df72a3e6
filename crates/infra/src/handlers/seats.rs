use std::collections::HashSet;

use chrono::{NaiveDate, Utc};

use cowork_auth::{Permission, Principal, authorize};
use cowork_core::{Outcome, SeatId, from_option_or};
use cowork_seats::{NewSeat, Seat, SeatChanges, SeatErrors, SeatNumber};

use super::{Handle, Handlers, StoreResultExt};
use crate::repository::{Repository, ReservationRepository, SeatRepository};

#[derive(Debug, Clone)]
pub struct CreateSeat {
    pub actor: Principal,
    pub input: NewSeat,
}

#[derive(Debug, Clone)]
pub struct UpdateSeat {
    pub actor: Principal,
    pub id: SeatId,
    pub changes: SeatChanges,
}

/// Refused while the seat has reservations on or after `today`; past
/// reservations go with the seat.
#[derive(Debug, Clone)]
pub struct DeleteSeat {
    pub actor: Principal,
    pub id: SeatId,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
pub struct GetSeat {
    pub id: SeatId,
}

#[derive(Debug, Clone, Copy)]
pub struct ListSeats;

/// Seats in service with no reservation on `date`.
#[derive(Debug, Clone, Copy)]
pub struct ListAvailableSeats {
    pub date: NaiveDate,
}

impl Handlers {
    pub(crate) async fn load_seat(&self, id: SeatId) -> Outcome<Seat> {
        let found = self.repos.seats.get(id).await.or_store_failure("get_seat")?;
        from_option_or(found, SeatErrors::not_found(id))
    }

    async fn ensure_number_free(&self, number: &SeatNumber, owner: Option<SeatId>) -> Outcome<()> {
        let existing = self
            .repos
            .seats
            .find_by_number(number)
            .await
            .or_store_failure("find_seat_by_number")?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(SeatErrors::number_taken(number).into()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Handle<CreateSeat> for Handlers {
    type Output = Seat;

    async fn handle(&self, command: CreateSeat) -> Outcome<Seat> {
        authorize(&command.actor, &Permission::SEATS_MANAGE)?;
        let input = command.input.validate()?;
        self.ensure_number_free(&input.number, None).await?;

        let seat = Seat::create(SeatId::new(), input, Utc::now());
        self.repos
            .seats
            .insert(&seat)
            .await
            .or_conflict("insert_seat", |_| SeatErrors::number_taken(&seat.number))?;

        tracing::info!(seat_id = %seat.id, number = %seat.number, "seat created");
        Ok(seat)
    }
}

#[async_trait::async_trait]
impl Handle<UpdateSeat> for Handlers {
    type Output = Seat;

    async fn handle(&self, command: UpdateSeat) -> Outcome<Seat> {
        authorize(&command.actor, &Permission::SEATS_MANAGE)?;
        let changes = command.changes.validate()?;
        let current = self.load_seat(command.id).await?;
        if let Some(number) = &changes.number {
            self.ensure_number_free(number, Some(current.id)).await?;
        }

        let updated = current.apply_changes(changes, Utc::now());
        let found = self
            .repos
            .seats
            .update(&updated)
            .await
            .or_conflict("update_seat", |_| SeatErrors::number_taken(&updated.number))?;
        if !found {
            return Err(SeatErrors::not_found(command.id).into());
        }

        tracing::info!(seat_id = %updated.id, available = updated.available, "seat updated");
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl Handle<DeleteSeat> for Handlers {
    type Output = ();

    async fn handle(&self, command: DeleteSeat) -> Outcome<()> {
        authorize(&command.actor, &Permission::SEATS_MANAGE)?;
        let seat = self.load_seat(command.id).await?;

        let upcoming = self
            .repos
            .reservations
            .for_seat_from(seat.id, command.today)
            .await
            .or_store_failure("reservations_for_seat_from")?;
        if !upcoming.is_empty() {
            return Err(SeatErrors::has_reservations(&seat.number).into());
        }

        let history = self
            .repos
            .reservations
            .for_seat(seat.id)
            .await
            .or_store_failure("reservations_for_seat")?;
        let ids: Vec<_> = history.iter().map(|r| r.id).collect();
        self.repos
            .reservations
            .delete_many(&ids)
            .await
            .or_store_failure("delete_reservations")?;

        if !self.repos.seats.delete(seat.id).await.or_store_failure("delete_seat")? {
            return Err(SeatErrors::not_found(seat.id).into());
        }

        tracing::info!(seat_id = %seat.id, number = %seat.number, "seat deleted");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Handle<GetSeat> for Handlers {
    type Output = Seat;

    async fn handle(&self, command: GetSeat) -> Outcome<Seat> {
        self.load_seat(command.id).await
    }
}

#[async_trait::async_trait]
impl Handle<ListSeats> for Handlers {
    type Output = Vec<Seat>;

    async fn handle(&self, _command: ListSeats) -> Outcome<Vec<Seat>> {
        self.repos.seats.list().await.or_store_failure("list_seats")
    }
}

#[async_trait::async_trait]
impl Handle<ListAvailableSeats> for Handlers {
    type Output = Vec<Seat>;

    async fn handle(&self, command: ListAvailableSeats) -> Outcome<Vec<Seat>> {
        let booked: HashSet<SeatId> = self
            .repos
            .reservations
            .on_date(command.date)
            .await
            .or_store_failure("reservations_on_date")?
            .into_iter()
            .map(|r| r.seat_id)
            .collect();

        let seats = self.repos.seats.list().await.or_store_failure("list_seats")?;
        Ok(seats
            .into_iter()
            .filter(|s| s.available && !booked.contains(&s.id))
            .collect())
    }
}
