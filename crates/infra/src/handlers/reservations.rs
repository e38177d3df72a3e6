use chrono::{NaiveDate, Utc};

use cowork_auth::{Permission, Principal, authorize};
use cowork_core::{Combine, Error, Outcome, ReservationId, SeatId, UserId, from_option_or};
use cowork_reservations::{
    NewReservation, Reservation, ReservationChanges, ReservationErrors, check_availability,
};
use cowork_seats::Seat;

use super::{Handle, Handlers, StoreResultExt};
use crate::repository::{Repository, ReservationRepository};

/// Book a seat for the actor.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub actor: Principal,
    pub input: NewReservation,
    pub today: NaiveDate,
}

/// Move a reservation to another seat and/or day.
#[derive(Debug, Clone)]
pub struct UpdateReservation {
    pub actor: Principal,
    pub id: ReservationId,
    pub changes: ReservationChanges,
    pub today: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CancelReservation {
    pub actor: Principal,
    pub id: ReservationId,
    pub today: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct GetReservation {
    pub actor: Principal,
    pub id: ReservationId,
}

/// The actor's own reservations, or all of them for holders of
/// `reservations.read_all`.
#[derive(Debug, Clone)]
pub struct ListReservations {
    pub actor: Principal,
}

fn ensure_owner(actor: &Principal, reservation: &Reservation, permission: &Permission) -> Outcome<()> {
    if reservation.is_owned_by(actor.user_id) || authorize(actor, permission).is_ok() {
        Ok(())
    } else {
        Err(ReservationErrors::not_owner().into())
    }
}

/// A unique-key rejection on write: the user+date key means a double booking
/// by the same user, anything else a taken seat.
fn booking_conflict(constraint: &str, date: NaiveDate) -> Error {
    if constraint.contains("user_date") {
        ReservationErrors::user_already_booked(date)
    } else {
        ReservationErrors::seat_taken(date)
    }
}

impl Handlers {
    async fn load_reservation(&self, id: ReservationId) -> Outcome<Reservation> {
        let found = self
            .repos
            .reservations
            .get(id)
            .await
            .or_store_failure("get_reservation")?;
        from_option_or(found, ReservationErrors::not_found(id))
    }

    async fn reservable_seat(&self, id: SeatId) -> Outcome<Seat> {
        let seat = self.load_seat(id).await?;
        seat.ensure_reservable()?;
        Ok(seat)
    }

    /// Date window, seat state and both double-booking rules, all reported together
    /// where they can be.
    async fn check_slot(
        &self,
        owner: UserId,
        seat_id: SeatId,
        date: NaiveDate,
        today: NaiveDate,
        moving: Option<ReservationId>,
    ) -> Outcome<(Seat, NaiveDate)> {
        // Tokens outlive accounts; the owner must still exist.
        self.load_user(owner).await?;

        let (seat, date) = (
            self.reservable_seat(seat_id).await,
            self.policy.validate_date(date, today),
        )
            .combine()?;

        let seat_bookings = self
            .repos
            .reservations
            .for_seat_on(seat.id, date)
            .await
            .or_store_failure("reservations_for_seat_on")?;
        let user_bookings = self
            .repos
            .reservations
            .for_user_on(owner, date)
            .await
            .or_store_failure("reservations_for_user_on")?;
        check_availability(date, &seat_bookings, &user_bookings, moving)?;

        Ok((seat, date))
    }
}

#[async_trait::async_trait]
impl Handle<CreateReservation> for Handlers {
    type Output = Reservation;

    async fn handle(&self, command: CreateReservation) -> Outcome<Reservation> {
        let CreateReservation { actor, input, today } = command;
        let (seat, date) = self
            .check_slot(actor.user_id, input.seat_id, input.date, today, None)
            .await?;

        let reservation =
            Reservation::book(ReservationId::new(), actor.user_id, seat.id, date, Utc::now());
        self.repos
            .reservations
            .insert(&reservation)
            .await
            .or_conflict("insert_reservation", |key| booking_conflict(key, date))?;

        tracing::info!(
            reservation_id = %reservation.id,
            user_id = %reservation.user_id,
            seat = %seat.number,
            %date,
            "reservation created"
        );
        Ok(reservation)
    }
}

#[async_trait::async_trait]
impl Handle<UpdateReservation> for Handlers {
    type Output = Reservation;

    async fn handle(&self, command: UpdateReservation) -> Outcome<Reservation> {
        let UpdateReservation {
            actor,
            id,
            changes,
            today,
        } = command;

        let current = self.load_reservation(id).await?;
        ensure_owner(&actor, &current, &Permission::RESERVATIONS_MANAGE_ALL)?;
        current.ensure_cancellable(today)?;

        let (seat_id, date) = changes.resolve(&current)?;
        let (seat, date) = self
            .check_slot(current.user_id, seat_id, date, today, Some(current.id))
            .await?;

        let updated = current.reschedule(seat.id, date, Utc::now());
        let found = self
            .repos
            .reservations
            .update(&updated)
            .await
            .or_conflict("update_reservation", |key| booking_conflict(key, date))?;
        if !found {
            return Err(ReservationErrors::not_found(id).into());
        }

        tracing::info!(reservation_id = %id, seat = %seat.number, %date, "reservation moved");
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl Handle<CancelReservation> for Handlers {
    type Output = ();

    async fn handle(&self, command: CancelReservation) -> Outcome<()> {
        let reservation = self.load_reservation(command.id).await?;
        ensure_owner(&command.actor, &reservation, &Permission::RESERVATIONS_MANAGE_ALL)?;
        reservation.ensure_cancellable(command.today)?;

        if !self
            .repos
            .reservations
            .delete(reservation.id)
            .await
            .or_store_failure("delete_reservation")?
        {
            return Err(ReservationErrors::not_found(reservation.id).into());
        }

        tracing::info!(
            reservation_id = %reservation.id,
            actor = %command.actor.user_id,
            "reservation cancelled"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl Handle<GetReservation> for Handlers {
    type Output = Reservation;

    async fn handle(&self, command: GetReservation) -> Outcome<Reservation> {
        let reservation = self.load_reservation(command.id).await?;
        ensure_owner(&command.actor, &reservation, &Permission::RESERVATIONS_READ_ALL)?;
        Ok(reservation)
    }
}

#[async_trait::async_trait]
impl Handle<ListReservations> for Handlers {
    type Output = Vec<Reservation>;

    async fn handle(&self, command: ListReservations) -> Outcome<Vec<Reservation>> {
        let reservations = &self.repos.reservations;
        if authorize(&command.actor, &Permission::RESERVATIONS_READ_ALL).is_ok() {
            reservations.list().await.or_store_failure("list_reservations")
        } else {
            reservations
                .for_user(command.actor.user_id)
                .await
                .or_store_failure("reservations_for_user")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{day, handlers, principal, register, seat, today};
    use crate::handlers::{DeleteUser, UpdateSeat};
    use cowork_core::{ErrorCategory, OutcomeExt};
    use cowork_seats::SeatChanges;

    struct World {
        h: Handlers,
        admin: Principal,
        member: Principal,
        a1: SeatId,
        a2: SeatId,
    }

    async fn world() -> World {
        let h = handlers();
        let admin = principal(&register(&h, "Ada Lovelace", "ada@example.com").await);
        let member = principal(&register(&h, "Grace Hopper", "grace@example.com").await);
        let a1 = seat(&h, &admin, "A1").await;
        let a2 = seat(&h, &admin, "A2").await;
        World { h, admin, member, a1, a2 }
    }

    async fn book(w: &World, actor: &Principal, seat_id: SeatId, date: NaiveDate) -> Outcome<Reservation> {
        w.h.handle(CreateReservation {
            actor: actor.clone(),
            input: NewReservation { seat_id, date },
            today: today(),
        })
        .await
    }

    fn codes<T: core::fmt::Debug>(outcome: &Outcome<T>) -> Vec<&str> {
        outcome.errors().iter().map(|e| e.code()).collect()
    }

    #[tokio::test]
    async fn booking_a_free_seat() {
        let w = world().await;
        let r = book(&w, &w.member, w.a1, day(1)).await.unwrap();
        assert_eq!(r.user_id, w.member.user_id);
        assert_eq!(r.seat_id, w.a1);
        assert_eq!(r.date, day(1));
    }

    #[tokio::test]
    async fn a_seat_is_booked_once_per_day() {
        let w = world().await;
        book(&w, &w.admin, w.a1, day(1)).await.unwrap();

        let clash = book(&w, &w.member, w.a1, day(1)).await;
        assert_eq!(codes(&clash), vec!["Reservation.SeatTaken"]);
        assert_eq!(clash.first_error().category(), ErrorCategory::Conflict);

        assert!(book(&w, &w.member, w.a1, day(2)).await.is_ok());
    }

    #[tokio::test]
    async fn a_user_books_one_seat_per_day() {
        let w = world().await;
        book(&w, &w.member, w.a1, day(1)).await.unwrap();
        let second = book(&w, &w.member, w.a2, day(1)).await;
        assert_eq!(codes(&second), vec!["Reservation.UserAlreadyBooked"]);
    }

    #[tokio::test]
    async fn bad_date_and_missing_seat_are_reported_together() {
        let w = world().await;
        let outcome = book(&w, &w.member, SeatId::new(), today() - chrono::Days::new(1)).await;
        assert_eq!(codes(&outcome), vec!["Seat.NotFound", "Reservation.DateInPast"]);

        let far = book(&w, &w.member, w.a1, day(31)).await;
        assert_eq!(codes(&far), vec!["Reservation.DateTooFar"]);
    }

    #[tokio::test]
    async fn out_of_service_seats_cannot_be_booked() {
        let w = world().await;
        w.h.handle(UpdateSeat {
            actor: w.admin.clone(),
            id: w.a2,
            changes: SeatChanges {
                available: Some(false),
                ..Default::default()
            },
        })
        .await
        .unwrap();
        let outcome = book(&w, &w.member, w.a2, day(1)).await;
        assert_eq!(codes(&outcome), vec!["Seat.Unavailable"]);
    }

    #[tokio::test]
    async fn moving_a_reservation_ignores_itself() {
        let w = world().await;
        let r = book(&w, &w.member, w.a1, day(1)).await.unwrap();

        let moved = w
            .h
            .handle(UpdateReservation {
                actor: w.member.clone(),
                id: r.id,
                changes: ReservationChanges {
                    seat_id: Some(w.a2),
                    date: None,
                },
                today: today(),
            })
            .await
            .unwrap();
        assert_eq!((moved.seat_id, moved.date), (w.a2, day(1)));
        assert_eq!(moved.created_at, r.created_at);

        book(&w, &w.admin, w.a1, day(2)).await.unwrap();
        let onto_taken = w
            .h
            .handle(UpdateReservation {
                actor: w.member.clone(),
                id: r.id,
                changes: ReservationChanges {
                    seat_id: Some(w.a1),
                    date: Some(day(2)),
                },
                today: today(),
            })
            .await;
        assert_eq!(codes(&onto_taken), vec!["Reservation.SeatTaken"]);
    }

    #[tokio::test]
    async fn only_owners_or_admins_touch_a_reservation() {
        let w = world().await;
        let r = book(&w, &w.admin, w.a1, day(1)).await.unwrap();

        let peek = w.h.handle(GetReservation { actor: w.member.clone(), id: r.id }).await;
        assert_eq!(peek.first_error(), ReservationErrors::not_owner());

        let cancel = w
            .h
            .handle(CancelReservation { actor: w.member.clone(), id: r.id, today: today() })
            .await;
        assert_eq!(cancel.first_error().category(), ErrorCategory::Forbidden);

        let mine = book(&w, &w.member, w.a2, day(1)).await.unwrap();
        assert!(w.h.handle(GetReservation { actor: w.admin.clone(), id: mine.id }).await.is_ok());
        w.h.handle(CancelReservation { actor: w.admin.clone(), id: mine.id, today: today() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn past_reservations_are_frozen() {
        let w = world().await;
        let r = book(&w, &w.member, w.a1, day(1)).await.unwrap();
        let later = day(2);

        let cancel = w
            .h
            .handle(CancelReservation { actor: w.member.clone(), id: r.id, today: later })
            .await;
        assert_eq!(codes(&cancel), vec!["Reservation.AlreadyPast"]);

        let moved = w
            .h
            .handle(UpdateReservation {
                actor: w.member.clone(),
                id: r.id,
                changes: ReservationChanges {
                    seat_id: None,
                    date: Some(day(5)),
                },
                today: later,
            })
            .await;
        assert_eq!(codes(&moved), vec!["Reservation.AlreadyPast"]);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_caller() {
        let w = world().await;
        book(&w, &w.admin, w.a1, day(1)).await.unwrap();
        book(&w, &w.member, w.a2, day(1)).await.unwrap();
        book(&w, &w.member, w.a1, day(2)).await.unwrap();

        let mine = w.h.handle(ListReservations { actor: w.member.clone() }).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.user_id == w.member.user_id));
        assert!(mine[0].date <= mine[1].date);

        let all = w.h.handle(ListReservations { actor: w.admin.clone() }).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_reservations() {
        let w = world().await;
        book(&w, &w.member, w.a1, day(1)).await.unwrap();
        book(&w, &w.admin, w.a2, day(1)).await.unwrap();

        w.h.handle(DeleteUser { actor: w.member.clone(), id: w.member.user_id })
            .await
            .unwrap();

        let left = w.h.handle(ListReservations { actor: w.admin.clone() }).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].user_id, w.admin.user_id);
    }

    #[tokio::test]
    async fn deleted_accounts_cannot_book_with_a_live_token() {
        let w = world().await;
        w.h.handle(DeleteUser { actor: w.member.clone(), id: w.member.user_id })
            .await
            .unwrap();

        let outcome = book(&w, &w.member, w.a1, day(1)).await;
        assert_eq!(codes(&outcome), vec!["User.NotFound"]);
        assert!(w.h.repositories().reservations.list().await.unwrap().is_empty());
    }

    #[test]
    fn unique_key_rejections_name_the_broken_rule() {
        use crate::repository::RepositoryError;

        let date = day(1);
        let rejected = |key: &str| -> Outcome<()> {
            Err(RepositoryError::Conflict(key.to_string()))
                .or_conflict("insert_reservation", |key| booking_conflict(key, date))
        };

        for key in ["reservations.user_date", "reservations_user_date_key"] {
            assert_eq!(rejected(key).first_error().code(), "Reservation.UserAlreadyBooked");
        }
        for key in ["reservations.seat_date", "reservations_seat_date_key"] {
            assert_eq!(rejected(key).first_error().code(), "Reservation.SeatTaken");
        }
    }
}
