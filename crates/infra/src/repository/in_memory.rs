use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use cowork_auth::{Email, Role, User};
use cowork_core::{Entity, ReservationId, SeatId, UserId, ValueObject};
use cowork_reservations::Reservation;
use cowork_seats::{Seat, SeatNumber};

use super::{
    Repository, RepositoryError, ReservationRepository, SeatRepository, UserRepository,
    ensure_storable,
};

/// Named projection that must be unique across all stored records.
type UniqueKey<E> = (&'static str, fn(&E) -> String);

/// In-memory store for tests/dev.
///
/// Unique keys mirror the constraints of the Postgres schema, so both backends
/// reject the same writes.
pub struct InMemoryRepository<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
    unique: Vec<UniqueKey<E>>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            unique: Vec::new(),
        }
    }

    pub fn with_unique(mut self, name: &'static str, key: fn(&E) -> String) -> Self {
        self.unique.push((name, key));
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<E::Id, E>>, RepositoryError> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::Backend(format!("{} store lock poisoned", E::KIND)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<E::Id, E>>, RepositoryError> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::Backend(format!("{} store lock poisoned", E::KIND)))
    }

    fn check_unique(&self, map: &HashMap<E::Id, E>, entity: &E) -> Result<(), RepositoryError> {
        for (name, key) in &self.unique {
            let wanted = key(entity);
            let clash = map
                .values()
                .any(|other| other.id() != entity.id() && key(other) == wanted);
            if clash {
                return Err(RepositoryError::Conflict((*name).to_string()));
            }
        }
        Ok(())
    }

    fn filtered(&self, keep: impl Fn(&E) -> bool) -> Result<Vec<E>, RepositoryError> {
        let map = self.read()?;
        let mut out: Vec<E> = map.values().filter(|&e| keep(e)).cloned().collect();
        out.sort_by_key(|e| e.id());
        Ok(out)
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> core::fmt::Debug for InMemoryRepository<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let len = self.inner.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryRepository")
            .field("kind", &E::KIND)
            .field("len", &len)
            .finish()
    }
}

impl InMemoryRepository<User> {
    pub fn users() -> Self {
        Self::new().with_unique("users.email", |u| u.email.as_str().to_string())
    }
}

impl InMemoryRepository<Seat> {
    pub fn seats() -> Self {
        Self::new().with_unique("seats.number", |s| s.number.as_str().to_string())
    }
}

impl InMemoryRepository<Reservation> {
    pub fn reservations() -> Self {
        Self::new()
            .with_unique("reservations.seat_date", |r| format!("{}:{}", r.seat_id, r.date))
            .with_unique("reservations.user_date", |r| format!("{}:{}", r.user_id, r.date))
    }
}

#[async_trait::async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn get(&self, id: E::Id) -> Result<Option<E>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, RepositoryError> {
        self.filtered(|_| true)
    }

    async fn insert(&self, entity: &E) -> Result<(), RepositoryError> {
        let mut map = self.write()?;
        if map.contains_key(&entity.id()) {
            return Err(RepositoryError::Conflict(format!(
                "{} {} already exists",
                E::KIND,
                entity.id()
            )));
        }
        self.check_unique(&map, entity)?;
        map.insert(entity.id(), entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<bool, RepositoryError> {
        let mut map = self.write()?;
        if !map.contains_key(&entity.id()) {
            return Ok(false);
        }
        self.check_unique(&map, entity)?;
        map.insert(entity.id(), entity.clone());
        Ok(true)
    }

    async fn delete(&self, id: E::Id) -> Result<bool, RepositoryError> {
        Ok(self.write()?.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.read()?.values().find(|u| &u.email == email).cloned())
    }

    async fn insert_registration(&self, user: &User) -> Result<Role, RepositoryError> {
        let mut map = self.write()?;
        let mut stored = user.clone();
        if map.is_empty() {
            stored.role = Role::Admin;
        }
        if map.contains_key(&stored.id) {
            return Err(RepositoryError::Conflict(format!("User {} already exists", stored.id)));
        }
        self.check_unique(&map, &stored)?;
        let role = stored.role;
        map.insert(stored.id, stored);
        Ok(role)
    }
}

#[async_trait::async_trait]
impl SeatRepository for InMemoryRepository<Seat> {
    async fn find_by_number(&self, number: &SeatNumber) -> Result<Option<Seat>, RepositoryError> {
        Ok(self.read()?.values().find(|s| &s.number == number).cloned())
    }
}

fn by_date(mut reservations: Vec<Reservation>) -> Vec<Reservation> {
    reservations.sort_by_key(|r| (r.date, r.id));
    reservations
}

#[async_trait::async_trait]
impl ReservationRepository for InMemoryRepository<Reservation> {
    async fn for_seat_on(
        &self,
        seat_id: SeatId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        ensure_storable(date)?;
        self.filtered(|r| r.seat_id == seat_id && r.date == date)
    }

    async fn for_user_on(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        ensure_storable(date)?;
        self.filtered(|r| r.user_id == user_id && r.date == date)
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        self.filtered(|r| r.user_id == user_id).map(by_date)
    }

    async fn for_seat(&self, seat_id: SeatId) -> Result<Vec<Reservation>, RepositoryError> {
        self.filtered(|r| r.seat_id == seat_id).map(by_date)
    }

    async fn for_seat_from(
        &self,
        seat_id: SeatId,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        ensure_storable(from)?;
        self.filtered(|r| r.seat_id == seat_id && r.date >= from)
            .map(by_date)
    }

    async fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, RepositoryError> {
        ensure_storable(date)?;
        self.filtered(|r| r.date == date)
    }

    async fn delete_many(&self, ids: &[ReservationId]) -> Result<u64, RepositoryError> {
        let mut map = self.write()?;
        let removed = ids.iter().filter(|id| map.remove(*id).is_some()).count();
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cowork_auth::{NewUser, Role};
    use cowork_seats::NewSeat;

    fn user(email: &str) -> User {
        let reg = NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "Password1".to_string(),
        }
        .validate()
        .unwrap();
        User::register(UserId::new(), reg, "hash".to_string(), Role::Member, Utc::now())
    }

    fn seat(id: u128, number: &str) -> Seat {
        let input = NewSeat {
            number: number.to_string(),
            description: None,
            available: true,
        };
        Seat::create(
            SeatId::from_uuid(uuid::Uuid::from_u128(id)),
            input.validate().unwrap(),
            Utc::now(),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).unwrap()
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let repo = InMemoryRepository::users();
        let mut ada = user("ada@example.com");

        repo.insert(&ada).await.unwrap();
        assert_eq!(repo.get(ada.id).await.unwrap(), Some(ada.clone()));

        ada.role = Role::Admin;
        assert!(repo.update(&ada).await.unwrap());
        assert_eq!(repo.get(ada.id).await.unwrap().unwrap().role, Role::Admin);

        assert!(repo.delete(ada.id).await.unwrap());
        assert!(!repo.delete(ada.id).await.unwrap());
        assert!(!repo.update(&ada).await.unwrap());
    }

    #[tokio::test]
    async fn unique_keys_are_enforced_on_insert_and_update() {
        let repo = InMemoryRepository::users();
        let ada = user("ada@example.com");
        let mut grace = user("grace@example.com");
        repo.insert(&ada).await.unwrap();
        repo.insert(&grace).await.unwrap();

        let dup = user("ada@example.com");
        assert_eq!(
            repo.insert(&dup).await,
            Err(RepositoryError::Conflict("users.email".to_string()))
        );

        grace.email = ada.email.clone();
        assert!(matches!(repo.update(&grace).await, Err(RepositoryError::Conflict(_))));

        // Re-saving a record with its own key is not a clash.
        assert!(repo.update(&ada).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let repo = InMemoryRepository::seats();
        let first = seat(1, "A1");
        let second = seat(2, "A2");
        repo.insert(&second).await.unwrap();
        repo.insert(&first).await.unwrap();

        let numbers: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.number.to_string())
            .collect();
        assert_eq!(numbers, vec!["A1", "A2"]);
        assert_eq!(
            repo.find_by_number(&first.number).await.unwrap().map(|s| s.id),
            Some(first.id)
        );
    }

    #[tokio::test]
    async fn reservation_queries() {
        let repo = InMemoryRepository::reservations();
        let (alice, bob) = (UserId::new(), UserId::new());
        let (s1, s2) = (SeatId::new(), SeatId::new());
        let now = Utc::now();

        let r1 = Reservation::book(ReservationId::new(), alice, s1, day(3), now);
        let r2 = Reservation::book(ReservationId::new(), alice, s1, day(1), now);
        let r3 = Reservation::book(ReservationId::new(), bob, s2, day(3), now);
        for r in [&r1, &r2, &r3] {
            repo.insert(r).await.unwrap();
        }

        let clash = Reservation::book(ReservationId::new(), bob, s1, day(3), now);
        assert_eq!(
            repo.insert(&clash).await,
            Err(RepositoryError::Conflict("reservations.seat_date".to_string()))
        );

        assert_eq!(repo.for_seat_on(s1, day(3)).await.unwrap(), vec![r1.clone()]);
        assert_eq!(repo.for_user_on(bob, day(3)).await.unwrap(), vec![r3.clone()]);
        assert_eq!(repo.for_user(alice).await.unwrap(), vec![r2.clone(), r1.clone()]);
        assert_eq!(repo.for_seat_from(s1, day(2)).await.unwrap(), vec![r1.clone()]);
        assert_eq!(repo.for_seat(s1).await.unwrap(), vec![r2.clone(), r1.clone()]);
        assert_eq!(repo.on_date(day(3)).await.unwrap().len(), 2);

        assert_eq!(repo.delete_many(&[r1.id, r2.id, ReservationId::new()]).await.unwrap(), 2);
        assert_eq!(repo.list().await.unwrap(), vec![r3]);
    }

    #[tokio::test]
    async fn dates_outside_the_column_range_are_rejected() {
        let repo = InMemoryRepository::reservations();
        let seat_id = SeatId::new();

        assert!(matches!(
            repo.for_seat_from(seat_id, NaiveDate::MIN).await,
            Err(RepositoryError::Backend(_))
        ));
        assert!(matches!(
            repo.on_date(NaiveDate::MIN).await,
            Err(RepositoryError::Backend(_))
        ));

        let earliest =
            NaiveDate::from_ymd_opt(crate::repository::EARLIEST_STORABLE_YEAR, 11, 24).unwrap();
        assert!(repo.for_seat_from(seat_id, earliest).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_the_first_registration_is_promoted() {
        let repo = InMemoryRepository::users();
        let ada = user("ada@example.com");
        let grace = user("grace@example.com");

        assert_eq!(repo.insert_registration(&ada).await.unwrap(), Role::Admin);
        assert_eq!(repo.insert_registration(&grace).await.unwrap(), Role::Member);
        assert_eq!(repo.get(ada.id).await.unwrap().unwrap().role, Role::Admin);

        let dup = user("grace@example.com");
        assert_eq!(
            repo.insert_registration(&dup).await,
            Err(RepositoryError::Conflict("users.email".to_string()))
        );
    }
}
