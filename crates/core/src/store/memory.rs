use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{check_commit, CommitGuard, DailyAggregate, ReservationStore, StoreError};
use crate::capacity::ServiceDayConfig;
use crate::reservation::{BookedReservation, NewReservation, ReservationStatus};
use crate::table::DiningTable;
use crate::types::DbId;

#[derive(Default)]
struct State {
    tables: Vec<DiningTable>,
    reservations: Vec<BookedReservation>,
    configs: BTreeMap<u32, ServiceDayConfig>,
    ceilings: BTreeMap<u32, i32>,
    failing_tables: BTreeSet<DbId>,
    next_reservation_id: DbId,
}

/// Process-local store. A single mutex serializes every write, which gives
/// `create_reservation` the same all-or-nothing behaviour as the Postgres
/// transaction.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Vec<DiningTable>) -> Self {
        Self {
            state: Mutex::new(State {
                tables,
                ..State::default()
            }),
            unavailable: AtomicBool::new(false),
        }
    }

    pub async fn insert_table(&self, table: DiningTable) {
        self.state.lock().await.tables.push(table);
    }

    /// Seed an existing reservation without any checks.
    pub async fn insert_reservation(&self, reservation: BookedReservation) {
        let mut state = self.state.lock().await;
        state.next_reservation_id = state.next_reservation_id.max(reservation.id);
        state.reservations.push(reservation);
    }

    pub async fn set_service_config(&self, config: ServiceDayConfig) {
        self.state
            .lock()
            .await
            .configs
            .insert(config.day_of_week, config);
    }

    pub async fn set_occupancy_ceiling(&self, day_of_week: u32, ceiling: i32) {
        self.state.lock().await.ceilings.insert(day_of_week, ceiling);
    }

    /// Make every later write to this table fail.
    pub async fn fail_writes_for(&self, table_id: DbId) {
        self.state.lock().await.failing_tables.insert(table_id);
    }

    /// Simulate an unreachable backend: every call returns
    /// [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn table(&self, id: DbId) -> Option<DiningTable> {
        self.state
            .lock()
            .await
            .tables
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        } else {
            Ok(())
        }
    }
}

fn table_mut<'a>(
    state: &'a mut State,
    id: DbId,
) -> Result<&'a mut DiningTable, StoreError> {
    if state.failing_tables.contains(&id) {
        return Err(StoreError::Unavailable(format!("write to table {id} failed")));
    }
    state
        .tables
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(StoreError::NotFound { entity: "table", id })
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn list_tables(&self) -> Result<Vec<DiningTable>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.tables.clone())
    }

    async fn list_reservations(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<BookedReservation>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn get_reservation(&self, id: DbId) -> Result<Option<BookedReservation>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn service_config(
        &self,
        day_of_week: u32,
    ) -> Result<Option<ServiceDayConfig>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.configs.get(&day_of_week).cloned())
    }

    async fn occupancy_ceilings(&self) -> Result<BTreeMap<u32, i32>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.ceilings.clone())
    }

    async fn daily_aggregates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut by_day: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for r in state
            .reservations
            .iter()
            .filter(|r| r.status != ReservationStatus::Cancelled && r.date >= start && r.date <= end)
        {
            let entry = by_day.entry(r.date).or_default();
            entry.0 += 1;
            entry.1 += i64::from(r.party_size);
        }
        Ok(by_day
            .into_iter()
            .map(|(date, (count, total_party_size))| DailyAggregate {
                date,
                count,
                total_party_size,
            })
            .collect())
    }

    async fn update_table_position(&self, id: DbId, x: f64, y: f64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let table = table_mut(&mut state, id)?;
        table.position_x = x;
        table.position_y = y;
        Ok(())
    }

    async fn update_table_dimensions(
        &self,
        id: DbId,
        width: f64,
        height: f64,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let table = table_mut(&mut state, id)?;
        table.width = width;
        table.height = height;
        Ok(())
    }

    async fn create_reservation(
        &self,
        reservation: &NewReservation,
        guard: &CommitGuard,
    ) -> Result<DbId, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let same_day: Vec<BookedReservation> = state
            .reservations
            .iter()
            .filter(|r| r.date == reservation.date)
            .cloned()
            .collect();
        check_commit(reservation, guard, &state.tables, &same_day)?;

        state.next_reservation_id += 1;
        let id = state.next_reservation_id;
        state.reservations.push(BookedReservation {
            id,
            date: reservation.date,
            time: reservation.time,
            party_size: reservation.party_size,
            status: reservation.status,
            table_ids: reservation.table_ids.clone(),
        });
        Ok(id)
    }

    async fn update_reservation_status(
        &self,
        id: DbId,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let reservation = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound {
                entity: "reservation",
                id,
            })?;
        if reservation.status != from {
            return Err(StoreError::Conflict(format!(
                "Reservation {id} is now {}, expected {}",
                reservation.status.as_str(),
                from.as_str()
            )));
        }
        reservation.status = to;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
