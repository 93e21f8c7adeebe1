use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Largest value a single counter may report
pub const MAX_COUNTER_VALUE: f64 = 1_000_000_000.0;

/// Every raw counter an activity report can carry.
///
/// Legacy weight-table keys are accepted as aliases so tables exported by
/// older deployments load unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
    Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Counter {
    #[serde(alias = "pessoas")]
    Attendance,
    #[serde(alias = "pessoas_novas")]
    NewAttendees,
    #[serde(alias = "celulas_realizadas")]
    CellsHeld,
    #[serde(alias = "celulas_elite")]
    EliteCells,
    #[serde(alias = "pessoas_terca")]
    TuesdayAttendance,
    #[serde(alias = "pessoas_novas_terca")]
    TuesdayNewAttendees,
    #[serde(alias = "pessoas_arena")]
    ArenaAttendance,
    #[serde(alias = "pessoas_novas_arena")]
    ArenaNewAttendees,
    #[serde(alias = "pessoas_domingo")]
    SundayAttendance,
    #[serde(alias = "pessoas_novas_domingo")]
    SundayNewAttendees,
    #[serde(alias = "valor_arrecadacao")]
    PartnerDonation,
}

impl Counter {
    /// The monetary counter is the only fractional one.
    pub fn is_monetary(&self) -> bool {
        matches!(self, Counter::PartnerDonation)
    }
}

/// Raw counters of one activity report. Absent fields deserialize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSet {
    #[serde(alias = "qtd_pessoas")]
    pub attendance: i64,
    #[serde(alias = "qtd_pessoas_novas")]
    pub new_attendees: i64,
    #[serde(alias = "qtd_celulas_realizadas")]
    pub cells_held: i64,
    #[serde(alias = "qtd_celulas_elite")]
    pub elite_cells: i64,
    #[serde(alias = "qtd_pessoas_terca")]
    pub tuesday_attendance: i64,
    #[serde(alias = "qtd_pessoas_novas_terca")]
    pub tuesday_new_attendees: i64,
    #[serde(alias = "qtd_pessoas_arena")]
    pub arena_attendance: i64,
    #[serde(alias = "qtd_pessoas_novas_arena")]
    pub arena_new_attendees: i64,
    #[serde(alias = "qtd_pessoas_domingo")]
    pub sunday_attendance: i64,
    #[serde(alias = "qtd_pessoas_novas_domingo")]
    pub sunday_new_attendees: i64,
    #[serde(alias = "valor_arrecadacao_parceiro")]
    pub partner_donation: f64,
}

impl CounterSet {
    pub fn value(&self, counter: Counter) -> f64 {
        match counter {
            Counter::Attendance => self.attendance as f64,
            Counter::NewAttendees => self.new_attendees as f64,
            Counter::CellsHeld => self.cells_held as f64,
            Counter::EliteCells => self.elite_cells as f64,
            Counter::TuesdayAttendance => self.tuesday_attendance as f64,
            Counter::TuesdayNewAttendees => self.tuesday_new_attendees as f64,
            Counter::ArenaAttendance => self.arena_attendance as f64,
            Counter::ArenaNewAttendees => self.arena_new_attendees as f64,
            Counter::SundayAttendance => self.sunday_attendance as f64,
            Counter::SundayNewAttendees => self.sunday_new_attendees as f64,
            Counter::PartnerDonation => self.partner_donation,
        }
    }

    /// First counter holding a negative, non-finite or oversized value, if any.
    pub fn first_invalid(&self) -> Option<Counter> {
        use strum::IntoEnumIterator;

        Counter::iter().find(|counter| {
            let value = self.value(*counter);
            !value.is_finite() || !(0.0..=MAX_COUNTER_VALUE).contains(&value)
        })
    }
}
