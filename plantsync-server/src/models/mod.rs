mod command;
mod event;
mod indicator;
mod reading;
mod statistics;

pub use command::{Command, InboundCommand, MenuEntry, UserId, MENU};
pub use event::{Event, EventKind, EventTable};
pub use indicator::{IndicatorState, Thresholds};
pub use reading::{truncate_to_seconds, Measurement, Reading, ReadingTable};
pub use statistics::{FieldStats, Statistics, StatisticsSummary};

pub trait Table: Send + Sync {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;
}
