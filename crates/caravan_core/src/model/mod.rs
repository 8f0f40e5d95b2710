pub mod driver;
pub mod order;
pub mod run;
pub mod time_window;
pub mod vehicle;
pub mod zone;

pub use driver::{Driver, DriverStatus};
pub use order::{Order, OrderStatus};
pub use run::{DeliveryRun, RunStatus};
pub use time_window::TimeWindow;
pub use vehicle::Vehicle;
pub use zone::{ActiveDays, Zone};
