pub mod calendars;
pub mod debug;
pub mod departures;
pub mod events;
pub mod health;
