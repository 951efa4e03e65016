//! Wall-clock to instant conversion, injected into the position mapper.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Turns a grid wall-clock time in a named zone into an absolute instant.
///
/// Returns `None` when the wall-clock time does not exist in that zone
/// (a DST gap) or the zone id is unknown.
pub trait TimezoneConverter: Send + Sync {
    fn to_instant(&self, local: NaiveDateTime, timezone: &str) -> Option<DateTime<Utc>>;
}

impl<F> TimezoneConverter for F
where
    F: Fn(NaiveDateTime, &str) -> Option<DateTime<Utc>> + Send + Sync,
{
    fn to_instant(&self, local: NaiveDateTime, timezone: &str) -> Option<DateTime<Utc>> {
        self(local, timezone)
    }
}

/// IANA zone database conversion backed by `chrono-tz`.
///
/// Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzConverter;

impl TimezoneConverter for ChronoTzConverter {
    fn to_instant(&self, local: NaiveDateTime, timezone: &str) -> Option<DateTime<Utc>> {
        let tz = match Tz::from_str(timezone) {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', cannot place {}", timezone, local);
                return None;
            }
        };

        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
