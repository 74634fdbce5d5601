// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Duration;
use chrono::Local;
use chrono::NaiveDate;
use chrono::SubsecRound;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::error::ErrorReport;
use crate::error::Fallible;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A point in time with millisecond precision. Stored and serialized as
/// milliseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Sub-millisecond precision is dropped.
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts.trunc_subsecs(3))
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn from_millis(millis: i64) -> Fallible<Self> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| ErrorReport::new(&format!("timestamp out of range: {millis}")))
    }

    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The timestamp `days` whole days later, saturating at the latest
    /// representable instant.
    pub fn plus_days(self, days: u32) -> Self {
        match self.0.checked_add_signed(Duration::days(i64::from(days))) {
            Some(ts) => Self(ts),
            None => Self::new(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whole days from `self` until `later`, rounded up. Negative if `later`
    /// is in the past.
    pub fn days_until(self, later: Timestamp) -> i64 {
        let millis = later.as_millis() - self.as_millis();
        millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
    }

    pub fn local_date(self) -> NaiveDate {
        self.0.with_timezone(&Local).date_naive()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Timestamp::from_millis(millis).map_err(|e| serde::de::Error::custom(e.message()))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_millis()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let millis: i64 = FromSql::column_result(value)?;
        Timestamp::from_millis(millis).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_roundtrip() -> Fallible<()> {
        let ts = Timestamp::from_millis(1_700_000_000_123)?;
        assert_eq!(ts.as_millis(), 1_700_000_000_123);
        Ok(())
    }

    #[test]
    fn test_now_has_millisecond_precision() -> Fallible<()> {
        let now = Timestamp::now();
        assert_eq!(Timestamp::from_millis(now.as_millis())?, now);
        Ok(())
    }

    #[test]
    fn test_plus_days() -> Fallible<()> {
        let ts = Timestamp::from_millis(0)?;
        assert_eq!(ts.plus_days(6).as_millis(), 6 * MILLIS_PER_DAY);
        Ok(())
    }

    #[test]
    fn test_plus_days_saturates() -> Fallible<()> {
        let ts = Timestamp::from_millis(0)?;
        let latest = Timestamp::new(DateTime::<Utc>::MAX_UTC);
        assert_eq!(ts.plus_days(u32::MAX), latest);
        assert_eq!(latest.plus_days(1), latest);
        assert_eq!(Timestamp::from_millis(latest.as_millis())?, latest);
        Ok(())
    }

    #[test]
    fn test_days_until() -> Fallible<()> {
        let ts = Timestamp::from_millis(0)?;
        assert_eq!(ts.days_until(ts), 0);
        assert_eq!(ts.days_until(ts.plus_days(3)), 3);
        assert_eq!(ts.days_until(Timestamp::from_millis(1)?), 1);
        assert_eq!(ts.plus_days(2).days_until(ts), -2);
        Ok(())
    }

    #[test]
    fn test_serde_as_millis() -> Fallible<()> {
        let ts = Timestamp::from_millis(42)?;
        assert_eq!(serde_json::to_string(&ts)?, "42");
        let back: Timestamp = serde_json::from_str("42")?;
        assert_eq!(back, ts);
        Ok(())
    }
}
