use super::TimeInstance;
use crate::error;
use crate::Result;
use serde::{Deserialize, Serialize};
use snafu::ensure;

/// A time span `[start, end)`; an instant is represented by `start == end`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    start: TimeInstance,
    end: TimeInstance,
}

impl TimeInterval {
    pub fn new<A, B>(start: A, end: B) -> Result<Self>
    where
        A: Into<TimeInstance>,
        B: Into<TimeInstance>,
    {
        let start = start.into();
        let end = end.into();
        ensure!(
            start <= end,
            error::TimeIntervalStartAfterEnd { start, end }
        );
        Ok(Self { start, end })
    }

    pub fn new_unchecked<A, B>(start: A, end: B) -> Self
    where
        A: Into<TimeInstance>,
        B: Into<TimeInstance>,
    {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn new_instant<A>(instant: A) -> Self
    where
        A: Into<TimeInstance>,
    {
        let instant = instant.into();
        Self {
            start: instant,
            end: instant,
        }
    }

    /// The complete representable time range
    pub fn everlasting() -> Self {
        Self {
            start: TimeInstance::MIN,
            end: TimeInstance::MAX,
        }
    }

    pub fn start(&self) -> TimeInstance {
        self.start
    }

    pub fn end(&self) -> TimeInstance {
        self.end
    }

    pub fn duration_ms(&self) -> i64 {
        self.end.inner() - self.start.inner()
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    pub fn contains_instance(&self, instance: TimeInstance) -> bool {
        if self.is_instant() {
            return self.start == instance;
        }
        self.start <= instance && instance < self.end
    }

    /// Whether the two intervals share any instant. Instants intersect
    /// intervals they lie within; two intervals that merely touch do not
    /// intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_instant() {
            return other.contains_instance(self.start) || other.start == self.start;
        }
        if other.is_instant() {
            return self.contains_instance(other.start);
        }
        self.start < other.end && self.end > other.start
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<TimeInstance> for TimeInterval {
    fn from(instance: TimeInstance) -> Self {
        Self::new_instant(instance)
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
