//! Shared test utilities for bursary-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use bursary_core::clock::FixedClock;

    use crate::BursaryDb;
    use crate::service::{BursaryService, PipelineSettings};

    /// Instant every test service runs at.
    pub fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    /// In-memory service with a frozen clock and default settings.
    pub async fn test_service() -> BursaryService {
        test_service_with(PipelineSettings::default()).await
    }

    /// In-memory service with a frozen clock and the given settings.
    pub async fn test_service_with(settings: PipelineSettings) -> BursaryService {
        let db = BursaryDb::open_local(":memory:").await.unwrap();
        BursaryService::from_db(db, Arc::new(FixedClock(test_now())), settings)
    }
}
