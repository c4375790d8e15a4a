use std::time::SystemTime;

use uuid::Uuid;

use crate::proto::{StatusMessage, StatusRequest};

/// Status reported for one entity at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub uuid: Uuid,
    pub timestamp: SystemTime,
}

impl Status {
    #[must_use]
    pub fn new(uuid: Uuid, timestamp: SystemTime) -> Self {
        Self { uuid, timestamp }
    }

    /// Fresh random id stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Uuid::new_v4(), SystemTime::now())
    }
}

impl From<&Status> for StatusMessage {
    fn from(status: &Status) -> Self {
        Self {
            uuid: status.uuid.to_string(),
            timestamp: Some(status.timestamp.into()),
        }
    }
}

pub(crate) fn status_request(uuid: Uuid) -> StatusRequest {
    StatusRequest {
        uuid: uuid.to_string(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn message_carries_uuid_and_timestamp() {
        let uuid = Uuid::new_v4();
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let msg = StatusMessage::from(&Status::new(uuid, at));

        assert_eq!(msg.uuid, uuid.to_string());
        let ts = msg.timestamp.unwrap();
        assert_eq!(ts.seconds, 1_700_000_000);
        assert_eq!(ts.nanos, 0);
    }

    #[test]
    fn now_uses_fresh_ids() {
        assert_ne!(Status::now().uuid, Status::now().uuid);
    }
}
