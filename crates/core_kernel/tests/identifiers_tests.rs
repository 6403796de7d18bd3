//! Tests for the strongly-typed identifiers

use core_kernel::{ShiftId, TransactionId, UserId};
use uuid::Uuid;

mod user_id_tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_prefix() {
        assert_eq!(UserId::prefix(), "USR");
        assert_eq!(TransactionId::prefix(), "TXN");
        assert_eq!(ShiftId::prefix(), "SHF");
    }
}

mod conversion_tests {
    use super::*;

    #[test]
    fn test_uuid_round_trip() {
        let uuid = Uuid::new_v4();
        let id = ShiftId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("TXN-not-a-uuid".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_deserialize_from_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id: UserId = serde_json::from_str(&format!("\"{}\"", uuid)).unwrap();
        assert_eq!(*id.as_uuid(), uuid);
    }
}
