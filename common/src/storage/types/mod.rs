use serde::{Deserialize, Serialize};
pub mod processing_task;
pub mod qa_pair;
pub mod serde_support;
pub mod stage;
pub mod transform_detail;

pub trait StoredObject: Serialize + for<'de> Deserialize<'de> {
    fn table_name() -> &'static str;
    fn get_id(&self) -> &str;
}

#[macro_export]
macro_rules! stored_object {
    ($name:ident, $table:expr, {$($(#[$attr:meta])* $field:ident: $ty:ty),*}) => {
        use serde::{Deserialize, Serialize};
        use $crate::storage::types::StoredObject;
        #[allow(unused_imports)]
        use $crate::storage::types::serde_support::{
            deserialize_datetime, deserialize_flexible_id, deserialize_option_datetime,
            serialize_datetime, serialize_option_datetime,
        };
        use chrono::{DateTime, Utc};

        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
        pub struct $name {
            #[serde(deserialize_with = "deserialize_flexible_id")]
            pub id: String,
            #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime", default)]
            pub created_at: DateTime<Utc>,
            #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime", default)]
            pub updated_at: DateTime<Utc>,
            $( $(#[$attr])* pub $field: $ty),*
        }

        impl StoredObject for $name {
            fn table_name() -> &'static str {
                $table
            }

            fn get_id(&self) -> &str {
                &self.id
            }
        }
    };
}
