use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// One field of a partial update.
///
/// `Absent` means the field was not sent, `Null` means it was sent as `null`,
/// `Value` carries a new value. Use with `#[serde(default)]` so that missing
/// keys deserialize to `Absent`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// For columns that cannot be cleared: `null` is rejected.
    pub fn into_required(self, field: &str) -> Result<Option<T>, AppError> {
        match self {
            Patch::Absent => Ok(None),
            Patch::Null => Err(AppError::invalid(format!("{field} cannot be null"))),
            Patch::Value(v) => Ok(Some(v)),
        }
    }

    /// Applies the change to a nullable value in place.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = None,
            Patch::Value(v) => *target = Some(v),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only called when the key is present.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// `Absent` and `Null` both serialize as `null`, so schema defaults render as
/// an empty field.
impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            Patch::Absent | Patch::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        room_number: Patch<String>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let absent: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"room_number":null}"#).unwrap();
        let value: Body = serde_json::from_str(r#"{"room_number":"B-201"}"#).unwrap();

        assert_eq!(absent.room_number, Patch::Absent);
        assert_eq!(null.room_number, Patch::Null);
        assert_eq!(value.room_number, Patch::Value("B-201".to_string()));
    }

    #[test]
    fn serializes_as_the_plain_value_or_null() {
        assert_eq!(
            serde_json::to_value(Patch::Value("B-201".to_string())).unwrap(),
            serde_json::json!("B-201")
        );
        assert_eq!(serde_json::to_value(Patch::<bool>::Null).unwrap(), serde_json::Value::Null);
        assert_eq!(serde_json::to_value(Patch::<u8>::default()).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn required_rejects_null() {
        assert_eq!(Patch::<u8>::Absent.into_required("x"), Ok(None));
        assert_eq!(Patch::Value(3u8).into_required("x"), Ok(Some(3)));
        assert!(matches!(
            Patch::<u8>::Null.into_required("first_name"),
            Err(AppError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn apply_to_leaves_clears_or_sets() {
        let mut room = Some("A-101".to_string());
        Patch::Absent.apply_to(&mut room);
        assert_eq!(room.as_deref(), Some("A-101"));

        Patch::Value("B-201".to_string()).apply_to(&mut room);
        assert_eq!(room.as_deref(), Some("B-201"));

        Patch::Null.apply_to(&mut room);
        assert_eq!(room, None);
    }
}
