//! Serde helpers for SurrealDB record ids
//!
//! Record ids cross the API boundary as `"table:id"` strings while staying
//! real [`Thing`] values inside the database layer. The visitor accepts both
//! the string form (JSON payloads) and the native form the database
//! deserializer presents, so the same model works for query results and for
//! request bodies.

use serde::{Deserialize, Deserializer, Serializer, de};
use std::fmt;
use surrealdb::sql::Thing;

fn parse_thing(s: &str) -> Thing {
    if let Some((tb, id)) = s.split_once(':') {
        Thing::from((tb.to_string(), id.to_string()))
    } else {
        Thing::from(("".to_string(), s.to_string()))
    }
}

struct ThingVisitor;

impl<'de> de::Visitor<'de> for ThingVisitor {
    type Value = Thing;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a record id or a string like 'table:id'")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(parse_thing(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(parse_thing(&v))
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        Thing::deserialize(de::value::MapAccessDeserializer::new(map))
    }

    fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Thing::deserialize(deserializer)
    }
}

/// Serialize a required record link as a string
pub fn serialize<S: Serializer>(value: &Thing, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

/// Deserialize a required record link from a Thing or a string
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Thing, D::Error> {
    deserializer.deserialize_any(ThingVisitor)
}

/// Helpers for `Option<Thing>` fields (typically the `id` column)
pub mod option {
    use super::*;

    struct OptionThingVisitor;

    impl<'de> de::Visitor<'de> for OptionThingVisitor {
        type Value = Option<Thing>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("null, a record id, or a string like 'table:id'")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(ThingVisitor).map(Some)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(parse_thing(v)))
            }
        }

        fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            Thing::deserialize(de::value::MapAccessDeserializer::new(map)).map(Some)
        }
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Thing>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(thing) => serializer.serialize_str(&thing.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Thing>, D::Error> {
        deserializer.deserialize_option(OptionThingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(with = "super")]
        link: Thing,
        #[serde(default, with = "super::option")]
        id: Option<Thing>,
    }

    #[test]
    fn test_deserializes_string_forms() {
        let row: Row =
            serde_json::from_str(r#"{"link": "campaign:abc", "id": "donation:xyz"}"#).unwrap();
        assert_eq!(row.link.tb, "campaign");
        assert_eq!(row.link.id.to_string(), "abc");
        assert_eq!(row.id.unwrap().to_string(), "donation:xyz");
    }

    #[test]
    fn test_missing_id_is_none() {
        let row: Row = serde_json::from_str(r#"{"link": "campaign:abc"}"#).unwrap();
        assert!(row.id.is_none());
    }
}
