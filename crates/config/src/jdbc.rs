use crate::error::BuilderError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// SQL column types, named as in JDBC.
///
/// Tokens are matched exactly (`VARCHAR`, not `varchar`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JdbcType {
    Array,
    Bit,
    Tinyint,
    Smallint,
    Integer,
    Bigint,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    Longvarchar,
    Date,
    Time,
    Timestamp,
    Binary,
    Varbinary,
    Longvarbinary,
    Null,
    Other,
    Blob,
    Clob,
    Boolean,
    Cursor,
    Undefined,
    Nvarchar,
    Nchar,
    Nclob,
    Struct,
    JavaObject,
    Distinct,
    Ref,
    Datalink,
    Rowid,
    Longnvarchar,
    Sqlxml,
    Datetimeoffset,
}

impl JdbcType {
    /// The numeric type code used by database drivers.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Array => 2003,
            Self::Bit => -7,
            Self::Tinyint => -6,
            Self::Smallint => 5,
            Self::Integer => 4,
            Self::Bigint => -5,
            Self::Float => 6,
            Self::Real => 7,
            Self::Double => 8,
            Self::Numeric => 2,
            Self::Decimal => 3,
            Self::Char => 1,
            Self::Varchar => 12,
            Self::Longvarchar => -1,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
            Self::Binary => -2,
            Self::Varbinary => -3,
            Self::Longvarbinary => -4,
            Self::Null => 0,
            Self::Other => 1111,
            Self::Blob => 2004,
            Self::Clob => 2005,
            Self::Boolean => 16,
            Self::Cursor => -10,
            Self::Undefined => i32::MIN + 1000,
            Self::Nvarchar => -9,
            Self::Nchar => -15,
            Self::Nclob => 2011,
            Self::Struct => 2002,
            Self::JavaObject => 2000,
            Self::Distinct => 2001,
            Self::Ref => 2006,
            Self::Datalink => 70,
            Self::Rowid => -8,
            Self::Longnvarchar => -16,
            Self::Sqlxml => 2009,
            Self::Datetimeoffset => -155,
        }
    }

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        <Self as strum::IntoEnumIterator>::iter().find(|ty| ty.code() == code)
    }

    /// Parses a type token.
    ///
    /// # Errors
    /// [`BuilderError::EnumMismatch`] for an unknown token.
    pub fn resolve(token: &str) -> Result<Self, BuilderError> {
        Self::from_str(token).map_err(|_| BuilderError::EnumMismatch {
            enumeration: "JdbcType",
            value: token.to_owned(),
            context: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_display() {
        assert_eq!(JdbcType::resolve("VARCHAR").unwrap(), JdbcType::Varchar);
        assert_eq!(JdbcType::resolve("JAVA_OBJECT").unwrap(), JdbcType::JavaObject);
        assert_eq!(JdbcType::Longnvarchar.to_string(), "LONGNVARCHAR");
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let err = JdbcType::resolve("varchar").unwrap_err();
        assert!(matches!(err, BuilderError::EnumMismatch { enumeration: "JdbcType", .. }));
    }

    #[test]
    fn codes() {
        assert_eq!(JdbcType::from_code(12), Some(JdbcType::Varchar));
        assert_eq!(JdbcType::from_code(-155), Some(JdbcType::Datetimeoffset));
        assert_eq!(JdbcType::from_code(42), None);
    }
}
