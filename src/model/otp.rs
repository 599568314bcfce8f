use std::convert::TryInto;
use std::fmt::Display;
use std::str::FromStr;

use rand::{distributions::Uniform, rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const CODE_LENGTH: usize = 6;

/// A one-time verification code.
///
/// Codes are drawn from the OS random source, and comparison is constant
/// time: a submitted code must not leak how many of its digits matched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code {
    #[serde(with = "serialize_code")]
    digits: [u8; CODE_LENGTH],
}

impl Code {
    /// Generate a random code.
    pub fn random() -> Self {
        let digit_dist = Uniform::from(0..=9);
        let mut digits = [0; CODE_LENGTH];
        for digit in &mut digits {
            *digit = OsRng.sample(digit_dist);
        }
        Self { digits }
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.digits[..].ct_eq(&other.digits[..]).into()
    }
}

impl Eq for Code {}

impl Display for Code {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for digit in self.digits {
            write!(formatter, "{digit}")?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.chars().count();
        if len != CODE_LENGTH {
            return Err(Self::Err::InvalidLength(len));
        }
        let digits = string
            .chars()
            .map(|c| match c {
                '0'..='9' => Ok(c as u8 - b'0'),
                _ => Err(Self::Err::InvalidChar(c)),
            })
            .collect::<Result<Vec<u8>, Self::Err>>()?;
        Ok(Self {
            digits: digits.try_into().unwrap(), // Valid because digits.len() == CODE_LENGTH
        })
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("code must contain exactly {CODE_LENGTH} characters, found {0}")]
    InvalidLength(usize),
    #[error("code must contain only digits, found {0:?}")]
    InvalidChar(char),
}

/// (De)serialisation for codes: a string of digits, both in JSON and BSON.
/// The BSON form is what the atomic consume filter matches against.
mod serialize_code {
    use serde::{
        de::{Error, Unexpected, Visitor},
        Deserializer, Serializer,
    };

    use super::CODE_LENGTH;

    pub fn serialize<S>(digits: &[u8; CODE_LENGTH], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&digits.iter().map(|n| (n + b'0') as char).collect::<String>())
    }

    struct StrVisitor;

    impl<'de> Visitor<'de> for StrVisitor {
        type Value = [u8; CODE_LENGTH];

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(formatter, "a string of {CODE_LENGTH} digits")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            v.parse::<super::Code>()
                .map(|code| code.digits)
                .map_err(|err| match err {
                    super::ParseError::InvalidLength(len) => E::invalid_length(
                        len,
                        &format!("a string of {CODE_LENGTH} digit characters").as_str(),
                    ),
                    super::ParseError::InvalidChar(c) => {
                        E::invalid_value(Unexpected::Char(c), &"a digit character")
                    }
                })
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; CODE_LENGTH], D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(StrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_codes_are_six_digits() {
        for _ in 0..100 {
            let code = Code::random();
            let rendered = code.to_string();
            assert_eq!(rendered.len(), CODE_LENGTH);
            assert!(rendered.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn parse_roundtrip() {
        let code = "042917".parse::<Code>().unwrap();
        assert_eq!(code.to_string(), "042917");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            "12345".parse::<Code>(),
            Err(ParseError::InvalidLength(5))
        ));
        assert!(matches!(
            "1234567".parse::<Code>(),
            Err(ParseError::InvalidLength(7))
        ));
        assert!(matches!(
            "12a456".parse::<Code>(),
            Err(ParseError::InvalidChar('a'))
        ));
    }

    #[test]
    fn equality_checks_all_digits() {
        let code = "123456".parse::<Code>().unwrap();
        assert_eq!(code, "123456".parse::<Code>().unwrap());
        assert_ne!(code, "123457".parse::<Code>().unwrap());
        assert_ne!(code, "023456".parse::<Code>().unwrap());
    }

    #[test]
    fn serde_is_a_digit_string() {
        let code = "907041".parse::<Code>().unwrap();
        let json = rocket::serde::json::serde_json::to_value(code).unwrap();
        assert_eq!(json, rocket::serde::json::serde_json::json!("907041"));
        let back: Code = rocket::serde::json::serde_json::from_value(json).unwrap();
        assert_eq!(back, code);
    }
}
