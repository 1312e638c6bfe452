use static_assertions::assert_impl_all;
use std::fmt;
use std::str::FromStr;

const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Device identifier as reported by the adapter.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Returns UUID with all bytes set to zero. Adapters never report it for a real device.
    pub const fn zeroed() -> Self {
        Self([0; 16])
    }

    /// Constructs instance from the specified bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Constructs instance from a big-endian integer.
    pub const fn from_u128(v: u128) -> Self {
        Self(v.to_be_bytes())
    }

    /// Returns inner bytes array.
    pub fn bytes(&self) -> [u8; 16] {
        self.0
    }

    pub fn is_zeroed(&self) -> bool {
        self.0 == [0; 16]
    }
}

assert_impl_all!(Uuid: Send, Sync);

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uuid({})", self)
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(v: [u8; 16]) -> Self {
        Self::from_bytes(v)
    }
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.as_bytes();
        if s.len() != 36 || HYPHENS.iter().any(|&i| s[i] != b'-') {
            return Err(UuidParseError(()));
        }

        fn dig(c: u8) -> Result<u8, UuidParseError> {
            Ok(match c {
                b'0'..=b'9' => c - b'0',
                b'a'..=b'f' => c - b'a' + 10,
                b'A'..=b'F' => c - b'A' + 10,
                _ => return Err(UuidParseError(())),
            })
        }

        let mut digits = s.iter()
            .enumerate()
            .filter(|(i, _)| !HYPHENS.contains(i))
            .map(|(_, &c)| c);
        let mut buf = [0; 16];
        for d in buf.iter_mut() {
            match (digits.next(), digits.next()) {
                (Some(hi), Some(lo)) => *d = (dig(hi)? << 4) | dig(lo)?,
                _ => return Err(UuidParseError(())),
            }
        }
        Ok(buf.into())
    }
}

#[derive(Debug)]
pub struct UuidParseError(());

impl fmt::Display for UuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid UUID string")
    }
}

impl std::error::Error for UuidParseError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_ok() {
        let data = &[
            ("00000000-0000-0000-0000-000000000000", Uuid::zeroed()),
            ("12345678-9AbC-Def0-1234-56789aBCDEF0", Uuid::from_bytes(
                [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC,
                    0xDE, 0xF0])),
            ("00000000-0000-0000-0000-00000000002a", Uuid::from_u128(42)),
        ];
        for &(inp, exp) in data {
            let act = inp.parse::<Uuid>().unwrap();
            assert_eq!(act, exp);
            assert_eq!(inp.to_ascii_lowercase(), act.to_string());
        }
    }

    #[test]
    fn parse_fail() {
        let data = &[
            "",
            "0",
            "00000000_0000-0000-0000-000000000000",
            "00000000-0000*0000-0000-000000000000",
            "00000000-0000-0000-0000~000000000000",
            "00000000-0000-00z0-0000-000000000000",
            "00000000-0000-0000-0000-_00000000000",
        ];
        for &inp in data {
            assert!(inp.parse::<Uuid>().is_err());
        }
    }

    #[test]
    fn zeroed() {
        assert!(Uuid::default().is_zeroed());
        assert!(!Uuid::from_u128(1).is_zeroed());
    }
}
