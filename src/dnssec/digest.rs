use std::fmt;

/// DS digest types (RFC 4034, 4509, 5933, 6605)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DigestType {
    Sha1 = 1,
    Sha256 = 2,
    Gost94 = 3,
    Sha384 = 4,
}

impl DigestType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Sha1),
            2 => Some(Self::Sha256),
            3 => Some(Self::Gost94),
            4 => Some(Self::Sha384),
            _ => None,
        }
    }

    /// Expected digest length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 | Self::Gost94 => 32,
            Self::Sha384 => 48,
        }
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Gost94 => "GOST R 34.11-94",
            Self::Sha384 => "SHA-384",
        };
        f.write_str(name)
    }
}

pub fn digest_name(value: u8) -> String {
    DigestType::from_u8(value)
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("DIGEST{}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_types() {
        assert_eq!(DigestType::from_u8(2), Some(DigestType::Sha256));
        assert_eq!(DigestType::Sha384.digest_len(), 48);
        assert_eq!(digest_name(1), "SHA-1");
        assert_eq!(digest_name(9), "DIGEST9");
    }
}
