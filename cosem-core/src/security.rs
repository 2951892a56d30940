//! Security policy types and the cipher collaborator interface

use crate::error::{CosemError, CosemResult};
use std::fmt;

/// Security policy applied to application PDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    #[default]
    None,
    /// Plaintext with an authentication tag
    Authentication,
    /// Ciphertext without an authentication tag
    Encryption,
    /// Ciphertext with an authentication tag
    AuthenticationEncryption,
}

impl Security {
    /// Bits 4-5 of the security control byte.
    pub fn control_bits(self) -> u8 {
        match self {
            Security::None => 0x00,
            Security::Authentication => 0x10,
            Security::Encryption => 0x20,
            Security::AuthenticationEncryption => 0x30,
        }
    }

    pub fn from_control_bits(byte: u8) -> Self {
        match byte & 0x30 {
            0x10 => Security::Authentication,
            0x20 => Security::Encryption,
            0x30 => Security::AuthenticationEncryption,
            _ => Security::None,
        }
    }
}

/// Eight byte system title identifying a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemTitle([u8; 8]);

impl SystemTitle {
    pub fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(data: &[u8]) -> CosemResult<Self> {
        if data.len() != 8 {
            return Err(CosemError::Security(format!(
                "system title must be 8 bytes, got {}",
                data.len()
            )));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(data);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for SystemTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Ciphering collaborator used by the segmenter and dispatcher.
///
/// The engine treats the cryptography as a black box: `encrypt` wraps a
/// plaintext PDU into a complete ciphered APDU carrying the given tag, and
/// `decrypt` unwraps the body of a ciphered APDU (security control byte
/// onward) back into the plaintext PDU. `decrypt` fails on authentication
/// errors.
pub trait Cipher: fmt::Debug {
    fn security(&self) -> Security;

    /// This station's own system title.
    fn system_title(&self) -> &SystemTitle;

    fn encrypt(
        &mut self,
        tag: u8,
        system_title: &SystemTitle,
        plaintext: &[u8],
    ) -> CosemResult<Vec<u8>>;

    /// `source_system_title` is the sender's title when the envelope carried
    /// one (general ciphering); otherwise the cipher falls back to the title
    /// learned at association time.
    fn decrypt(
        &mut self,
        source_system_title: Option<&SystemTitle>,
        body: &[u8],
    ) -> CosemResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_control_bits() {
        assert_eq!(Security::None.control_bits(), 0x00);
        assert_eq!(Security::AuthenticationEncryption.control_bits(), 0x30);
        assert_eq!(
            Security::from_control_bits(0x21),
            Security::Encryption
        );
        assert_eq!(Security::from_control_bits(0x0F), Security::None);
    }

    #[test]
    fn test_system_title_from_slice() {
        assert!(SystemTitle::from_slice(&[1, 2, 3]).is_err());
        let title = SystemTitle::from_slice(&[0x4D, 0x4D, 0x4D, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(title.to_string(), "4D4D4D0000000001");
    }
}
