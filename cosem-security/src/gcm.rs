//! AES-GCM ciphering for glo/ded APDUs
//!
//! Suite 0: AES-128-GCM with a 12-byte authentication tag. The nonce is the
//! sender's system title followed by the invocation counter; the additional
//! authenticated data is the security control byte followed by the
//! authentication key (and, in authentication-only mode, the plaintext).

use crate::control::SecurityControl;
use aes::Aes128;
use aes_gcm::AesGcm;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use cosem_core::{ByteBuffer, Cipher, CosemError, CosemResult, Security, SystemTitle};
use std::fmt;

/// AES-128-GCM with the 12-byte tag DLMS suite 0 mandates.
type Aes128Gcm12 = AesGcm<Aes128, U12, U12>;

const TAG_LENGTH: usize = 12;

/// Suite 0 cipher holding the session keys and the invocation counter.
pub struct GcmCipher {
    security: Security,
    system_title: SystemTitle,
    peer_system_title: Option<SystemTitle>,
    block_cipher_key: [u8; 16],
    authentication_key: [u8; 16],
    invocation_counter: u32,
}

impl GcmCipher {
    pub fn new(
        security: Security,
        system_title: SystemTitle,
        block_cipher_key: [u8; 16],
        authentication_key: [u8; 16],
    ) -> Self {
        Self {
            security,
            system_title,
            peer_system_title: None,
            block_cipher_key,
            authentication_key,
            invocation_counter: 1,
        }
    }

    /// Title of the station we decrypt from, learned at association time.
    pub fn with_peer_system_title(mut self, title: SystemTitle) -> Self {
        self.peer_system_title = Some(title);
        self
    }

    pub fn with_invocation_counter(mut self, counter: u32) -> Self {
        self.invocation_counter = counter;
        self
    }

    pub fn invocation_counter(&self) -> u32 {
        self.invocation_counter
    }

    fn gcm(&self) -> Aes128Gcm12 {
        Aes128Gcm12::new(GenericArray::from_slice(&self.block_cipher_key))
    }

    fn nonce(title: &SystemTitle, counter: u32) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..8].copy_from_slice(title.as_bytes());
        nonce[8..].copy_from_slice(&counter.to_be_bytes());
        nonce
    }
}

impl Cipher for GcmCipher {
    fn security(&self) -> Security {
        self.security
    }

    fn system_title(&self) -> &SystemTitle {
        &self.system_title
    }

    fn encrypt(
        &mut self,
        tag: u8,
        system_title: &SystemTitle,
        plaintext: &[u8],
    ) -> CosemResult<Vec<u8>> {
        let control = SecurityControl::new(self.security, 0);
        let counter = self.invocation_counter;
        let nonce = Self::nonce(system_title, counter);

        let body = match self.security {
            Security::None => {
                return Err(CosemError::Security(
                    "ciphering requested with security policy None".to_string(),
                ));
            }
            Security::Encryption => {
                return Err(CosemError::Security(
                    "encryption without authentication is not supported by suite 0".to_string(),
                ));
            }
            Security::Authentication => {
                let mut aad = Vec::with_capacity(17 + plaintext.len());
                aad.push(control.to_byte());
                aad.extend_from_slice(&self.authentication_key);
                aad.extend_from_slice(plaintext);
                let auth_tag = self
                    .gcm()
                    .encrypt(
                        GenericArray::from_slice(&nonce),
                        Payload { msg: &[], aad: &aad },
                    )
                    .map_err(|_| CosemError::Security("authentication failed".to_string()))?;
                let mut body = plaintext.to_vec();
                body.extend_from_slice(&auth_tag);
                body
            }
            Security::AuthenticationEncryption => {
                let mut aad = Vec::with_capacity(17);
                aad.push(control.to_byte());
                aad.extend_from_slice(&self.authentication_key);
                self.gcm()
                    .encrypt(
                        GenericArray::from_slice(&nonce),
                        Payload {
                            msg: plaintext,
                            aad: &aad,
                        },
                    )
                    .map_err(|_| CosemError::Security("encryption failed".to_string()))?
            }
        };

        let mut out = ByteBuffer::with_capacity(7 + body.len());
        out.set_u8(tag);
        out.set_object_count(5 + body.len());
        out.set_u8(control.to_byte());
        out.set_u32(counter);
        out.set(&body);
        self.invocation_counter = self.invocation_counter.wrapping_add(1);
        Ok(out.into_vec())
    }

    fn decrypt(
        &mut self,
        source_system_title: Option<&SystemTitle>,
        body: &[u8],
    ) -> CosemResult<Vec<u8>> {
        if body.len() < 5 {
            return Err(CosemError::Security("ciphered body too short".to_string()));
        }
        let control = SecurityControl::from_byte(body[0]);
        let counter = u32::from_be_bytes([body[1], body[2], body[3], body[4]]);
        let rest = &body[5..];

        let title = source_system_title
            .or(self.peer_system_title.as_ref())
            .ok_or_else(|| {
                CosemError::Security("source system title is not known".to_string())
            })?;
        let nonce = Self::nonce(title, counter);

        match (control.is_authenticated(), control.is_encrypted()) {
            (true, true) => {
                let mut aad = Vec::with_capacity(17);
                aad.push(control.to_byte());
                aad.extend_from_slice(&self.authentication_key);
                self.gcm()
                    .decrypt(
                        GenericArray::from_slice(&nonce),
                        Payload {
                            msg: rest,
                            aad: &aad,
                        },
                    )
                    .map_err(|_| {
                        CosemError::Security("authenticated decryption failed".to_string())
                    })
            }
            (true, false) => {
                if rest.len() < TAG_LENGTH {
                    return Err(CosemError::Security(
                        "authenticated body shorter than the tag".to_string(),
                    ));
                }
                let (plaintext, auth_tag) = rest.split_at(rest.len() - TAG_LENGTH);
                let mut aad = Vec::with_capacity(17 + plaintext.len());
                aad.push(control.to_byte());
                aad.extend_from_slice(&self.authentication_key);
                aad.extend_from_slice(plaintext);
                self.gcm()
                    .decrypt(
                        GenericArray::from_slice(&nonce),
                        Payload {
                            msg: auth_tag,
                            aad: &aad,
                        },
                    )
                    .map_err(|_| {
                        CosemError::Security("authentication tag verification failed".to_string())
                    })?;
                Ok(plaintext.to_vec())
            }
            (false, true) => Err(CosemError::Security(
                "encryption without authentication is not supported by suite 0".to_string(),
            )),
            (false, false) => Ok(rest.to_vec()),
        }
    }
}

impl fmt::Debug for GcmCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcmCipher")
            .field("security", &self.security)
            .field("system_title", &self.system_title)
            .field("invocation_counter", &self.invocation_counter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLO_GET_RESPONSE: u8 = 0xCC;

    fn test_cipher(security: Security) -> GcmCipher {
        let title = SystemTitle::new([0x4D, 0x4D, 0x4D, 0, 0, 0, 0, 1]);
        GcmCipher::new(security, title, [0x11; 16], [0x22; 16])
            .with_peer_system_title(title)
    }

    #[test]
    fn test_encrypt_layout() {
        let mut cipher = test_cipher(Security::AuthenticationEncryption);
        let title = *cipher.system_title();
        let apdu = cipher
            .encrypt(GLO_GET_RESPONSE, &title, &[0xC4, 0x01, 0xC1, 0x00, 0x16, 0x03])
            .unwrap();
        assert_eq!(apdu[0], GLO_GET_RESPONSE);
        // length, then SC byte and the 4-byte invocation counter
        let mut bb = ByteBuffer::from(&apdu[1..]);
        let len = bb.get_object_count().unwrap();
        assert_eq!(len, bb.available());
        assert_eq!(bb.get_u8().unwrap(), 0x30);
        assert_eq!(bb.get_u32().unwrap(), 1);
        assert_eq!(cipher.invocation_counter(), 2);
    }

    #[test]
    fn test_round_trip_authenticated_encryption() {
        let mut sender = test_cipher(Security::AuthenticationEncryption);
        let mut receiver = test_cipher(Security::AuthenticationEncryption);
        let plaintext = vec![0xC4, 0x01, 0xC1, 0x00, 0x06, 0x00, 0x00, 0x00, 0x2A];
        let title = *sender.system_title();
        let apdu = sender.encrypt(GLO_GET_RESPONSE, &title, &plaintext).unwrap();
        let decrypted = receiver.decrypt(None, &apdu[2..]).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_round_trip_authentication_only() {
        let mut sender = test_cipher(Security::Authentication);
        let mut receiver = test_cipher(Security::Authentication);
        let plaintext = vec![0xC0, 0x01, 0xC1];
        let title = *sender.system_title();
        let apdu = sender.encrypt(0xC8, &title, &plaintext).unwrap();
        let decrypted = receiver.decrypt(None, &apdu[2..]).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_tampered_body_fails_authentication() {
        let mut sender = test_cipher(Security::AuthenticationEncryption);
        let mut receiver = test_cipher(Security::AuthenticationEncryption);
        let title = *sender.system_title();
        let mut apdu = sender.encrypt(GLO_GET_RESPONSE, &title, &[1, 2, 3, 4]).unwrap();
        let last = apdu.len() - 1;
        apdu[last] ^= 0x01;
        assert!(matches!(
            receiver.decrypt(None, &apdu[2..]),
            Err(CosemError::Security(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let mut sender = test_cipher(Security::AuthenticationEncryption);
        let title = *sender.system_title();
        let apdu = sender.encrypt(GLO_GET_RESPONSE, &title, &[9, 9, 9]).unwrap();
        let mut receiver =
            GcmCipher::new(Security::AuthenticationEncryption, title, [0x33; 16], [0x22; 16])
                .with_peer_system_title(title);
        assert!(receiver.decrypt(None, &apdu[2..]).is_err());
    }

    #[test]
    fn test_unknown_source_title_is_an_error() {
        let title = SystemTitle::new([1, 2, 3, 4, 5, 6, 7, 8]);
        let mut receiver =
            GcmCipher::new(Security::AuthenticationEncryption, title, [0x11; 16], [0x22; 16]);
        assert!(matches!(
            receiver.decrypt(None, &[0x30, 0, 0, 0, 1, 0xAA]),
            Err(CosemError::Security(_))
        ));
    }
}
