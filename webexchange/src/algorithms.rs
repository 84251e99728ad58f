// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signing algorithm dispatch.
//!
//! The draft restricts signing to RSA-PSS over 2048-bit keys (SHA-256) and
//! ECDSA over P-256 (SHA-256) or P-384 (SHA-384), with ECDSA signatures
//! serialized as an ASN.1 DER `SEQUENCE` of the two INTEGERs. Everything
//! else is rejected at dispatch time.

use rand_core::CryptoRngCore;
use rsa::pss;
use rsa::traits::PublicKeyParts;
use sha2::Sha256;
use signature::{RandomizedSigner as _, SignatureEncoding as _};

use crate::SignedExchangeError;

/// A private key accepted by the signer.
#[derive(Debug)]
pub enum PrivateKey {
    Rsa(rsa::RsaPrivateKey),
    EcdsaP256(p256::ecdsa::SigningKey),
    EcdsaP384(p384::ecdsa::SigningKey),
}

/// A concrete signing algorithm selected for a [`PrivateKey`].
#[derive(Debug)]
pub enum SigningAlgorithm {
    /// RSASSA-PSS with SHA-256, salt length equal to the hash length.
    RsaPssSha256(pss::SigningKey<Sha256>),
    /// ECDSA over P-256 with SHA-256, DER-encoded output.
    EcdsaP256Sha256(p256::ecdsa::SigningKey),
    /// ECDSA over P-384 with SHA-384, DER-encoded output.
    EcdsaP384Sha384(p384::ecdsa::SigningKey),
}

/// Select the signing algorithm for a private key.
///
/// RSA keys must be exactly 2048 bits; the ECDSA curves are fixed by the
/// key type. Signing draws salt (RSA-PSS) or nonce material (ECDSA) from
/// the RNG supplied to [`SigningAlgorithm::sign`].
pub fn signing_algorithm_for_private_key(
    key: &PrivateKey,
) -> Result<SigningAlgorithm, SignedExchangeError> {
    match key {
        PrivateKey::Rsa(k) => {
            let bits = k.size() * 8;
            if bits != 2048 {
                return Err(SignedExchangeError::UnsupportedKeySize { bits });
            }
            Ok(SigningAlgorithm::RsaPssSha256(pss::SigningKey::new(k.clone())))
        }
        PrivateKey::EcdsaP256(k) => Ok(SigningAlgorithm::EcdsaP256Sha256(k.clone())),
        PrivateKey::EcdsaP384(k) => Ok(SigningAlgorithm::EcdsaP384Sha384(k.clone())),
    }
}

impl SigningAlgorithm {
    /// Sign `message`, drawing randomness from `rng`.
    pub fn sign(
        &self,
        rng: &mut impl CryptoRngCore,
        message: &[u8],
    ) -> Result<Vec<u8>, SignedExchangeError> {
        match self {
            SigningAlgorithm::RsaPssSha256(key) => {
                let sig = key.try_sign_with_rng(rng, message)?;
                Ok(sig.to_vec())
            }
            SigningAlgorithm::EcdsaP256Sha256(key) => {
                let sig: p256::ecdsa::Signature = key.try_sign_with_rng(rng, message)?;
                Ok(sig.to_der().as_bytes().to_vec())
            }
            SigningAlgorithm::EcdsaP384Sha384(key) => {
                let sig: p384::ecdsa::Signature = key.try_sign_with_rng(rng, message)?;
                Ok(sig.to_der().as_bytes().to_vec())
            }
        }
    }
}
