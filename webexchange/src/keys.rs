// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Private-key loading.
//!
//! Accepts the three DER layouts origin keys commonly ship in, tried in
//! order: PKCS#1 (RSA), PKCS#8 (RSA or EC), SEC1 (EC). PKCS#8 and SEC1
//! carry algorithm/curve identifiers, so unsupported algorithms and curves
//! are reported as such instead of falling through as parse failures.

use pkcs8::ObjectIdentifier;
use rsa::pkcs1::DecodeRsaPrivateKey as _;
use rsa::pkcs8::DecodePrivateKey as _;
use sec1::der::Decode as _;

use crate::{PrivateKey, SignedExchangeError};

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_CURVE_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_CURVE_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Parse a private key from DER, trying PKCS#1, PKCS#8 and SEC1 in order.
pub fn parse_private_key(der: &[u8]) -> Result<PrivateKey, SignedExchangeError> {
    if let Ok(key) = rsa::RsaPrivateKey::from_pkcs1_der(der) {
        return Ok(PrivateKey::Rsa(key));
    }

    if let Ok(info) = pkcs8::PrivateKeyInfo::try_from(der) {
        return parse_pkcs8(der, &info);
    }

    if let Ok(ec) = sec1::EcPrivateKey::from_der(der) {
        return parse_sec1(der, ec.parameters.and_then(|p| p.named_curve()));
    }

    Err(SignedExchangeError::UnsupportedKey)
}

/// Parse a PEM-armored private key: the first block's contents are decoded
/// regardless of label, matching the permissive behavior of PEM loaders in
/// the original tools.
pub fn parse_private_key_pem(text: &[u8]) -> Result<PrivateKey, SignedExchangeError> {
    let pem = x509_parser::pem::Pem::iter_from_buffer(text)
        .next()
        .ok_or(SignedExchangeError::UnsupportedKey)?
        .map_err(|e| SignedExchangeError::Pem(e.to_string()))?;
    parse_private_key(&pem.contents)
}

fn parse_pkcs8(
    der: &[u8],
    info: &pkcs8::PrivateKeyInfo<'_>,
) -> Result<PrivateKey, SignedExchangeError> {
    let alg = info.algorithm.oid;
    if alg == OID_RSA_ENCRYPTION {
        let key = rsa::RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|_| SignedExchangeError::UnsupportedKey)?;
        Ok(PrivateKey::Rsa(key))
    } else if alg == OID_EC_PUBLIC_KEY {
        let curve = info
            .algorithm
            .parameters_oid()
            .map_err(|_| SignedExchangeError::UnsupportedKey)?;
        if curve == OID_CURVE_P256 {
            p256::ecdsa::SigningKey::from_pkcs8_der(der)
                .map(PrivateKey::EcdsaP256)
                .map_err(|_| SignedExchangeError::UnsupportedKey)
        } else if curve == OID_CURVE_P384 {
            p384::ecdsa::SigningKey::from_pkcs8_der(der)
                .map(PrivateKey::EcdsaP384)
                .map_err(|_| SignedExchangeError::UnsupportedKey)
        } else {
            Err(SignedExchangeError::UnknownCurve {
                oid: curve.to_string(),
            })
        }
    } else {
        Err(SignedExchangeError::UnsupportedKey)
    }
}

fn parse_sec1(
    der: &[u8],
    named_curve: Option<ObjectIdentifier>,
) -> Result<PrivateKey, SignedExchangeError> {
    let curve = match named_curve {
        Some(oid) => oid,
        // SEC1 without curve parameters cannot be dispatched.
        None => return Err(SignedExchangeError::UnsupportedKey),
    };

    if curve == OID_CURVE_P256 {
        let secret = p256::SecretKey::from_sec1_der(der)
            .map_err(|_| SignedExchangeError::UnsupportedKey)?;
        Ok(PrivateKey::EcdsaP256(p256::ecdsa::SigningKey::from(&secret)))
    } else if curve == OID_CURVE_P384 {
        let secret = p384::SecretKey::from_sec1_der(der)
            .map_err(|_| SignedExchangeError::UnsupportedKey)?;
        Ok(PrivateKey::EcdsaP384(p384::ecdsa::SigningKey::from(&secret)))
    } else {
        Err(SignedExchangeError::UnknownCurve {
            oid: curve.to_string(),
        })
    }
}
