//! Chain address derivation from a secp256k1 public key.
//!
//! A single account key maps to three canonical address forms, in
//! stable order:
//!
//! 1. `F1` — Filecoin secp256k1 address: blake2b-160 over the
//!    compressed 33-byte public key, protocol 1.
//! 2. `F4` — Filecoin delegated address under the EVM namespace
//!    (actor id 10); the payload is the 20-byte Ethereum address.
//! 3. `0x` — the Ethereum address itself, EIP-55 checksummed hex.
//!
//! Filecoin string encoding: network prefix (`f`/`t`), protocol digit,
//! then RFC-4648 lowercase base32 (no padding) of `payload || checksum`
//! where the checksum is a 4-byte blake2b over the protocol-prefixed
//! payload bytes.
//!
//! `F3` (BLS) is reserved in the address-kind enum but has no
//! derivation here.

use std::sync::OnceLock;

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use data_encoding::Encoding;
use filvault_types::{Address, AddressKind, FilvaultError, Network, Result};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Filecoin address protocol for secp256k1 keys.
const PROTOCOL_SECP256K1: u8 = 1;

/// Filecoin address protocol for delegated (namespaced) addresses.
const PROTOCOL_DELEGATED: u8 = 4;

/// Actor id of the Ethereum address manager namespace.
const EVM_NAMESPACE: u64 = 10;

/// blake2b digest length for address payloads.
const PAYLOAD_HASH_LEN: usize = 20;

/// blake2b digest length for address checksums.
const CHECKSUM_LEN: usize = 4;

/// Lowercase RFC-4648 base32 without padding, as used by Filecoin
/// address strings.
fn base32() -> &'static Encoding {
    static ENCODING: OnceLock<Encoding> = OnceLock::new();
    ENCODING.get_or_init(|| {
        let mut spec = data_encoding::Specification::new();
        spec.symbols.push_str("abcdefghijklmnopqrstuvwxyz234567");
        spec.encoding().expect("static base32 alphabet is valid")
    })
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derives the full address set for a public key.
///
/// The result is always exactly `[F1, F4, 0x]`, in that order.
pub fn derive_addresses(public_key: &PublicKey, network: Network) -> Result<Vec<Address>> {
    let compressed = public_key.to_encoded_point(true);
    let f1 = secp256k1_address(compressed.as_bytes(), network)?;

    let eth = eth_address(public_key);
    let f4 = delegated_address(EVM_NAMESPACE, &eth, network)?;
    let zerox = eth_checksum_hex(&eth);

    Ok(vec![
        Address::new(AddressKind::F1, f1),
        Address::new(AddressKind::F4, f4),
        Address::new(AddressKind::ZeroX, zerox),
    ])
}

/// Filecoin secp256k1 address (`f1…`) from the compressed public key.
fn secp256k1_address(pubkey: &[u8], network: Network) -> Result<String> {
    let payload = blake2b_var(PAYLOAD_HASH_LEN, &[pubkey])?;

    let checksum = blake2b_var(CHECKSUM_LEN, &[&[PROTOCOL_SECP256K1], payload.as_slice()])?;

    let mut body = payload;
    body.extend_from_slice(&checksum);

    Ok(format!(
        "{}{}{}",
        network.prefix(),
        PROTOCOL_SECP256K1,
        base32().encode(&body)
    ))
}

/// Filecoin delegated address (`f4<namespace>f…`) for a sub-address
/// payload under the given actor namespace.
fn delegated_address(namespace: u64, subaddress: &[u8], network: Network) -> Result<String> {
    let mut ns_buf = Vec::with_capacity(10);
    put_uvarint(&mut ns_buf, namespace);

    let checksum = blake2b_var(
        CHECKSUM_LEN,
        &[&[PROTOCOL_DELEGATED], ns_buf.as_slice(), subaddress],
    )?;

    let mut body = subaddress.to_vec();
    body.extend_from_slice(&checksum);

    Ok(format!(
        "{}{}{}f{}",
        network.prefix(),
        PROTOCOL_DELEGATED,
        namespace,
        base32().encode(&body)
    ))
}

/// The 20-byte Ethereum address: keccak-256 over the uncompressed
/// public key (without the 0x04 tag), last 20 bytes.
pub fn eth_address(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.to_encoded_point(false);
    let digest = Keccak256::digest(&uncompressed.as_bytes()[1..]);

    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    out
}

/// EIP-55 checksummed `0x` hex form of a 20-byte address.
pub fn eth_checksum_hex(addr: &[u8; 20]) -> String {
    let lower = hex::encode(addr);
    let digest = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (digest[i / 2] >> (4 * (1 - i % 2))) & 0x0F;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Variable-length blake2b over the concatenation of `parts`.
fn blake2b_var(len: usize, parts: &[&[u8]]) -> Result<Vec<u8>> {
    let mut hasher = Blake2bVar::new(len).map_err(|e| FilvaultError::Crypto {
        reason: format!("invalid blake2b output size: {e}"),
    })?;
    for part in parts {
        hasher.update(part);
    }

    let mut out = vec![0u8; len];
    hasher
        .finalize_variable(&mut out)
        .map_err(|e| FilvaultError::Crypto {
            reason: format!("blake2b finalize failed: {e}"),
        })?;
    Ok(out)
}

/// Minimal unsigned LEB128, matching the namespace encoding inside
/// delegated address bytes.
fn put_uvarint(buf: &mut Vec<u8>, mut x: u64) {
    while x >= 0x80 {
        buf.push((x as u8) | 0x80);
        x >>= 7;
    }
    buf.push(x as u8);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use k256::SecretKey;

    /// Private key with scalar value 1: its public key is the curve
    /// generator, whose Ethereum address is a well-known constant.
    fn key_one() -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SecretKey::from_slice(&bytes).expect("scalar one is a valid key")
    }

    /// Decodes an `f1…` string and re-verifies its embedded checksum.
    fn verify_f1(addr: &str) {
        assert!(addr.starts_with("f1") || addr.starts_with("t1"));
        let body = base32().decode(addr[2..].as_bytes()).expect("valid base32");
        assert_eq!(body.len(), PAYLOAD_HASH_LEN + CHECKSUM_LEN);

        let (payload, checksum) = body.split_at(PAYLOAD_HASH_LEN);
        let expected =
            blake2b_var(CHECKSUM_LEN, &[&[PROTOCOL_SECP256K1], payload]).unwrap();
        assert_eq!(checksum, expected.as_slice());
    }

    #[test]
    fn eth_address_of_generator_key() {
        let addr = eth_address(&key_one().public_key());
        assert_eq!(
            hex::encode(addr),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn eip55_reference_vectors() {
        // Test vectors from the EIP-55 specification.
        for expected in [
            "0x52908400098527886E0F7030069857D2E4169EE7",
            "0x8617E340B3D01FA5F11F306F4090FD50E238070D",
            "0xde709f2102306220921060314715629080e2fb77",
            "0x27b1fdb04752bbc536007a920d24acb045561c26",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let raw: [u8; 20] = hex::decode(expected[2..].to_lowercase())
                .unwrap()
                .try_into()
                .unwrap();
            assert_eq!(eth_checksum_hex(&raw), expected);
        }
    }

    #[test]
    fn derive_returns_three_stable_kinds() -> Result<()> {
        let addrs = derive_addresses(&key_one().public_key(), Network::Mainnet)?;
        assert_eq!(addrs.len(), 3);
        assert_eq!(addrs[0].kind, AddressKind::F1);
        assert_eq!(addrs[1].kind, AddressKind::F4);
        assert_eq!(addrs[2].kind, AddressKind::ZeroX);
        Ok(())
    }

    #[test]
    fn derivation_is_deterministic() -> Result<()> {
        let pk = key_one().public_key();
        let a = derive_addresses(&pk, Network::Mainnet)?;
        let b = derive_addresses(&pk, Network::Mainnet)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn f1_checksum_verifies() -> Result<()> {
        let addrs = derive_addresses(&key_one().public_key(), Network::Mainnet)?;
        verify_f1(&addrs[0].value);
        Ok(())
    }

    #[test]
    fn f4_embeds_eth_address() -> Result<()> {
        let pk = key_one().public_key();
        let addrs = derive_addresses(&pk, Network::Mainnet)?;

        let f4 = &addrs[1].value;
        assert!(f4.starts_with("f410f"));

        let body = base32().decode(f4["f410f".len()..].as_bytes()).unwrap();
        assert_eq!(body.len(), 20 + CHECKSUM_LEN);
        assert_eq!(&body[..20], eth_address(&pk));
        Ok(())
    }

    #[test]
    fn zerox_matches_eth_address() -> Result<()> {
        let pk = key_one().public_key();
        let addrs = derive_addresses(&pk, Network::Mainnet)?;
        assert_eq!(addrs[2].value, eth_checksum_hex(&eth_address(&pk)));
        Ok(())
    }

    #[test]
    fn calibration_uses_t_prefix() -> Result<()> {
        let addrs = derive_addresses(&key_one().public_key(), Network::Calibration)?;
        assert!(addrs[0].value.starts_with("t1"));
        assert!(addrs[1].value.starts_with("t410f"));
        Ok(())
    }

    #[test]
    fn network_only_changes_prefix() -> Result<()> {
        let pk = key_one().public_key();
        let main = derive_addresses(&pk, Network::Mainnet)?;
        let calib = derive_addresses(&pk, Network::Calibration)?;
        assert_eq!(&main[0].value[1..], &calib[0].value[1..]);
        assert_eq!(main[2].value, calib[2].value);
        Ok(())
    }

    #[test]
    fn uvarint_small_and_multibyte() {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, 10);
        assert_eq!(buf, [0x0a]);

        buf.clear();
        put_uvarint(&mut buf, 300);
        assert_eq!(buf, [0xac, 0x02]);
    }
}
