//! Legacy transaction RLP codec
//!
//! A legacy transaction is an RLP list of nine fields: `nonce, gas_price,
//! gas_limit, to, value, data` followed by `chain_id, 0, 0` when it is being
//! signed (EIP-155) or `v, r, s` once signed. Pre-EIP-155 signing payloads
//! stop after the sixth field. Integers are minimal big-endian strings and
//! decoding rejects anything that does not re-encode to the same bytes.

use alloy_primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header, EMPTY_STRING_CODE};

use crate::errors::RlpError;

/// Number of fields of a signed (or EIP-155 signing) legacy transaction
pub const SIGNED_FIELD_COUNT: usize = 9;

/// Number of fields of a pre-EIP-155 signing payload
pub const UNPROTECTED_FIELD_COUNT: usize = 6;

/// The unsigned part of a legacy transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Sender nonce
    pub nonce: u64,
    /// Price per unit of gas
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient, or contract creation
    pub to: TxKind,
    /// Value transferred
    pub value: U256,
    /// Call data or init code
    pub input: Bytes,
    /// Chain id for replay protection; `None` for pre-EIP-155 transactions
    pub chain_id: Option<u64>,
}

/// Raw `(v, r, s)` signature values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// Recovery value, `27 + y` or `chain_id * 2 + 35 + y`
    pub v: u64,
    /// Signature `r`
    pub r: U256,
    /// Signature `s`
    pub s: U256,
}

/// A legacy transaction together with its signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedLegacyTransaction {
    /// The signed transaction; `chain_id` is derived from `signature.v`
    pub tx: LegacyTransaction,
    /// The signature
    pub signature: TxSignature,
}

impl LegacyTransaction {
    /// Returns the signing payload
    ///
    /// Nine fields ending in `chain_id, 0, 0` when a chain id is set, the
    /// six base fields otherwise.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        let create = Bytes::new();
        let to = kind_field(&self.to, &create);
        let base: [&dyn Encodable; 6] =
            [&self.nonce, &self.gas_price, &self.gas_limit, to, &self.value, &self.input];
        match self.chain_id {
            Some(chain_id) => {
                let zero = 0u8;
                let mut fields = base.to_vec();
                fields.extend_from_slice(&[&chain_id as &dyn Encodable, &zero, &zero]);
                encode_list(&fields)
            }
            None => encode_list(&base),
        }
    }

    /// Returns the hash a signer signs: `keccak256(encode_unsigned())`
    pub fn signature_hash(&self) -> B256 { keccak256(self.encode_unsigned()) }
}

impl SignedLegacyTransaction {
    /// Returns the network encoding of the transaction
    pub fn encode_signed(&self) -> Vec<u8> {
        let create = Bytes::new();
        let tx = &self.tx;
        let signature = &self.signature;
        encode_list(&[
            &tx.nonce,
            &tx.gas_price,
            &tx.gas_limit,
            kind_field(&tx.to, &create),
            &tx.value,
            &tx.input,
            &signature.v,
            &signature.r,
            &signature.s,
        ])
    }

    /// Returns the transaction hash: `keccak256(encode_signed())`
    pub fn hash(&self) -> B256 { keccak256(self.encode_signed()) }
}

/// Encodes the signing payload of `tx`
pub fn encode_unsigned(tx: &LegacyTransaction) -> Vec<u8> { tx.encode_unsigned() }

/// Encodes a signed transaction
pub fn encode_signed(tx: &SignedLegacyTransaction) -> Vec<u8> { tx.encode_signed() }

/// Decodes a signed legacy transaction
///
/// # Arguments
/// * `bytes` - Exactly one RLP list of nine fields
///
/// # Returns
/// The transaction with its chain id recovered from `v`, or an error for
/// non-canonical input, a wrong field count, trailing bytes or an invalid `v`
pub fn decode(bytes: &[u8]) -> Result<SignedLegacyTransaction, RlpError> {
    let mut fields = list_payload(bytes, &[SIGNED_FIELD_COUNT])?;
    let buf = &mut fields;

    let mut tx = decode_base(buf)?;
    let signature =
        TxSignature { v: u64::decode(buf)?, r: U256::decode(buf)?, s: U256::decode(buf)? };
    tx.chain_id = chain_id_from_v(signature.v)?;

    Ok(SignedLegacyTransaction { tx, signature })
}

/// Decodes a signing payload
///
/// Accepts the six-field pre-EIP-155 form and the nine-field form ending
/// in `chain_id, 0, 0`.
pub fn decode_unsigned(bytes: &[u8]) -> Result<LegacyTransaction, RlpError> {
    let mut fields = list_payload(bytes, &[UNPROTECTED_FIELD_COUNT, SIGNED_FIELD_COUNT])?;
    let buf = &mut fields;

    let mut tx = decode_base(buf)?;
    if !buf.is_empty() {
        tx.chain_id = Some(u64::decode(buf)?);
        if u8::decode(buf)? != 0 || u8::decode(buf)? != 0 {
            return Err(RlpError::MalformedEncoding(alloy_rlp::Error::Custom(
                "EIP-155 signing payload must end in two zero fields",
            )));
        }
    }
    Ok(tx)
}

/// Recovers the chain id encoded in a signature's `v`
///
/// `27`/`28` carry no chain id; `v >= 35` encodes `(v - 35) / 2`.
pub fn chain_id_from_v(v: u64) -> Result<Option<u64>, RlpError> {
    match v {
        27 | 28 => Ok(None),
        35.. => Ok(Some((v - 35) / 2)),
        _ => Err(RlpError::InvalidV(v)),
    }
}

fn kind_field<'a>(to: &'a TxKind, create: &'a Bytes) -> &'a dyn Encodable {
    match to {
        TxKind::Call(address) => address,
        TxKind::Create => create,
    }
}

fn encode_list(fields: &[&dyn Encodable]) -> Vec<u8> {
    let payload_length = fields.iter().map(|field| field.length()).sum();
    let header = Header { list: true, payload_length };
    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

/// Strips the list header, checking trailing bytes and the field count
fn list_payload<'a>(bytes: &'a [u8], field_counts: &[usize]) -> Result<&'a [u8], RlpError> {
    let mut buf = bytes;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString.into());
    }
    let payload = buf.get(..header.payload_length).ok_or(alloy_rlp::Error::InputTooShort)?;
    let trailing = buf.len() - header.payload_length;
    if trailing != 0 {
        return Err(RlpError::TrailingBytes(trailing));
    }

    let found = count_items(payload)?;
    if !field_counts.contains(&found) {
        let expected = field_counts.last().copied().unwrap_or(SIGNED_FIELD_COUNT);
        return Err(RlpError::FieldCount { expected, found });
    }
    Ok(payload)
}

fn count_items(mut payload: &[u8]) -> Result<usize, RlpError> {
    let mut count = 0;
    while !payload.is_empty() {
        let header = Header::decode(&mut payload)?;
        payload = payload.get(header.payload_length..).ok_or(alloy_rlp::Error::InputTooShort)?;
        count += 1;
    }
    Ok(count)
}

fn decode_base(buf: &mut &[u8]) -> Result<LegacyTransaction, RlpError> {
    Ok(LegacyTransaction {
        nonce: u64::decode(buf)?,
        gas_price: u128::decode(buf)?,
        gas_limit: u64::decode(buf)?,
        to: decode_kind(buf)?,
        value: U256::decode(buf)?,
        input: Bytes::decode(buf)?,
        chain_id: None,
    })
}

fn decode_kind(buf: &mut &[u8]) -> Result<TxKind, RlpError> {
    if buf.first() == Some(&EMPTY_STRING_CODE) {
        *buf = &buf[1..];
        return Ok(TxKind::Create);
    }
    Ok(TxKind::Call(Address::decode(buf)?))
}
