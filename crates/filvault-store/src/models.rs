//! Row types bridging the relational schema and the wallet record.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use filvault_types::{Address, AddressKind};
use filvault_wallet::Wallet;

use crate::schema::{addresses, wallets};

/// A `wallets` row as loaded from the database.
#[derive(Debug, Queryable, Identifiable)]
#[diesel(table_name = wallets)]
pub struct WalletRow {
    pub id: i32,
    pub is_default: bool,
    pub name: String,
    pub encrypted_key_json: Vec<u8>,
    pub encrypted_seed: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl WalletRow {
    /// Joins the row with its loaded addresses into a wallet record.
    pub fn into_wallet(self, address_rows: Vec<AddressRow>) -> Wallet {
        Wallet {
            id: self.id,
            is_default: self.is_default,
            name: self.name,
            addresses: address_rows.into_iter().map(AddressRow::into_address).collect(),
            salt: self.salt,
            encrypted_key_json: self.encrypted_key_json,
            encrypted_seed: self.encrypted_seed,
            created_at: self.created_at.and_utc(),
            updated_at: self.updated_at.and_utc(),
        }
    }
}

/// Insertable form of a new `wallets` row.
#[derive(Insertable)]
#[diesel(table_name = wallets)]
pub struct NewWalletRow<'a> {
    pub is_default: bool,
    pub name: &'a str,
    pub encrypted_key_json: &'a [u8],
    pub encrypted_seed: &'a [u8],
    pub salt: &'a [u8],
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An `addresses` row with its wallet back-reference.
#[derive(Debug, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(WalletRow, foreign_key = wallet_id))]
#[diesel(table_name = addresses)]
pub struct AddressRow {
    pub id: i32,
    pub wallet_id: i32,
    pub kind: i32,
    pub value: String,
}

impl AddressRow {
    fn into_address(self) -> Address {
        Address {
            kind: AddressKind::from_i32(self.kind),
            value: self.value,
        }
    }
}

/// Insertable form of a new `addresses` row.
#[derive(Insertable)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow<'a> {
    pub wallet_id: i32,
    pub kind: i32,
    pub value: &'a str,
}
