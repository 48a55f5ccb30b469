//! PostgreSQL implementation of the wallet store.
//!
//! Server-database variant for deployments where the backend does not
//! own its disk. Same schema semantics as the SQLite store; selected
//! via the `postgres` cargo feature and the `database.driver` config
//! key.

use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use filvault_types::{FilvaultError, Result};
use filvault_wallet::Wallet;

use crate::models::{AddressRow, NewAddressRow, NewWalletRow, WalletRow};
use crate::schema::{addresses, wallets};
use crate::{SaveWalletParams, WalletStore};

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id SERIAL PRIMARY KEY,
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    name TEXT NOT NULL UNIQUE,
    encrypted_key_json BYTEA NOT NULL,
    encrypted_seed BYTEA NOT NULL,
    salt BYTEA NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS addresses (
    id SERIAL PRIMARY KEY,
    wallet_id INTEGER NOT NULL REFERENCES wallets(id) ON DELETE CASCADE,
    kind INTEGER NOT NULL,
    value TEXT NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_addresses_wallet_id ON addresses(wallet_id);
"#;

type PgPool = Pool<ConnectionManager<PgConnection>>;
type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

/// Server-database store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database at `url` and ensures the schema exists.
    pub fn open(url: &str) -> Result<Self> {
        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| FilvaultError::storage("open", e))?;

        let store = Self { pool };
        let mut conn = store.conn("open")?;
        conn.batch_execute(MIGRATIONS)
            .map_err(|e| FilvaultError::storage("open", e))?;

        tracing::debug!("postgres store ready");
        Ok(store)
    }

    fn conn(&self, op: &'static str) -> Result<PgPooled> {
        self.pool.get().map_err(|e| FilvaultError::storage(op, e))
    }
}

impl WalletStore for PgStore {
    fn count_wallets(&self) -> Result<i64> {
        let mut conn = self.conn("count_wallets")?;
        wallets::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| FilvaultError::storage("count_wallets", e))
    }

    fn get_wallets(&self) -> Result<Vec<Wallet>> {
        let mut conn = self.conn("get_wallets")?;

        let rows: Vec<WalletRow> = wallets::table
            .order(wallets::id.asc())
            .load(&mut conn)
            .map_err(|e| FilvaultError::storage("get_wallets", e))?;

        let address_rows: Vec<AddressRow> = AddressRow::belonging_to(&rows)
            .order(addresses::id.asc())
            .load(&mut conn)
            .map_err(|e| FilvaultError::storage("get_wallets", e))?;

        let grouped = address_rows.grouped_by(&rows);
        Ok(rows
            .into_iter()
            .zip(grouped)
            .map(|(row, addrs)| row.into_wallet(addrs))
            .collect())
    }

    fn find_wallet(&self, wallet_id: i32) -> Result<Wallet> {
        let mut conn = self.conn("find_wallet")?;

        let row: Option<WalletRow> = wallets::table
            .find(wallet_id)
            .first(&mut conn)
            .optional()
            .map_err(|e| FilvaultError::storage("find_wallet", e))?;

        let row = row.ok_or(FilvaultError::NotFound)?;

        let address_rows: Vec<AddressRow> = AddressRow::belonging_to(&row)
            .order(addresses::id.asc())
            .load(&mut conn)
            .map_err(|e| FilvaultError::storage("find_wallet", e))?;

        Ok(row.into_wallet(address_rows))
    }

    fn save_wallet(&self, params: SaveWalletParams) -> Result<Wallet> {
        let mut conn = self.conn("save_wallet")?;
        let now = Utc::now().naive_utc();

        let result = conn.transaction::<WalletRow, DieselError, _>(|conn| {
            let existing: i64 = wallets::table.count().get_result(conn)?;

            let new_row = NewWalletRow {
                is_default: existing == 0,
                name: &params.name,
                encrypted_key_json: &params.key_json,
                encrypted_seed: &params.encrypted_seed,
                salt: &params.salt,
                created_at: now,
                updated_at: now,
            };
            let row: WalletRow = diesel::insert_into(wallets::table)
                .values(&new_row)
                .get_result(conn)?;

            let new_addresses: Vec<NewAddressRow<'_>> = params
                .addresses
                .iter()
                .map(|a| NewAddressRow {
                    wallet_id: row.id,
                    kind: a.kind.as_i32(),
                    value: &a.value,
                })
                .collect();
            diesel::insert_into(addresses::table)
                .values(&new_addresses)
                .execute(conn)?;

            Ok(row)
        });

        let row = match result {
            Ok(row) => row,
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(FilvaultError::WalletExists)
            }
            Err(e) => return Err(FilvaultError::storage("save_wallet", e)),
        };

        let address_rows: Vec<AddressRow> = AddressRow::belonging_to(&row)
            .order(addresses::id.asc())
            .load(&mut conn)
            .map_err(|e| FilvaultError::storage("save_wallet", e))?;

        Ok(row.into_wallet(address_rows))
    }

    fn delete_wallet(&self, wallet_id: i32) -> Result<()> {
        let mut conn = self.conn("delete_wallet")?;

        let affected = conn
            .transaction::<usize, DieselError, _>(|conn| {
                diesel::delete(addresses::table.filter(addresses::wallet_id.eq(wallet_id)))
                    .execute(conn)?;
                diesel::delete(wallets::table.find(wallet_id)).execute(conn)
            })
            .map_err(|e| FilvaultError::storage("delete_wallet", e))?;

        if affected == 0 {
            return Err(FilvaultError::NotFound);
        }
        Ok(())
    }
}
