//! Diesel table definitions for the wallet store.

diesel::table! {
    wallets (id) {
        id -> Integer,
        is_default -> Bool,
        name -> Text,
        encrypted_key_json -> Binary,
        encrypted_seed -> Binary,
        salt -> Binary,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    addresses (id) {
        id -> Integer,
        wallet_id -> Integer,
        kind -> Integer,
        value -> Text,
    }
}

diesel::joinable!(addresses -> wallets (wallet_id));

diesel::allow_tables_to_appear_in_same_query!(wallets, addresses);
