pub mod key_vault;
