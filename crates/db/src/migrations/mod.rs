//! Database migrations.
//!
//! Schema migrations for the voting store.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_voter_table;
mod m20250101_000002_create_vote_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_voter_table::Migration),
            Box::new(m20250101_000002_create_vote_table::Migration),
        ]
    }
}
