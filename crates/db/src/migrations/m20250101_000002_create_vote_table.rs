//! Create vote table migration.

use election_common::CNP_LENGTH;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::VoterCnp).string_len(CNP_LENGTH as u32).not_null())
                    .col(ColumnDef::new(Vote::CandidateId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_voter")
                            .from(Vote::Table, Vote::VoterCnp)
                            .to(Voter::Table, Voter::Cnp)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: voter_cnp (one vote per voter)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_voter_cnp")
                    .table(Vote::Table)
                    .col(Vote::VoterCnp)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: candidate_id (for the tally group-by)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_candidate_id")
                    .table(Vote::Table)
                    .col(Vote::CandidateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vote {
    Table,
    Id,
    VoterCnp,
    CandidateId,
    CreatedAt,
}

#[derive(Iden)]
enum Voter {
    Table,
    Cnp,
}
