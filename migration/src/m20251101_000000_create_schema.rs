use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("CREATE SCHEMA IF NOT EXISTS identity_platform;")
            .await?;
        db.execute_unprepared("SET search_path TO identity_platform, public;")
            .await?;

        // gen_random_uuid() is built in from Postgres 13 on; older servers need pgcrypto
        db.execute_unprepared("CREATE EXTENSION IF NOT EXISTS pgcrypto;")
            .await?;

        db.execute_unprepared(
            "DO $$ BEGIN
                CREATE TYPE identity_platform.provider AS ENUM ('local', 'google', 'github');
            EXCEPTION
                WHEN duplicate_object THEN null;
            END $$;",
        )
        .await?;

        db.execute_unprepared(
            "DO $$ BEGIN
                CREATE TYPE identity_platform.authorization_status AS ENUM ('pending', 'authorized', 'redeemed');
            EXCEPTION
                WHEN duplicate_object THEN null;
            END $$;",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CASCADE removes the enum types and every table in the schema
        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS identity_platform CASCADE;")
            .await?;

        Ok(())
    }
}
