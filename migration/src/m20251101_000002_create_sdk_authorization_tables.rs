use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS identity_platform.project_users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                project_id UUID NOT NULL,
                email VARCHAR(255) NOT NULL,
                name VARCHAR(255),
                password VARCHAR(255),
                provider identity_platform.provider NOT NULL DEFAULT 'local',
                provider_account_id VARCHAR(255),
                avatar_url TEXT,
                email_verified BOOLEAN NOT NULL DEFAULT false,
                last_login_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT fk_project_users_project
                    FOREIGN KEY (project_id)
                    REFERENCES identity_platform.projects(id)
                    ON DELETE CASCADE
            )",
        )
        .await?;

        // One account per email inside a project
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS project_users_project_email_unique
            ON identity_platform.project_users(project_id, email)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS project_users_provider_account_unique
            ON identity_platform.project_users(project_id, provider, provider_account_id)
            WHERE provider_account_id IS NOT NULL",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS identity_platform.authorization_requests (
                id UUID PRIMARY KEY,
                project_id UUID NOT NULL,
                redirect_uri TEXT NOT NULL,
                provider identity_platform.provider NOT NULL,
                code_challenge VARCHAR(128) NOT NULL,
                code_challenge_method VARCHAR(16) NOT NULL DEFAULT 'S256',
                state TEXT,
                provider_code_verifier VARCHAR(128),
                project_user_id UUID,
                code_hash CHAR(64),
                code_expires_at TIMESTAMPTZ,
                status identity_platform.authorization_status NOT NULL DEFAULT 'pending',
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT fk_authorization_requests_project
                    FOREIGN KEY (project_id)
                    REFERENCES identity_platform.projects(id)
                    ON DELETE CASCADE,
                CONSTRAINT fk_authorization_requests_project_user
                    FOREIGN KEY (project_user_id)
                    REFERENCES identity_platform.project_users(id)
                    ON DELETE CASCADE
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS authorization_requests_code_hash_unique
            ON identity_platform.authorization_requests(code_hash)
            WHERE code_hash IS NOT NULL",
        )
        .await?;

        // Supports the periodic purge of expired requests
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS authorization_requests_expires_at_idx
            ON identity_platform.authorization_requests(expires_at)",
        )
        .await?;

        // authorization_request_id survives the purge of its request as NULL so a
        // token family outlives the short lived authorization request
        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS identity_platform.refresh_tokens (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                project_id UUID NOT NULL,
                project_user_id UUID NOT NULL,
                authorization_request_id UUID,
                family_id UUID NOT NULL,
                token_hash CHAR(64) NOT NULL UNIQUE,
                expires_at TIMESTAMPTZ NOT NULL,
                revoked_at TIMESTAMPTZ,
                replaced_by UUID,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT fk_refresh_tokens_project
                    FOREIGN KEY (project_id)
                    REFERENCES identity_platform.projects(id)
                    ON DELETE CASCADE,
                CONSTRAINT fk_refresh_tokens_project_user
                    FOREIGN KEY (project_user_id)
                    REFERENCES identity_platform.project_users(id)
                    ON DELETE CASCADE,
                CONSTRAINT fk_refresh_tokens_authorization_request
                    FOREIGN KEY (authorization_request_id)
                    REFERENCES identity_platform.authorization_requests(id)
                    ON DELETE SET NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS refresh_tokens_family_id_idx
            ON identity_platform.refresh_tokens(family_id)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS refresh_tokens_authorization_request_id_idx
            ON identity_platform.refresh_tokens(authorization_request_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for table in ["refresh_tokens", "authorization_requests", "project_users"] {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS identity_platform.{table}"))
                .await?;
        }

        Ok(())
    }
}
