use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, Profile, User, UsernameTaken};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Fails with [`UsernameTaken`] on a duplicate username.
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;

    async fn update_profile(&self, id: Uuid, profile: &Profile) -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str = "id, username, password_hash, email, first_name, last_name, \
     age, weight, height, gender, fitness_goal, activity_level, medical_conditions, \
     dietary_restrictions, date_of_birth, date_joined, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let p = &new.profile;
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, password_hash, email, first_name, last_name,
                age, weight, height, gender, fitness_goal, activity_level,
                medical_conditions, dietary_restrictions, date_of_birth)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(&p.email)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(p.age)
        .bind(p.weight)
        .bind(p.height)
        .bind(&p.gender)
        .bind(&p.fitness_goal)
        .bind(&p.activity_level)
        .bind(&p.medical_conditions)
        .bind(&p.dietary_restrictions)
        .bind(p.date_of_birth)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UsernameTaken.into()),
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn update_profile(&self, id: Uuid, p: &Profile) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET email = $2, first_name = $3, last_name = $4, age = $5,
                weight = $6, height = $7, gender = $8, fitness_goal = $9,
                activity_level = $10, medical_conditions = $11,
                dietary_restrictions = $12, date_of_birth = $13, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&p.email)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(p.age)
        .bind(p.weight)
        .bind(p.height)
        .bind(&p.gender)
        .bind(&p.fitness_goal)
        .bind(&p.activity_level)
        .bind(&p.medical_conditions)
        .bind(&p.dietary_restrictions)
        .bind(p.date_of_birth)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("update profile {id}"))?;
        Ok(user)
    }
}
