#[cfg(test)]
pub mod test_utils {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Once;

    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use tracing::log::LevelFilter;

    use crate::auth::User;
    use crate::db::{NewUser, create_user, get_user};
    use crate::env::{AppConfig, load_test_environment};
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::local_store::LocalStore;
    use crate::models::{Level, Location};

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
    }

    pub struct TestUser {
        pub username: String,
        pub is_admin: bool,
        pub is_evaluator: bool,
        pub password: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn trainee(self, username: &str) -> Self {
            self.user_with_password(username, false, false, STANDARD_PASSWORD)
        }

        pub fn evaluator(self, username: &str) -> Self {
            self.user_with_password(username, false, true, STANDARD_PASSWORD)
        }

        pub fn admin(self, username: &str) -> Self {
            self.user_with_password(username, true, true, STANDARD_PASSWORD)
        }

        pub fn user_with_password(
            mut self,
            username: &str,
            is_admin: bool,
            is_evaluator: bool,
            password: &str,
        ) -> Self {
            self.users.push(TestUser {
                username: username.to_string(),
                is_admin,
                is_evaluator,
                password: password.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = load_test_environment();
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            let pool = SqlitePool::connect("sqlite::memory:").await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, String> = HashMap::new();

            for user in &self.users {
                let created = create_user(
                    &pool,
                    &new_user(&user.username, user.is_admin, user.is_evaluator),
                    &user.password,
                )
                .await?;
                user_id_map.insert(user.username.clone(), created.id);
            }

            Ok(TestDb { pool, user_id_map })
        }
    }

    pub fn new_user(username: &str, is_admin: bool, is_evaluator: bool) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: username.to_string(),
            email: format!("{}@example.com", username),
            level: Level::Rookie,
            location: Location::Philadelphia,
            city: None,
            state: None,
            education_level: None,
            conferences_worked: None,
            is_admin,
            is_evaluator,
            profile_photo: None,
            created_at: None,
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, String>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<String> {
            self.user_id_map.get(username).cloned()
        }

        pub async fn user(&self, username: &str) -> User {
            let id = self.user_id(username).expect("user is registered");
            get_user(&self.pool, &id).await.expect("user exists")
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .trainee("trainee_user")
            .trainee("second_trainee")
            .evaluator("evaluator_user")
            .admin("admin_user")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            local_store_path: PathBuf::from("data/test_local_store.json"),
            master_admin_password: None,
            session_hours: 12,
        }
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        setup_test_client_with_store(test_db, LocalStore::in_memory()).await
    }

    pub async fn setup_test_client_with_store(
        test_db: TestDb,
        store: LocalStore,
    ) -> (Client, TestDb) {
        let rocket = init_rocket(test_db.pool.clone(), store, test_config());
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }

    pub async fn login_test_user(
        client: &Client,
        username: &str,
        password: &str,
    ) -> Vec<Cookie<'static>> {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": username,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        response
            .cookies()
            .iter()
            .map(|cookie| cookie.clone().into_owned())
            .collect()
    }
}
