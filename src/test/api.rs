#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::{Value, json};

    use crate::local_store::{Actor, LocalStore};
    use crate::test::test_utils::{
        STANDARD_PASSWORD, TestDbBuilder, create_standard_test_db, login_test_user,
        setup_test_client, setup_test_client_with_store,
    };

    async fn json_body(response: LocalResponse<'_>) -> Value {
        let body = response.into_string().await.unwrap();
        serde_json::from_str(&body).unwrap()
    }

    async fn post_json<'c>(client: &'c Client, uri: &str, body: Value) -> LocalResponse<'c> {
        client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
    }

    async fn put_json<'c>(client: &'c Client, uri: &str, body: Value) -> LocalResponse<'c> {
        client
            .put(uri.to_string())
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
    }

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = post_json(
            &client,
            "/api/login",
            json!({ "username": "evaluator_user", "password": STANDARD_PASSWORD }),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);

        let login = json_body(response).await;
        assert_eq!(login["success"], true);
        assert_eq!(login["user"]["username"], "evaluator_user");
        assert_eq!(login["user"]["role"], "evaluator");
        assert!(login["user"].get("password").is_none());

        let response = post_json(
            &client,
            "/api/login",
            json!({ "username": "evaluator_user@example.com", "password": STANDARD_PASSWORD }),
        )
        .await;
        assert_eq!(json_body(response).await["success"], true);

        let response = post_json(
            &client,
            "/api/login",
            json!({ "username": "evaluator_user", "password": "wrong_password" }),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);

        let login = json_body(response).await;
        assert_eq!(login["success"], false);
        assert!(login["error"].is_string());
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let endpoints = vec![
            "/api/me",
            "/api/drills",
            "/api/users",
            "/api/leaderboard",
            "/api/sessions/active",
            "/api/evaluations",
        ];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );
        }

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_api_session_security() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();

        let response = client
            .get("/api/me")
            .private_cookie(forged_cookie)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let cookies = login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;

        let response = client.get("/api/me").cookies(cookies).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_me_api_lists_permissions() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;
        let me = json_body(client.get("/api/me").dispatch().await).await;

        assert_eq!(me["username"], "admin_user");
        assert_eq!(me["role"], "admin");
        let permissions = me["permissions"].as_array().unwrap();
        assert!(permissions.contains(&json!("manage_data")));

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let me = json_body(client.get("/api/me").dispatch().await).await;

        assert_eq!(me["role"], "trainee");
        let permissions = me["permissions"].as_array().unwrap();
        assert!(permissions.contains(&json!("record_own_drills")));
        assert!(!permissions.contains(&json!("view_all_users")));
    }

    #[rocket::async_test]
    async fn test_signup_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = post_json(
            &client,
            "/api/signup",
            json!({
                "username": "new_ump",
                "first_name": "New",
                "last_name": "Umpire",
                "email": "New.Ump@Example.com",
                "password": "secret99",
                "level": "AAA",
                "location": "Seattle"
            }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);

        let signup = json_body(response).await;
        assert_eq!(signup["user"]["email"], "new.ump@example.com");
        assert_eq!(signup["user"]["level"], "AAA");
        assert_eq!(signup["user"]["is_admin"], false);

        let me = client.get("/api/me").dispatch().await;
        assert_eq!(me.status(), Status::Ok);

        let response = post_json(
            &client,
            "/api/signup",
            json!({
                "username": "new_ump",
                "first_name": "Again",
                "last_name": "Umpire",
                "email": "other@example.com",
                "password": "secret99"
            }),
        )
        .await;
        assert_eq!(response.status(), Status::Conflict);

        let response = post_json(
            &client,
            "/api/signup",
            json!({
                "username": "x",
                "first_name": "Bad",
                "last_name": "Input",
                "email": "not-an-email",
                "password": "123"
            }),
        )
        .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let errors = json_body(response).await;
        assert!(errors["errors"]["username"].is_array());
        assert!(errors["errors"]["email"].is_array());
        assert!(errors["errors"]["password"].is_array());
    }

    #[rocket::async_test]
    async fn test_login_with_signup_email_as_typed() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = post_json(
            &client,
            "/api/signup",
            json!({
                "username": "casey",
                "first_name": "Casey",
                "last_name": "Blue",
                "email": "Casey@Example.com",
                "password": "secret99"
            }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);

        client.post("/api/logout").dispatch().await;

        let response = post_json(
            &client,
            "/api/login",
            json!({ "username": "Casey@Example.com", "password": "secret99" }),
        )
        .await;
        let login = json_body(response).await;
        assert_eq!(login["success"], true);
        assert_eq!(login["user"]["username"], "casey");
    }

    #[rocket::async_test]
    async fn test_profile_and_password_change() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;

        let response = put_json(
            &client,
            "/api/profile",
            json!({ "city": "Philadelphia", "state": "PA", "education_level": "NCAA D2" }),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);

        let profile = json_body(response).await;
        assert_eq!(profile["city"], "Philadelphia");
        assert_eq!(profile["education_level"], "NCAA D2");

        let response = post_json(
            &client,
            "/api/change-password",
            json!({ "current_password": "wrong", "new_password": "newsecret" }),
        )
        .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let response = post_json(
            &client,
            "/api/change-password",
            json!({ "current_password": STANDARD_PASSWORD, "new_password": "newsecret" }),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);

        login_test_user(&client, "trainee_user", "newsecret").await;
    }

    #[rocket::async_test]
    async fn test_trainee_drill_flow() {
        let test_db = create_standard_test_db().await;
        let trainee_id = test_db.user_id("trainee_user").unwrap();
        let (client, _test_db) = setup_test_client(test_db).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;

        let drills = json_body(client.get("/api/drills").dispatch().await).await;
        assert_eq!(drills.as_array().unwrap().len(), 11);

        let response = post_json(
            &client,
            "/api/sessions",
            json!({ "drill_type": "check_swing" }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);
        let session = json_body(response).await;
        let session_id = session["id"].as_str().unwrap().to_string();

        for outcome in ["confirmed", "confirmed", "overturned"] {
            let response = post_json(
                &client,
                &format!("/api/sessions/{}/results", session_id),
                json!({ "result": outcome }),
            )
            .await;
            assert_eq!(response.status(), Status::Ok);
        }

        let active = json_body(client.get("/api/sessions/active").dispatch().await).await;
        assert_eq!(active["results"].as_array().unwrap().len(), 3);

        let response = post_json(
            &client,
            &format!("/api/sessions/{}/end", session_id),
            json!({ "notes": "Tracking the bat better" }),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);
        let ended = json_body(response).await;
        assert_eq!(ended["results"].as_array().unwrap().len(), 3);
        assert!(
            ended["note"]["content"]
                .as_str()
                .unwrap()
                .starts_with("Training Session: Check Swing")
        );

        let active = json_body(client.get("/api/sessions/active").dispatch().await).await;
        assert!(active.is_null());

        let stats = json_body(
            client
                .get(format!("/api/users/{}/stats?drill_type=check_swing", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(stats["overall"]["total"], 3);
        assert_eq!(stats["overall"]["confirmed"], 2);
        assert_eq!(stats["overall"]["last20"]["total"], 3);
        assert_eq!(stats["drills"].as_array().unwrap().len(), 1);

        let results = json_body(
            client
                .get(format!("/api/users/{}/results", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(results.as_array().unwrap().len(), 3);

        let sessions = json_body(
            client
                .get(format!("/api/users/{}/sessions", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(sessions.as_array().unwrap().len(), 1);

        let response = client
            .get(format!("/api/users/{}/stats?drill_type=juggling", trainee_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn test_cancel_active_session() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;

        let cancelled = json_body(client.delete("/api/sessions/active").dispatch().await).await;
        assert_eq!(cancelled["cancelled"], false);

        post_json(&client, "/api/sessions", json!({ "drill_type": "fair_foul" })).await;

        let cancelled = json_body(client.delete("/api/sessions/active").dispatch().await).await;
        assert_eq!(cancelled["cancelled"], true);
    }

    #[rocket::async_test]
    async fn test_recording_for_others_requires_evaluator() {
        let test_db = create_standard_test_db().await;
        let trainee_id = test_db.user_id("trainee_user").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "second_trainee", STANDARD_PASSWORD).await;
        let response = post_json(
            &client,
            "/api/sessions",
            json!({ "drill_type": "steal_2b", "user_id": trainee_id }),
        )
        .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .get(format!("/api/users/{}/results", trainee_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "evaluator_user", STANDARD_PASSWORD).await;
        let response = post_json(
            &client,
            "/api/sessions",
            json!({ "drill_type": "steal_2b", "user_id": trainee_id }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);

        let session = json_body(response).await;
        assert_eq!(session["user_id"], trainee_id.as_str());
        assert_eq!(session["is_evaluator_recorded"], true);
        assert_eq!(session["evaluator_username"], "evaluator_user");

        let active = json_body(
            client
                .get(format!("/api/sessions/active?user_id={}", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(active["id"], session["id"]);
    }

    #[rocket::async_test]
    async fn test_leaderboards() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        for (username, outcomes) in [
            ("trainee_user", vec!["confirmed", "overturned"]),
            ("second_trainee", vec!["confirmed", "confirmed"]),
        ] {
            login_test_user(&client, username, STANDARD_PASSWORD).await;
            let session =
                json_body(post_json(&client, "/api/sessions", json!({ "drill_type": "play_at_plate" })).await)
                    .await;
            let id = session["id"].as_str().unwrap().to_string();
            for outcome in outcomes {
                post_json(
                    &client,
                    &format!("/api/sessions/{}/results", id),
                    json!({ "result": outcome }),
                )
                .await;
            }
            post_json(&client, &format!("/api/sessions/{}/end", id), json!({})).await;
        }

        let board = json_body(client.get("/api/leaderboard").dispatch().await).await;
        let names: Vec<&str> = board
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["second_trainee", "trainee_user"]);

        let drill_board =
            json_body(client.get("/api/leaderboard/play_at_plate").dispatch().await).await;
        assert_eq!(drill_board.as_array().unwrap().len(), 2);

        let empty_board =
            json_body(client.get("/api/leaderboard/fair_foul/last20").dispatch().await).await;
        assert!(empty_board.as_array().unwrap().is_empty());

        let response = client.get("/api/leaderboard/not_a_drill").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let mine = json_body(client.get("/api/leaderboard/me").dispatch().await).await;
        assert_eq!(mine["overall"]["rank"], 2);
        assert_eq!(mine["overall"]["stats"]["confirmed_percentage"], 50.0);
        assert_eq!(mine["drills"].as_array().unwrap().len(), 11);
    }

    #[rocket::async_test]
    async fn test_notes_ownership() {
        let test_db = create_standard_test_db().await;
        let trainee_id = test_db.user_id("trainee_user").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let response = post_json(
            &client,
            "/api/notes",
            json!({ "content": "Hold the call longer", "video_url": "https://video.example.com/1" }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);
        let note = json_body(response).await;
        let note_uri = format!("/api/notes/{}", note["id"].as_str().unwrap());

        let response = post_json(&client, "/api/notes", json!({ "content": "" })).await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        login_test_user(&client, "second_trainee", STANDARD_PASSWORD).await;
        let response = put_json(&client, &note_uri, json!({ "content": "Hijacked" })).await;
        assert_eq!(response.status(), Status::Forbidden);
        let response = client.delete(note_uri.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let updated = json_body(put_json(&client, &note_uri, json!({ "content": "Revised" })).await).await;
        assert_eq!(updated["content"], "Revised");
        assert!(updated["video_url"].is_null());

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;
        let response = client.delete(note_uri).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);

        let notes = json_body(
            client
                .get(format!("/api/users/{}/notes", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert!(notes.as_array().unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_evaluations_api() {
        let test_db = create_standard_test_db().await;
        let trainee_id = test_db.user_id("trainee_user").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        let evaluation = json!({
            "target_user_id": trainee_id,
            "play_type": "Pickoff",
            "notes": "Good position"
        });

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let response = post_json(&client, "/api/evaluations", evaluation.clone()).await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "evaluator_user", STANDARD_PASSWORD).await;
        let response = post_json(&client, "/api/evaluations", evaluation).await;
        assert_eq!(response.status(), Status::Created);
        let created = json_body(response).await;
        assert_eq!(created["target_username"], "trainee_user");
        assert_eq!(created["evaluator_username"], "evaluator_user");
        let evaluation_uri = format!("/api/evaluations/{}", created["id"].as_str().unwrap());

        let updated = json_body(
            put_json(
                &client,
                &evaluation_uri,
                json!({ "play_type": "Pickoff", "notes": "Great position" }),
            )
            .await,
        )
        .await;
        assert_eq!(updated["notes"], "Great position");

        let all = json_body(client.get("/api/evaluations").dispatch().await).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let mine = json_body(
            client
                .get(format!("/api/users/{}/evaluations", trainee_id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let response = client.get("/api/evaluations").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;
        let response = client.delete(evaluation_uri).dispatch().await;
        assert_eq!(response.status(), Status::NoContent);
    }

    #[rocket::async_test]
    async fn test_admin_user_management() {
        let test_db = create_standard_test_db().await;
        let trainee_id = test_db.user_id("trainee_user").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "evaluator_user", STANDARD_PASSWORD).await;
        let users = json_body(client.get("/api/users").dispatch().await).await;
        assert_eq!(users.as_array().unwrap().len(), 4);

        let response = post_json(
            &client,
            "/api/admin/users",
            json!({
                "username": "made_by_evaluator",
                "first_name": "No",
                "last_name": "Way",
                "email": "nope@example.com",
                "password": "secret99"
            }),
        )
        .await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;
        let response = post_json(
            &client,
            "/api/admin/users",
            json!({
                "username": "new_evaluator",
                "first_name": "New",
                "last_name": "Evaluator",
                "email": "new.evaluator@example.com",
                "password": "secret99",
                "is_evaluator": true
            }),
        )
        .await;
        assert_eq!(response.status(), Status::Created);
        let created = json_body(response).await;
        assert_eq!(created["is_evaluator"], true);
        assert_eq!(created["is_admin"], false);

        let promoted = json_body(
            put_json(
                &client,
                &format!("/api/admin/users/{}", trainee_id),
                json!({ "is_evaluator": true, "password": "resetpass" }),
            )
            .await,
        )
        .await;
        assert_eq!(promoted["is_evaluator"], true);

        let response = client
            .delete(format!("/api/admin/users/{}", trainee_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let users = json_body(client.get("/api/users").dispatch().await).await;
        assert_eq!(users.as_array().unwrap().len(), 4);
    }

    #[rocket::async_test]
    async fn test_master_admin_cannot_be_demoted_or_deleted() {
        let test_db = TestDbBuilder::new()
            .admin("admin_user")
            .build()
            .await
            .unwrap();
        let master = crate::db::ensure_master_admin(&test_db.pool, "master-pass")
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;

        let updated = json_body(
            put_json(
                &client,
                &format!("/api/admin/users/{}", master.id),
                json!({ "is_admin": false, "city": "Boston" }),
            )
            .await,
        )
        .await;
        assert_eq!(updated["is_admin"], true);
        assert_eq!(updated["city"], "Boston");

        let response = put_json(
            &client,
            &format!("/api/admin/users/{}", master.id),
            json!({ "username": "renamed_master" }),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .delete(format!("/api/admin/users/{}", master.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_admin_session_result_edit() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        let session =
            json_body(post_json(&client, "/api/sessions", json!({ "drill_type": "steal_3b" })).await)
                .await;
        let id = session["id"].as_str().unwrap().to_string();
        post_json(
            &client,
            &format!("/api/sessions/{}/results", id),
            json!({ "result": "overturned" }),
        )
        .await;
        post_json(&client, &format!("/api/sessions/{}/end", id), json!({})).await;

        let edit_uri = format!("/api/admin/sessions/{}/results/0", id);
        let response = put_json(&client, &edit_uri, json!({ "result": "confirmed" })).await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;
        let response = put_json(&client, &edit_uri, json!({ "result": "confirmed" })).await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(json_body(response).await["results"], json!(["confirmed"]));
    }

    #[rocket::async_test]
    async fn test_admin_data_tools() {
        let test_db = create_standard_test_db().await;
        let store = LocalStore::in_memory();
        store
            .lock()
            .unwrap()
            .import_data(
                &json!({
                    "users": [{
                        "id": "legacy-1",
                        "username": "legacy_ump",
                        "firstName": "Legacy",
                        "lastName": "Ump",
                        "email": "legacy@example.com",
                        "password": "legacy123",
                        "createdAt": "2024-01-01T00:00:00Z"
                    }],
                    "drillResults": [{
                        "id": "legacy-result",
                        "userId": "legacy-1",
                        "drillType": "fair_foul",
                        "result": "confirmed",
                        "timestamp": "2024-01-02T00:00:00Z"
                    }, {
                        "id": "orphan-result",
                        "userId": "gone",
                        "drillType": "fair_foul",
                        "result": "stands",
                        "timestamp": "2024-01-02T00:00:00Z"
                    }]
                })
                .to_string(),
                Actor::Verified,
            )
            .unwrap();
        let (client, _) = setup_test_client_with_store(test_db, store).await;

        login_test_user(&client, "trainee_user", STANDARD_PASSWORD).await;
        for uri in ["/api/admin/export", "/api/admin/local/export", "/api/admin/local/integrity"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{} should be admin only", uri);
        }
        let response = client.post("/api/admin/migrate").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        login_test_user(&client, "admin_user", STANDARD_PASSWORD).await;

        let integrity =
            json_body(client.get("/api/admin/local/integrity").dispatch().await).await;
        assert_eq!(integrity["is_valid"], false);

        let orphans = json_body(client.get("/api/admin/local/orphans").dispatch().await).await;
        assert_eq!(orphans["orphaned_results"].as_array().unwrap().len(), 1);

        let cleanup = json_body(client.post("/api/admin/local/cleanup").dispatch().await).await;
        assert_eq!(cleanup["orphaned_count"], 1);

        let report = json_body(client.post("/api/admin/migrate").dispatch().await).await;
        assert_eq!(report["users_created"], 1);
        assert_eq!(report["drill_results_migrated"], 1);

        let export = json_body(client.get("/api/admin/export").dispatch().await).await;
        assert_eq!(export["users"].as_array().unwrap().len(), 5);
        assert_eq!(export["drill_results"].as_array().unwrap().len(), 1);

        let local_export =
            json_body(client.get("/api/admin/local/export").dispatch().await).await;
        assert_eq!(local_export["users"][0]["username"], "legacy_ump");

        let response = client
            .post("/api/admin/local/import")
            .body("not json")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/api/admin/local/import")
            .body(json!({ "notes": [] }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }
}
