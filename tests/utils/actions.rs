#![allow(dead_code)] // Not every workflow uses every action

use axum::response::Response;
use uuid::Uuid;

use super::setup::TestClient;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestClient {
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.post(
            "/register/",
            &[
                ("username", username),
                ("password1", password),
                ("password2", password),
            ],
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post("/login/", &[("username", username), ("password", password)])
            .await
    }

    pub async fn logout(&self) -> Response {
        self.post("/logout/", &[]).await
    }

    pub async fn create_room(&self, topic: &str, name: &str, description: &str) -> Response {
        self.post(
            "/create-room/",
            &[("topic", topic), ("name", name), ("description", description)],
        )
        .await
    }

    pub async fn update_room(
        &self,
        room_id: Uuid,
        topic: &str,
        name: &str,
        description: &str,
    ) -> Response {
        self.post(
            &format!("/update-room/{}/", room_id),
            &[("topic", topic), ("name", name), ("description", description)],
        )
        .await
    }

    pub async fn delete_room(&self, room_id: Uuid) -> Response {
        self.post(&format!("/delete-room/{}/", room_id), &[]).await
    }

    pub async fn post_message(&self, room_id: Uuid, body: &str) -> Response {
        self.post(&format!("/room/{}", room_id), &[("body", body)])
            .await
    }

    pub async fn delete_message(&self, message_id: Uuid) -> Response {
        self.post(&format!("/delete-message/{}/", message_id), &[])
            .await
    }

    pub async fn search(&self, query: &str) -> Response {
        let query = serde_urlencoded::to_string([("q", query)]).unwrap();
        self.get(&format!("/?{}", query)).await
    }
}
