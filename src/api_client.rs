use crate::backend::{ReservationSink, ScheduleSource};
use crate::session::{SessionPersistence, SessionStore};
use crate::types::{
    AuthSession, BusinessCategory, BusinessDetail, BusinessHours, BusinessSummary,
    CancelReservationPayload, CreateReservationPayload, Reservation, SignInPayload,
    SignInResponse, SignUpPayload, UpdateBusinessHoursPayload, UpsertBusinessPayload, User,
    VerifyCodePayload, VerifyCodeResponse,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BusinessFilters {
    pub category_id: Option<Uuid>,
    pub owner: bool,
}

/// HTTP client for the reservation API. Attaches the session's bearer
/// token to every request and drops the session on any 401, mirroring the
/// response-interceptor behavior the UI relied on.
#[derive(Clone)]
pub struct ApiClient<P: SessionPersistence> {
    http: Client,
    base_url: String,
    session: SessionStore<P>,
}

impl<P: SessionPersistence> ApiClient<P> {
    pub fn new(base_url: &str, session: SessionStore<P>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore<P> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, String> {
        let response = builder.send().await.map_err(|err| {
            error!(?err, "Request failed");
            format!("Request failed: {err}")
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
        }
        if !status.is_success() {
            return Err(extract_error_message(status, response).await);
        }

        response.json::<T>().await.map_err(|err| {
            error!(?err, "Failed to decode response body");
            format!("Failed to decode response body: {err}")
        })
    }

    // --- auth ---

    /// Signs in and persists the returned session.
    pub async fn signin(&self, payload: &SignInPayload) -> Result<AuthSession, String> {
        let session: AuthSession = self
            .send(self.request(Method::POST, "/signin").json(payload))
            .await?;
        self.session
            .set_session(session.token.clone(), session.user.clone())?;
        Ok(session)
    }

    /// First step of the two-step flow: the server mails a code and
    /// returns the pending user's identity.
    pub async fn signin_with_code(
        &self,
        payload: &SignInPayload,
    ) -> Result<SignInResponse, String> {
        self.send(self.request(Method::POST, "/signin").json(payload))
            .await
    }

    pub async fn signup(&self, payload: &SignUpPayload) -> Result<User, String> {
        self.send(self.request(Method::POST, "/signup").json(payload))
            .await
    }

    /// Second step: exchanges the mailed code for a token and persists
    /// the session.
    pub async fn verify_code(
        &self,
        payload: &VerifyCodePayload,
    ) -> Result<VerifyCodeResponse, String> {
        let response: VerifyCodeResponse = self
            .send(self.request(Method::POST, "/verify-code").json(payload))
            .await?;
        self.session
            .set_session(response.token.clone(), response.user.clone())?;
        Ok(response)
    }

    // --- businesses ---

    pub async fn businesses(
        &self,
        filters: BusinessFilters,
    ) -> Result<Vec<BusinessSummary>, String> {
        let mut builder = self.request(Method::GET, "/businesses");
        if let Some(category_id) = filters.category_id {
            builder = builder.query(&[("categoryId", category_id.to_string())]);
        }
        if filters.owner {
            builder = builder.query(&[("owner", "true")]);
        }
        self.send(builder).await
    }

    pub async fn business_by_id(&self, business_id: Uuid) -> Result<BusinessDetail, String> {
        self.send(self.request(Method::GET, &format!("/businesses/{business_id}")))
            .await
    }

    pub async fn create_business(
        &self,
        payload: &UpsertBusinessPayload,
    ) -> Result<BusinessSummary, String> {
        self.send(self.request(Method::POST, "/businesses").json(payload))
            .await
    }

    pub async fn update_business(
        &self,
        business_id: Uuid,
        payload: &UpsertBusinessPayload,
    ) -> Result<BusinessSummary, String> {
        self.send(
            self.request(Method::PUT, &format!("/businesses/{business_id}"))
                .json(payload),
        )
        .await
    }

    pub async fn delete_business(&self, business_id: Uuid) -> Result<BusinessSummary, String> {
        self.send(self.request(Method::DELETE, &format!("/businesses/{business_id}")))
            .await
    }

    pub async fn update_business_hours(
        &self,
        business_hour_id: Uuid,
        payload: &UpdateBusinessHoursPayload,
    ) -> Result<BusinessHours, String> {
        self.send(
            self.request(Method::PUT, &format!("/business-hours/{business_hour_id}"))
                .json(payload),
        )
        .await
    }

    pub async fn business_categories(&self) -> Result<Vec<BusinessCategory>, String> {
        self.send(self.request(Method::GET, "/business-categories"))
            .await
    }

    // --- reservations ---

    pub async fn reservations(&self) -> Result<Vec<Reservation>, String> {
        self.send(self.request(Method::GET, "/reservations")).await
    }

    pub async fn confirm_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<MessageResponse, String> {
        self.send(self.request(Method::PUT, &format!("/reservations/{reservation_id}/confirm")))
            .await
    }

    pub async fn complete_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<MessageResponse, String> {
        self.send(self.request(Method::PUT, &format!("/reservations/{reservation_id}/complete")))
            .await
    }

    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        payload: &CancelReservationPayload,
    ) -> Result<MessageResponse, String> {
        self.send(
            self.request(
                Method::DELETE,
                &format!("/reservations/{reservation_id}/cancel"),
            )
            .json(payload),
        )
        .await
    }

    // --- favorites ---

    pub async fn liked_businesses(&self) -> Result<Vec<BusinessSummary>, String> {
        self.send(self.request(Method::GET, "/like/business")).await
    }

    pub async fn like_business(&self, business_id: Uuid) -> Result<MessageResponse, String> {
        self.send(self.request(Method::POST, &format!("/like/business/{business_id}")))
            .await
    }

    pub async fn dislike_business(&self, business_id: Uuid) -> Result<MessageResponse, String> {
        self.send(self.request(Method::DELETE, &format!("/dislike/business/{business_id}")))
            .await
    }
}

impl<P: SessionPersistence> ScheduleSource for ApiClient<P> {
    async fn business_hours(&self, business_id: Uuid) -> Result<Vec<BusinessHours>, String> {
        self.send(self.request(Method::GET, &format!("/businesses/{business_id}/hours")))
            .await
    }
}

impl<P: SessionPersistence> ReservationSink for ApiClient<P> {
    async fn create_reservation(
        &self,
        payload: CreateReservationPayload,
    ) -> Result<Reservation, String> {
        self.send(self.request(Method::POST, "/reservations").json(&payload))
            .await
    }
}

async fn extract_error_message(status: StatusCode, response: Response) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(ErrorBody {
        message: Some(message),
    }) = response.json::<ErrorBody>().await
    {
        return message;
    }
    format!("Request failed with status {status}")
}
