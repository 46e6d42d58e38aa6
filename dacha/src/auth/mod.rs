//! Authentication.
//!
//! Users register or authenticate with email and password and receive a signed session token
//! (JWT). Requests that change a user's own data carry it as `Authorization: Bearer <token>`.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: session token creation and verification
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor and
//!   ownership checks
//!
//! ```ignore
//! async fn update_ad(
//!     State(state): State<AppState>,
//!     current_user: CurrentUser,
//!     Path(id): Path<AdId>,
//! ) -> Result<Json<AdResponse>> {
//!     let owner = Ads::new(&mut conn).get_owner(id).await?;
//!     current_user.ensure_owner(owner, Operation::Update, Resource::Ad)?;
//!     // ...
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
